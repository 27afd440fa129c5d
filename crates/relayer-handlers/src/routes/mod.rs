/// Module for handling signed action submissions and the pending log
mod actions;
pub use actions::*;

/// Module for handling the delegate leaderboard API
mod accounts;
pub use accounts::*;

/// Module for handling relayer metric API
mod metric;
pub use metric::*;

/// Module for handling the paginated proposals API
mod proposals;
pub use proposals::*;

fn default_page_number() -> u64 {
    1
}

fn default_page_size() -> u64 {
    10
}
