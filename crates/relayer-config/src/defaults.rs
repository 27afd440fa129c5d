//! Default values used when a config file leaves a key out.

use ethers::types::U256;
use gov_relayer_types::quantity::Quantity;

/// The HTTP server listens on `9955` by default.
pub const fn port() -> u16 {
    9955
}

/// Votes must land this many blocks before the voting window closes,
/// leaving room for the relay to get the transaction mined.
pub const fn vote_safety_margin_blocks() -> u64 {
    1900
}

/// One delegation per signer per week.
pub const fn delegation_cooldown() -> u64 {
    7 * 24 * 60 * 60
}

/// Number of ranked accounts the indexer is asked to page through.
pub const fn max_ranked_accounts() -> u64 {
    2000
}

/// 100 gwei.
pub fn max_fee_per_gas() -> Quantity {
    Quantity(U256::from(100_000_000_000u64))
}

/// 2 gwei.
pub fn max_priority_fee_per_gas() -> Quantity {
    Quantity(U256::from(2_000_000_000u64))
}

/// Default client timeout for outbound HTTP calls, in seconds.
pub const fn http_timeout() -> u64 {
    30
}

/// Name in the governor's typed-data domain.
pub fn vote_domain_name() -> String {
    String::from("dYdX Governance")
}

/// Name in the token's typed-data domain.
pub fn delegate_domain_name() -> String {
    String::from("dYdX")
}

/// Version in the token's typed-data domain.
pub fn delegate_domain_version() -> String {
    String::from("1")
}
