use std::sync::Arc;

use gov_relayer_utils::{Error, Result};
use parking_lot::Mutex;

use crate::{PreparedTransaction, RelayReceipt, RelayService};

/// Records submissions instead of sending them.
#[derive(Debug, Clone, Default)]
pub struct MockedRelayService {
    submitted: Arc<Mutex<Vec<PreparedTransaction>>>,
    failing: bool,
}

impl MockedRelayService {
    /// A service that refuses every transaction.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    pub fn submitted(&self) -> Vec<PreparedTransaction> {
        self.submitted.lock().clone()
    }
}

#[async_trait::async_trait]
impl RelayService for MockedRelayService {
    async fn submit(&self, tx: &PreparedTransaction) -> Result<RelayReceipt> {
        if self.failing {
            return Err(Error::RelayService {
                status: 503,
                body: "relay unavailable".into(),
            });
        }
        let mut submitted = self.submitted.lock();
        submitted.push(tx.clone());
        Ok(RelayReceipt {
            transaction_id: Some(format!("mock-{}", submitted.len())),
            ..Default::default()
        })
    }
}
