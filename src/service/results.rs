//! Persistence of prediction results

use std::sync::Arc;

use crate::model::{ClaimResultRecord, PredictionResult};
use crate::store::{ResultStore, StoreError};

/// Writes the stored projection of a prediction result, keyed by claim ID
#[derive(Clone)]
pub struct ResultPersister {
    store: Arc<dyn ResultStore>,
}

impl ResultPersister {
    pub fn new(store: Arc<dyn ResultStore>) -> Self {
        Self { store }
    }

    /// Upsert the record for `result.claim.claim_id`; the last write wins
    pub async fn save(&self, result: &PredictionResult) -> Result<(), StoreError> {
        let record = ClaimResultRecord::from(result);

        match self.store.put(&record).await {
            Ok(()) => {
                tracing::info!(claim_id = %record.claim_id, "Successfully saved claim result");
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    claim_id = %record.claim_id,
                    error = %e,
                    "Error saving claim result"
                );
                Err(e)
            }
        }
    }

    pub async fn get(&self, claim_id: &str) -> Result<Option<ClaimResultRecord>, StoreError> {
        self.store.get(claim_id).await
    }
}
