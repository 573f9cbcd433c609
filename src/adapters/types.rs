// src/adapters/types.rs
use async_trait::async_trait;

use crate::error::AdapterError;
use crate::listing::RawListing;

/// One store's search. "No results" is `Ok(vec![])`, never an error.
///
/// Implementations must tolerate being dropped mid-call: the orchestrator cancels
/// an adapter by dropping its future when the per-attempt timeout fires.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn fetch(&self, query: &str) -> Result<Vec<RawListing>, AdapterError>;
    fn name(&self) -> &str;
}
