use super::validate_batch_size;
use crate::{
    cache::CacheManager,
    config::MAX_BATCH_TOKENIZE,
    encryption::{ApiResponse, EncryptionStrategy},
    error::VaultResult,
    models::{BatchTokenizeItem, BatchTokenizeRequest, BatchTokenizeResponse},
    pipeline::{CacheCheckResult, Operation},
};
use async_trait::async_trait;

/// Tokenize up to `max_batch` values in one call.
#[derive(Debug, Clone, Copy)]
pub struct BatchTokenizeOperation {
    max_batch: usize,
}

impl BatchTokenizeOperation {
    /// Create the operation with a batch limit.
    #[must_use]
    pub const fn new(max_batch: usize) -> Self {
        Self { max_batch }
    }
}

impl Default for BatchTokenizeOperation {
    fn default() -> Self {
        Self::new(MAX_BATCH_TOKENIZE)
    }
}

#[async_trait]
impl Operation for BatchTokenizeOperation {
    type Request = BatchTokenizeRequest;
    type Output = BatchTokenizeResponse;
    type Item = BatchTokenizeItem;
    type Remote = BatchTokenizeResponse;

    const NAME: &'static str = "batch tokenize";

    fn validate(&self, request: &BatchTokenizeRequest) -> VaultResult<()> {
        validate_batch_size(request.values.len(), self.max_batch, "value")
    }

    fn check_cache(
        &self,
        cache: &CacheManager,
        request: BatchTokenizeRequest,
    ) -> CacheCheckResult<BatchTokenizeRequest, BatchTokenizeResponse, BatchTokenizeItem> {
        let partition = cache.get_batch_tokens_from_cache(&request.values);

        if partition.uncached.is_empty() {
            let result = BatchTokenizeResponse::from_results(partition.cached);
            CacheCheckResult::CompleteFromCache { request, result }
        } else if partition.cached.is_empty() {
            CacheCheckResult::NothingFromCache { uncached: request.clone(), request }
        } else {
            CacheCheckResult::PartialFromCache {
                request,
                cached_items: partition.cached,
                uncached: BatchTokenizeRequest { values: partition.uncached },
            }
        }
    }

    async fn make_call(
        &self,
        strategy: &EncryptionStrategy,
        bearer: &str,
        request: &BatchTokenizeRequest,
    ) -> VaultResult<ApiResponse<BatchTokenizeResponse>> {
        strategy.batch_tokenize(bearer, request).await
    }

    fn process_response(
        &self,
        remote: &BatchTokenizeResponse,
        mut cached_items: Vec<BatchTokenizeItem>,
    ) -> BatchTokenizeResponse {
        cached_items.extend(remote.results.iter().cloned());
        BatchTokenizeResponse::from_results(cached_items)
    }

    fn update_cache(&self, cache: &CacheManager, _request: &BatchTokenizeRequest, remote: &BatchTokenizeResponse) {
        cache.store_batch_tokens_in_cache(&remote.results);
    }
}
