use super::validate_batch_size;
use crate::{
    cache::CacheManager,
    config::MAX_BATCH_DETOKENIZE,
    encryption::{ApiResponse, EncryptionStrategy},
    error::VaultResult,
    models::{BatchDetokenizeItem, BatchDetokenizeRequest, BatchDetokenizeResponse},
    pipeline::{CacheCheckResult, Operation},
};
use async_trait::async_trait;

/// Resolve up to `max_batch` tokens in one call.
#[derive(Debug, Clone, Copy)]
pub struct BatchDetokenizeOperation {
    max_batch: usize,
}

impl BatchDetokenizeOperation {
    /// Create the operation with a batch limit.
    #[must_use]
    pub const fn new(max_batch: usize) -> Self {
        Self { max_batch }
    }
}

impl Default for BatchDetokenizeOperation {
    fn default() -> Self {
        Self::new(MAX_BATCH_DETOKENIZE)
    }
}

#[async_trait]
impl Operation for BatchDetokenizeOperation {
    type Request = BatchDetokenizeRequest;
    type Output = BatchDetokenizeResponse;
    type Item = BatchDetokenizeItem;
    type Remote = BatchDetokenizeResponse;

    const NAME: &'static str = "batch detokenize";

    fn validate(&self, request: &BatchDetokenizeRequest) -> VaultResult<()> {
        validate_batch_size(request.tokens.len(), self.max_batch, "token")
    }

    fn check_cache(
        &self,
        cache: &CacheManager,
        request: BatchDetokenizeRequest,
    ) -> CacheCheckResult<BatchDetokenizeRequest, BatchDetokenizeResponse, BatchDetokenizeItem> {
        let partition = cache.get_batch_values_from_cache(&request.tokens);

        if partition.uncached.is_empty() {
            let result = BatchDetokenizeResponse::from_results(partition.cached);
            CacheCheckResult::CompleteFromCache { request, result }
        } else if partition.cached.is_empty() {
            CacheCheckResult::NothingFromCache { uncached: request.clone(), request }
        } else {
            CacheCheckResult::PartialFromCache {
                request,
                cached_items: partition.cached,
                uncached: BatchDetokenizeRequest { tokens: partition.uncached },
            }
        }
    }

    async fn make_call(
        &self,
        strategy: &EncryptionStrategy,
        bearer: &str,
        request: &BatchDetokenizeRequest,
    ) -> VaultResult<ApiResponse<BatchDetokenizeResponse>> {
        strategy.batch_detokenize(bearer, request).await
    }

    fn process_response(
        &self,
        remote: &BatchDetokenizeResponse,
        mut cached_items: Vec<BatchDetokenizeItem>,
    ) -> BatchDetokenizeResponse {
        cached_items.extend(remote.results.iter().cloned());
        BatchDetokenizeResponse::from_results(cached_items)
    }

    fn update_cache(&self, cache: &CacheManager, _request: &BatchDetokenizeRequest, remote: &BatchDetokenizeResponse) {
        cache.store_batch_values_in_cache(&remote.results);
    }
}
