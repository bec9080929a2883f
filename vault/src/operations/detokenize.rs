use crate::{
    cache::CacheManager,
    encryption::{ApiResponse, EncryptionStrategy},
    error::VaultResult,
    models::{DetokenizeRequest, DetokenizeResponse},
    pipeline::{CacheCheckResult, Operation},
};
use async_trait::async_trait;

/// Resolve a single token.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetokenizeOperation;

#[async_trait]
impl Operation for DetokenizeOperation {
    type Request = DetokenizeRequest;
    type Output = DetokenizeResponse;
    type Item = ();
    type Remote = DetokenizeResponse;

    const NAME: &'static str = "detokenize";

    fn check_cache(
        &self,
        cache: &CacheManager,
        request: DetokenizeRequest,
    ) -> CacheCheckResult<DetokenizeRequest, DetokenizeResponse> {
        match cache.get_value_from_cache(&request.token) {
            Some(result) => CacheCheckResult::CompleteFromCache { request, result },
            None => CacheCheckResult::NothingFromCache { uncached: request.clone(), request },
        }
    }

    async fn make_call(
        &self,
        strategy: &EncryptionStrategy,
        bearer: &str,
        request: &DetokenizeRequest,
    ) -> VaultResult<ApiResponse<DetokenizeResponse>> {
        strategy.detokenize(bearer, request).await
    }

    fn process_response(&self, remote: &DetokenizeResponse, _cached_items: Vec<()>) -> DetokenizeResponse {
        remote.clone()
    }

    fn update_cache(&self, cache: &CacheManager, request: &DetokenizeRequest, remote: &DetokenizeResponse) {
        cache.store_value_in_cache(&request.token, remote);
    }
}
