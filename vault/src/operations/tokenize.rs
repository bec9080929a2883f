use crate::{
    cache::CacheManager,
    encryption::{ApiResponse, EncryptionStrategy},
    error::VaultResult,
    models::{TokenizeRequest, TokenizeResponse},
    pipeline::{CacheCheckResult, Operation},
};
use async_trait::async_trait;

/// Tokenize a single value.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenizeOperation;

#[async_trait]
impl Operation for TokenizeOperation {
    type Request = TokenizeRequest;
    type Output = TokenizeResponse;
    type Item = ();
    type Remote = TokenizeResponse;

    const NAME: &'static str = "tokenize";

    fn check_cache(
        &self,
        cache: &CacheManager,
        request: TokenizeRequest,
    ) -> CacheCheckResult<TokenizeRequest, TokenizeResponse> {
        match cache.get_token_from_cache(&request.value) {
            Some(result) => CacheCheckResult::CompleteFromCache { request, result },
            None => CacheCheckResult::NothingFromCache { uncached: request.clone(), request },
        }
    }

    async fn make_call(
        &self,
        strategy: &EncryptionStrategy,
        bearer: &str,
        request: &TokenizeRequest,
    ) -> VaultResult<ApiResponse<TokenizeResponse>> {
        strategy.tokenize(bearer, request).await
    }

    fn process_response(&self, remote: &TokenizeResponse, _cached_items: Vec<()>) -> TokenizeResponse {
        remote.clone()
    }

    fn update_cache(&self, cache: &CacheManager, request: &TokenizeRequest, remote: &TokenizeResponse) {
        cache.store_token_in_cache(&request.value, remote);
    }
}
