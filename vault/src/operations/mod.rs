//! The four request kinds run through [`OperationPipeline`](crate::pipeline::OperationPipeline).

mod batch_detokenize;
mod batch_tokenize;
mod detokenize;
mod tokenize;

pub use batch_detokenize::BatchDetokenizeOperation;
pub use batch_tokenize::BatchTokenizeOperation;
pub use detokenize::DetokenizeOperation;
pub use tokenize::TokenizeOperation;

use crate::error::{VaultError, VaultResult};

/// Batch must be non-empty and at most `max` long.
fn validate_batch_size(len: usize, max: usize, what: &str) -> VaultResult<()> {
    if len == 0 {
        return Err(VaultError::validation(format!("batch must contain at least one {what}")));
    }
    if len > max {
        return Err(VaultError::validation(format!(
            "batch exceeds maximum of {max} {what}s (got {len})"
        )));
    }
    Ok(())
}
