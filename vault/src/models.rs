//! Wire types exchanged with the vault service.

use serde::{Deserialize, Serialize};

/// Single tokenize request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizeRequest {
    /// Raw value to tokenize
    pub value: String,
}

/// Single tokenize response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenizeResponse {
    /// Token issued for the value
    pub token: String,
    /// The value had already been tokenized
    #[serde(default)]
    pub exists: bool,
    /// The token was created by this call
    #[serde(default)]
    pub newly_created: bool,
    /// Data type tag
    #[serde(default)]
    pub data_type: Option<String>,
}

/// Single detokenize request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetokenizeRequest {
    /// Token to resolve
    pub token: String,
}

/// Single detokenize response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetokenizeResponse {
    /// Original value, absent when the token is unknown
    #[serde(default)]
    pub value: Option<String>,
    /// The token is known to the vault
    #[serde(default)]
    pub exists: bool,
    /// Data type tag
    #[serde(default)]
    pub data_type: Option<String>,
}

/// Batch tokenize request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchTokenizeRequest {
    /// Raw values to tokenize
    pub values: Vec<String>,
}

/// Per-item outcome of a batch tokenize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchTokenizeItem {
    /// Value from the request
    pub original_value: String,
    /// Token issued for the value, absent on item failure
    #[serde(default)]
    pub token: Option<String>,
    /// The value had already been tokenized
    #[serde(default)]
    pub exists: bool,
    /// The token was created by this call
    #[serde(default)]
    pub newly_created: bool,
    /// Data type tag
    #[serde(default)]
    pub data_type: Option<String>,
}

/// Summary counters of a batch tokenize.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchTokenizeSummary {
    /// Number of items in `results`
    pub processed_count: usize,
    /// Items whose value already had a token
    pub existing_count: usize,
    /// Items whose token was created by the call
    pub newly_created_count: usize,
}

/// Batch tokenize response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchTokenizeResponse {
    /// Per-item results
    pub results: Vec<BatchTokenizeItem>,
    /// Aggregate counters
    #[serde(default)]
    pub summary: BatchTokenizeSummary,
}

impl BatchTokenizeResponse {
    /// Build a response whose summary is derived from `results`.
    #[must_use]
    pub fn from_results(results: Vec<BatchTokenizeItem>) -> Self {
        let existing_count = results.iter().filter(|r| r.exists).count();
        let summary = BatchTokenizeSummary {
            processed_count: results.len(),
            existing_count,
            newly_created_count: results.len() - existing_count,
        };
        Self { results, summary }
    }
}

/// Batch detokenize request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchDetokenizeRequest {
    /// Tokens to resolve
    pub tokens: Vec<String>,
}

/// Per-item outcome of a batch detokenize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDetokenizeItem {
    /// Token from the request
    pub token: String,
    /// Original value, absent when not found
    #[serde(default)]
    pub value: Option<String>,
    /// The token is known to the vault
    #[serde(default)]
    pub exists: bool,
    /// Data type tag
    #[serde(default)]
    pub data_type: Option<String>,
}

/// Summary counters of a batch detokenize.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDetokenizeSummary {
    /// Number of items in `results`
    pub processed_count: usize,
    /// Tokens that resolved
    pub found_count: usize,
    /// Tokens that did not resolve
    pub not_found_count: usize,
}

/// Batch detokenize response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchDetokenizeResponse {
    /// Per-item results
    pub results: Vec<BatchDetokenizeItem>,
    /// Aggregate counters
    #[serde(default)]
    pub summary: BatchDetokenizeSummary,
}

impl BatchDetokenizeResponse {
    /// Build a response whose summary is derived from `results`.
    #[must_use]
    pub fn from_results(results: Vec<BatchDetokenizeItem>) -> Self {
        let found_count = results.iter().filter(|r| r.exists).count();
        let summary = BatchDetokenizeSummary {
            processed_count: results.len(),
            found_count,
            not_found_count: results.len() - found_count,
        };
        Self { results, summary }
    }
}

/// Token endpoint response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// Bearer token
    pub access_token: String,
    /// Lifetime in seconds
    pub expires_in: i64,
    /// Refresh token lifetime in seconds
    #[serde(default)]
    pub refresh_expires_in: Option<i64>,
    /// Usually `Bearer`
    #[serde(default)]
    pub token_type: Option<String>,
    /// Granted scope
    #[serde(default)]
    pub scope: Option<String>,
}

/// Encrypted request envelope sent to the encrypted endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedEnvelope {
    /// Opaque ciphertext
    pub payload: String,
    /// Wrapped session key, when the collaborator uses one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_key: Option<String>,
    /// Initialization vector
    pub iv: String,
}

/// Encrypted response returned by the encrypted endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedResponse {
    /// Opaque ciphertext
    pub payload: String,
    /// Initialization vector
    pub iv: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_response_wire_names() {
        let json = r#"{"token":"tok_1","exists":false,"newlyCreated":true,"dataType":"string"}"#;
        let resp: TokenizeResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.token, "tok_1");
        assert!(resp.newly_created);
        assert_eq!(resp.data_type.as_deref(), Some("string"));
    }

    #[test]
    fn test_batch_summary_wire_names() {
        let json = r#"{
            "results": [{"token":"t1","value":"v1","exists":true,"dataType":"int"},
                        {"token":"t2","value":null,"exists":false}],
            "summary": {"processedCount":2,"foundCount":1,"notFoundCount":1}
        }"#;
        let resp: BatchDetokenizeResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.results.len(), 2);
        assert_eq!(resp.summary.not_found_count, 1);
        assert_eq!(resp.results[1].value, None);
    }

    #[test]
    fn test_from_results_recomputes_summary() {
        let resp = BatchTokenizeResponse::from_results(vec![
            BatchTokenizeItem {
                original_value: "a".into(),
                token: Some("ta".into()),
                exists: true,
                newly_created: false,
                data_type: None,
            },
            BatchTokenizeItem {
                original_value: "b".into(),
                token: Some("tb".into()),
                exists: false,
                newly_created: true,
                data_type: None,
            },
        ]);
        assert_eq!(resp.summary.processed_count, 2);
        assert_eq!(resp.summary.existing_count, 1);
        assert_eq!(resp.summary.newly_created_count, 1);
    }

    #[test]
    fn test_envelope_omits_missing_session_key() {
        let env = EncryptedEnvelope { payload: "p".into(), session_key: None, iv: "i".into() };
        assert_eq!(serde_json::to_string(&env).unwrap(), r#"{"payload":"p","iv":"i"}"#);
    }

    #[test]
    fn test_auth_response_parses() {
        let json = r#"{"accessToken":"abc","expiresIn":300,"refreshExpiresIn":1800,"tokenType":"Bearer","scope":"vault"}"#;
        let resp: AuthResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.access_token, "abc");
        assert_eq!(resp.expires_in, 300);
    }
}
