//! Webhook payload parsing and sender verification.
//!
//! The upstream CMS notifies us with `{"asset": {"path": "<resource>/..."}}`.
//! The first non-empty path segment names the resource to invalidate.

use serde::Deserialize;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::domain::ResourceId;

pub const WEBHOOK_TOKEN_HEADER: &str = "x-webhook-token";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookError {
    #[error("webhook body is not a valid payload: {0}")]
    Malformed(String),
    #[error("webhook payload has no `asset.path`")]
    MissingPath,
    #[error("asset path `{path}` does not name a resource: {reason}")]
    InvalidPath { path: String, reason: String },
    #[error("webhook token missing or invalid")]
    Unauthorized,
}

#[derive(Debug, Deserialize)]
struct WebhookPayload {
    #[serde(default)]
    asset: Option<AssetReference>,
}

#[derive(Debug, Deserialize)]
struct AssetReference {
    #[serde(default)]
    path: Option<String>,
}

/// Extract the resource a webhook body refers to.
pub fn parse_webhook(body: &[u8]) -> Result<ResourceId, WebhookError> {
    let payload: WebhookPayload =
        serde_json::from_slice(body).map_err(|err| WebhookError::Malformed(err.to_string()))?;

    let path = payload
        .asset
        .and_then(|asset| asset.path)
        .ok_or(WebhookError::MissingPath)?;

    resource_from_asset_path(&path)
}

pub fn resource_from_asset_path(path: &str) -> Result<ResourceId, WebhookError> {
    let segment = path
        .split('/')
        .find(|segment| !segment.is_empty())
        .ok_or_else(|| WebhookError::InvalidPath {
            path: path.to_string(),
            reason: "path is empty".to_string(),
        })?;

    ResourceId::parse(segment).map_err(|err| WebhookError::InvalidPath {
        path: path.to_string(),
        reason: err.to_string(),
    })
}

/// Checks the shared secret presented in [`WEBHOOK_TOKEN_HEADER`].
///
/// Without a configured secret every sender is accepted.
#[derive(Clone, Default)]
pub struct WebhookVerifier {
    hashed_secret: Option<Vec<u8>>,
}

impl WebhookVerifier {
    pub fn new(secret: Option<&str>) -> Self {
        Self {
            hashed_secret: secret.map(hash_token),
        }
    }

    pub fn is_enforced(&self) -> bool {
        self.hashed_secret.is_some()
    }

    pub fn verify(&self, presented: Option<&str>) -> Result<(), WebhookError> {
        let Some(expected) = &self.hashed_secret else {
            return Ok(());
        };
        let presented = presented.ok_or(WebhookError::Unauthorized)?;
        let hashed_input = hash_token(presented);
        if expected.ct_eq(&hashed_input).unwrap_u8() == 0 {
            return Err(WebhookError::Unauthorized);
        }
        Ok(())
    }
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("enforced", &self.is_enforced())
            .finish()
    }
}

fn hash_token(token: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_is_first_path_segment() {
        let body = br#"{"asset":{"path":"y/episodes/cover.jpg"}}"#;
        assert_eq!(parse_webhook(body).unwrap().as_str(), "y");
    }

    #[test]
    fn leading_slashes_are_ignored() {
        let body = br#"{"asset":{"path":"//show-1/feed.xml"},"event":"publish"}"#;
        assert_eq!(parse_webhook(body).unwrap().as_str(), "show-1");
    }

    #[test]
    fn rejects_non_json_body() {
        let error = parse_webhook(b"not json").unwrap_err();
        assert!(matches!(error, WebhookError::Malformed(_)));
    }

    #[test]
    fn rejects_payload_without_asset_path() {
        assert_eq!(parse_webhook(b"{}").unwrap_err(), WebhookError::MissingPath);
        assert_eq!(
            parse_webhook(br#"{"asset":{}}"#).unwrap_err(),
            WebhookError::MissingPath
        );
    }

    #[test]
    fn rejects_path_that_is_not_a_resource() {
        assert!(matches!(
            parse_webhook(br#"{"asset":{"path":"///"}}"#).unwrap_err(),
            WebhookError::InvalidPath { .. }
        ));
        assert!(matches!(
            parse_webhook(br#"{"asset":{"path":"bad id/x"}}"#).unwrap_err(),
            WebhookError::InvalidPath { .. }
        ));
    }

    #[test]
    fn verifier_without_secret_accepts_anyone() {
        let verifier = WebhookVerifier::new(None);
        assert!(!verifier.is_enforced());
        assert!(verifier.verify(None).is_ok());
    }

    #[test]
    fn verifier_checks_presented_token() {
        let verifier = WebhookVerifier::new(Some("s3cret"));
        assert!(verifier.verify(Some("s3cret")).is_ok());
        assert_eq!(
            verifier.verify(Some("guess")),
            Err(WebhookError::Unauthorized)
        );
        assert_eq!(verifier.verify(None), Err(WebhookError::Unauthorized));
    }
}
