use sha2::{Digest, Sha256};
use thiserror::Error;

/// Why a mutating storage operation was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnauthorizedReason {
    MissingToken,
    TokenMismatch,
}

impl std::fmt::Display for UnauthorizedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnauthorizedReason::MissingToken => {
                f.write_str("admin token required but none was supplied")
            }
            UnauthorizedReason::TokenMismatch => {
                f.write_str("admin token does not match the configured secret")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Unauthorized: {reason}")]
pub struct UnauthorizedError {
    pub reason: UnauthorizedReason,
}

/// Shared-secret gate in front of every mutating storage operation.
///
/// With no configured secret the gate is open. With a secret, every call must
/// present a matching token or it fails closed.
#[derive(Clone)]
pub struct AuthorizationGate {
    secret_digest: Option<[u8; 32]>,
}

impl AuthorizationGate {
    /// Build from an optional configured secret; empty strings count as unset
    pub fn new(secret: Option<&str>) -> Self {
        Self {
            secret_digest: secret.filter(|s| !s.is_empty()).map(digest),
        }
    }

    /// Gate that admits every caller
    pub fn open() -> Self {
        Self {
            secret_digest: None,
        }
    }

    pub fn is_enforced(&self) -> bool {
        self.secret_digest.is_some()
    }

    pub fn authorize(&self, token: Option<&str>) -> Result<(), UnauthorizedError> {
        let Some(expected) = &self.secret_digest else {
            return Ok(());
        };

        let token = token.filter(|t| !t.is_empty()).ok_or(UnauthorizedError {
            reason: UnauthorizedReason::MissingToken,
        })?;

        // Fixed-length digests keep the comparison independent of token length
        let presented = digest(token);
        let diff = presented
            .iter()
            .zip(expected.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b));

        if diff == 0 {
            Ok(())
        } else {
            Err(UnauthorizedError {
                reason: UnauthorizedReason::TokenMismatch,
            })
        }
    }
}

impl std::fmt::Debug for AuthorizationGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationGate")
            .field("enforced", &self.is_enforced())
            .finish()
    }
}

fn digest(value: &str) -> [u8; 32] {
    Sha256::digest(value.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_gate_admits_anything() {
        let gate = AuthorizationGate::open();
        assert!(!gate.is_enforced());
        assert!(gate.authorize(None).is_ok());
        assert!(gate.authorize(Some("whatever")).is_ok());
    }

    #[test]
    fn test_empty_secret_disables_check() {
        let gate = AuthorizationGate::new(Some(""));
        assert!(!gate.is_enforced());
        assert!(gate.authorize(None).is_ok());
    }

    #[test]
    fn test_matching_token_accepted() {
        let gate = AuthorizationGate::new(Some("s3cret"));
        assert!(gate.is_enforced());
        assert!(gate.authorize(Some("s3cret")).is_ok());
    }

    #[test]
    fn test_missing_token_rejected() {
        let gate = AuthorizationGate::new(Some("s3cret"));
        assert_eq!(
            gate.authorize(None).unwrap_err().reason,
            UnauthorizedReason::MissingToken
        );
        assert_eq!(
            gate.authorize(Some("")).unwrap_err().reason,
            UnauthorizedReason::MissingToken
        );
    }

    #[test]
    fn test_wrong_token_rejected() {
        let gate = AuthorizationGate::new(Some("s3cret"));
        let err = gate.authorize(Some("s3cret ")).unwrap_err();
        assert_eq!(err.reason, UnauthorizedReason::TokenMismatch);
        assert!(err.to_string().starts_with("Unauthorized"));
    }

    #[test]
    fn test_debug_does_not_leak_secret() {
        let gate = AuthorizationGate::new(Some("s3cret"));
        let rendered = format!("{:?}", gate);
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("enforced: true"));
    }
}
