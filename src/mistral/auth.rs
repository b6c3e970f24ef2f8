//! Authentication
//!
//! The workflow service accepts a Keystone token in the `X-Auth-Token`
//! header. Issuing tokens is the identity service's job; this module only
//! defines where tokens come from.

use crate::error::{Error, Result};
use async_trait::async_trait;

/// Environment variables checked for a pre-issued token, in order
pub const TOKEN_ENV_VARS: &[&str] = &["OS_AUTH_TOKEN", "OS_TOKEN"];

/// Supplies the token attached to every request
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn token(&self) -> Result<String>;
}

/// A token obtained out of band (e.g. `openstack token issue`)
#[derive(Clone)]
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Read the token from `OS_AUTH_TOKEN`, falling back to `OS_TOKEN`
    pub fn from_env() -> Result<Self> {
        TOKEN_ENV_VARS
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .map(|token| token.trim().to_string())
            .find(|token| !token.is_empty())
            .map(Self::new)
            .ok_or_else(|| {
                Error::Auth(format!(
                    "no token found, set one of {}",
                    TOKEN_ENV_VARS.join(", ")
                ))
            })
    }
}

// Never print the token itself
impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticToken").finish_non_exhaustive()
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> Result<String> {
        if self.token.is_empty() {
            return Err(Error::Auth("empty token".to_string()));
        }
        Ok(self.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_token() {
        let provider = StaticToken::new("gAAAAABtoken");
        assert_eq!(provider.token().await.unwrap(), "gAAAAABtoken");
    }

    #[tokio::test]
    async fn test_empty_token_is_rejected() {
        let err = StaticToken::new("").token().await.unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }

    #[test]
    fn test_debug_hides_token() {
        let debug = format!("{:?}", StaticToken::new("secret-value"));
        assert!(!debug.contains("secret-value"));
    }
}
