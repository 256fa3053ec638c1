//! Identity of the current user.
//!
//! The session's access token is an HS256 JWT issued by the auth backend; its
//! `sub` claim is the user id that keys the role-mapping table.

use async_trait::async_trait;
use avaluos_core::{AppError, Config, UserId};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

/// Source of the currently authenticated user
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `None` when nobody is signed in or the session is no longer valid
    async fn current_user(&self) -> Option<UserId>;
}

#[derive(Debug, Deserialize)]
struct AccessClaims {
    sub: String,
}

/// Identity taken from a configured access token
pub struct JwtIdentity {
    token: Option<String>,
    key: DecodingKey,
    validation: Validation,
}

impl JwtIdentity {
    pub fn new(token: Option<String>, secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        // Auth backends set audiences we do not check here
        validation.validate_aud = false;

        Self {
            token,
            key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Build from `AVALUOS_ACCESS_TOKEN` and `JWT_SECRET`
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let secret = config
            .jwt_secret
            .as_deref()
            .ok_or_else(|| AppError::Config("JWT_SECRET not configured".to_string()))?;
        Ok(Self::new(config.access_token.clone(), secret.as_bytes()))
    }

    /// Validate a token and extract its user id
    pub fn user_from_token(&self, token: &str) -> Result<UserId, AppError> {
        let data = decode::<AccessClaims>(token, &self.key, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "Access token rejected");
            AppError::NotAuthenticated
        })?;

        data.claims.sub.parse::<UserId>().map_err(|e| {
            tracing::debug!(error = %e, "Access token subject is not a user id");
            AppError::NotAuthenticated
        })
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentity {
    async fn current_user(&self) -> Option<UserId> {
        let token = self.token.as_deref()?;
        self.user_from_token(token).ok()
    }
}
