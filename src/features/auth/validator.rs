use super::model::{AuthenticatedUser, UserRole};
use crate::core::error::AppError;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Validates HS256 access tokens issued by the account service.
pub struct JwtValidator {
    decoding_key: DecodingKey,
    leeway: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub role: UserRole,
    #[serde(default)]
    pub department_ids: Vec<Uuid>,
    pub exp: u64,
}

impl JwtValidator {
    pub fn new(secret: &str, leeway: Duration) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            leeway: leeway.as_secs(),
        }
    }

    pub fn validate_token(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = self.leeway;
        validation.validate_aud = false;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))?;

        let claims = token_data.claims;

        Ok(AuthenticatedUser {
            user_id: claims.sub,
            email: claims.email,
            role: claims.role,
            department_ids: claims.department_ids,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret-that-is-long-enough-for-hs256";

    fn sign(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn owner_claims(exp: u64) -> Claims {
        Claims {
            sub: "owner-1".to_string(),
            email: Some("owner@example.com".to_string()),
            role: UserRole::Owner,
            department_ids: vec![Uuid::nil()],
            exp,
        }
    }

    fn future_exp() -> u64 {
        (chrono::Utc::now().timestamp() + 3600) as u64
    }

    #[test]
    fn test_valid_owner_token() {
        let validator = JwtValidator::new(SECRET, Duration::from_secs(0));
        let token = sign(&owner_claims(future_exp()), SECRET);

        let user = validator.validate_token(&token).unwrap();
        assert_eq!(user.user_id, "owner-1");
        assert_eq!(user.role, UserRole::Owner);
        assert!(user.owns_department(Uuid::nil()));
        assert!(!user.is_admin());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let validator = JwtValidator::new(SECRET, Duration::from_secs(0));
        let token = sign(&owner_claims(future_exp()), "another-secret-also-long-enough-xx");

        assert!(matches!(
            validator.validate_token(&token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let validator = JwtValidator::new(SECRET, Duration::from_secs(0));
        let past = (chrono::Utc::now().timestamp() - 3600) as u64;
        let token = sign(&owner_claims(past), SECRET);

        assert!(validator.validate_token(&token).is_err());
    }
}
