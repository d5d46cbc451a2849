use super::model::{AuthenticatedUser, Claims};
use crate::core::error::AppError;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::time::Duration;
use uuid::Uuid;

/// Verifies HS256 access tokens signed with the shared secret
pub struct JwtValidator {
    decoding_key: DecodingKey,
    leeway: u64,
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
        validation.validate_nbf = true;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            tracing::debug!("Rejected bearer token: {}", e);
            AppError::Unauthorized("Invalid or expired token".to_string())
        })?;

        let claims = token_data.claims;
        let user_id = Uuid::parse_str(&claims.user_id)
            .map_err(|_| AppError::Unauthorized("Invalid user id in token".to_string()))?;

        Ok(AuthenticatedUser {
            user_id,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{issue_token, TEST_JWT_SECRET};
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn validator() -> JwtValidator {
        JwtValidator::new(TEST_JWT_SECRET, Duration::from_secs(0))
    }

    fn sign(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn future_exp() -> u64 {
        (chrono::Utc::now().timestamp() + 3600) as u64
    }

    #[test]
    fn test_valid_token() {
        let user_id = Uuid::new_v4();
        let token = issue_token(user_id, Some("PROVIDER"));

        let user = validator().validate_token(&token).unwrap();
        assert_eq!(user.user_id, user_id);
        assert_eq!(user.role.as_deref(), Some("PROVIDER"));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let claims = Claims {
            user_id: Uuid::new_v4().to_string(),
            role: None,
            exp: future_exp(),
        };
        let token = sign(&claims, "another-secret");

        assert!(matches!(
            validator().validate_token(&token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let claims = Claims {
            user_id: Uuid::new_v4().to_string(),
            role: None,
            exp: (chrono::Utc::now().timestamp() - 3600) as u64,
        };
        let token = sign(&claims, TEST_JWT_SECRET);

        assert!(validator().validate_token(&token).is_err());
    }

    #[test]
    fn test_non_uuid_user_id_rejected() {
        let claims = Claims {
            user_id: "u1".to_string(),
            role: None,
            exp: future_exp(),
        };
        let token = sign(&claims, TEST_JWT_SECRET);

        assert!(validator().validate_token(&token).is_err());
        assert!(validator().validate_token("not-a-jwt").is_err());
    }
}
