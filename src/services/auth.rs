// src/services/auth.rs

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use crate::{common::error::AppError, models::auth::Claims};

/// Verificação do bearer token. A emissão fica com o provedor de identidade.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Claims, AppError>;
}

/// Tokens HS256 assinados com o segredo compartilhado (`JWT_SECRET`).
#[derive(Clone)]
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

impl TokenVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Token rejeitado: {}", e);
                AppError::InvalidToken
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use uuid::Uuid;

    fn token(secret: &str, expires_in: Duration) -> (Uuid, String) {
        let now = Utc::now();
        let claims = Claims {
            sub: Uuid::new_v4(),
            exp: (now + expires_in).timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap();
        (claims.sub, token)
    }

    #[test]
    fn accepts_token_signed_with_shared_secret() {
        let (sub, token) = token("segredo", Duration::hours(1));
        assert_eq!(JwtVerifier::new("segredo").verify(&token).unwrap().sub, sub);
    }

    #[test]
    fn rejects_wrong_secret_expired_and_garbage() {
        let verifier = JwtVerifier::new("segredo");
        let (_, other_secret) = token("outro", Duration::hours(1));
        let (_, expired) = token("segredo", Duration::hours(-2));

        assert!(matches!(verifier.verify(&other_secret), Err(AppError::InvalidToken)));
        assert!(matches!(verifier.verify(&expired), Err(AppError::InvalidToken)));
        assert!(matches!(verifier.verify("nao-e-um-jwt"), Err(AppError::InvalidToken)));
    }
}
