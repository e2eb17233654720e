// src/services/token.rs

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, decode_header, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey,
    Header, Validation,
};
use uuid::Uuid;

use crate::{
    common::error::{AppError, AuthError},
    config::JwtSecret,
    models::auth::{Claims, Role, NO_TENANT},
};

// Token de sessão: JWT HS256 (header.payload.assinatura, base64url sem padding).
// Sem I/O; o segredo vem da configuração.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    session_ttl: Duration,
    super_admin_ttl: Duration,
}

pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

impl TokenCodec {
    pub fn new(secret: &JwtSecret, session_ttl: Duration, super_admin_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // A expiração é conferida por nós, contra o relógio injetado
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();

        Self {
            encoding_key: EncodingKey::from_secret(secret.expose().as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.expose().as_bytes()),
            validation,
            session_ttl,
            super_admin_ttl,
        }
    }

    pub fn encode(&self, claims: &Claims) -> Result<String, AppError> {
        Ok(encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)?)
    }

    /// Verifica estrutura, assinatura e expiração, nessa ordem.
    pub fn decode(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let segments: Vec<&str> = token.split('.').collect();
        if segments.len() != 3 || segments.iter().any(|s| s.is_empty()) {
            return Err(AuthError::MalformedToken);
        }

        decode_header(token).map_err(|_| AuthError::MalformedToken)?;

        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    AuthError::SignatureInvalid
                }
                // O header já decodificou e o payload só é lido depois da
                // assinatura: base64 inválido aqui vem do segmento da assinatura.
                ErrorKind::Base64(_) => AuthError::SignatureInvalid,
                _ => AuthError::MalformedToken,
            }
        })?;

        if data.claims.exp < now.timestamp() {
            return Err(AuthError::TokenExpired);
        }

        Ok(data.claims)
    }

    // super_admin recebe sessões mais curtas
    pub fn lifetime_for(&self, role: Role) -> Duration {
        if role.is_super_admin() {
            self.super_admin_ttl
        } else {
            self.session_ttl
        }
    }

    pub fn issue(
        &self,
        user_id: Uuid,
        tenant_id: Option<Uuid>,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, AppError> {
        let claims = Claims {
            user_id,
            tenant_id: tenant_id.unwrap_or(NO_TENANT),
            role,
            iat: now.timestamp(),
            exp: (now + self.lifetime_for(role)).timestamp(),
        };
        let token = self.encode(&claims)?;
        Ok(IssuedToken { token, claims })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new(
            &JwtSecret::new("test-secret-with-enough-entropy").unwrap(),
            Duration::hours(24),
            Duration::hours(1),
        )
    }

    fn claims_at(now: DateTime<Utc>) -> Claims {
        Claims {
            user_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            role: Role::Manager,
            iat: now.timestamp(),
            exp: (now + Duration::hours(24)).timestamp(),
        }
    }

    #[test]
    fn decode_returns_what_encode_signed() {
        let now = Utc::now();
        let codec = codec();
        let claims = claims_at(now);
        let token = codec.encode(&claims).unwrap();

        assert_eq!(token.split('.').count(), 3);
        assert!(!token.contains('='));
        assert_eq!(codec.decode(&token, now).unwrap(), claims);
    }

    #[test]
    fn any_change_to_the_signature_is_rejected() {
        let now = Utc::now();
        let codec = codec();
        let token = codec.encode(&claims_at(now)).unwrap();
        let sig_start = token.rfind('.').unwrap() + 1;

        for pos in sig_start..token.len() {
            for bit in 0..7 {
                let mut bytes = token.clone().into_bytes();
                bytes[pos] ^= 1 << bit;
                let tampered = String::from_utf8(bytes).unwrap();

                // 'n' ^ 0x40 == '.': vira um quarto segmento
                let expected = if tampered.matches('.').count() > 2 {
                    AuthError::MalformedToken
                } else {
                    AuthError::SignatureInvalid
                };
                assert_eq!(codec.decode(&tampered, now), Err(expected), "posição {pos}, bit {bit}");
            }
        }
    }

    #[test]
    fn tampered_payload_fails_the_signature_check() {
        let now = Utc::now();
        let codec = codec();
        let token = codec.encode(&claims_at(now)).unwrap();

        let mut other = claims_at(now);
        other.role = Role::Admin;
        let forged_payload = codec.encode(&other).unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        let forged_parts: Vec<&str> = forged_payload.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], forged_parts[1], parts[2]);

        assert_eq!(codec.decode(&forged, now), Err(AuthError::SignatureInvalid));
    }

    #[test]
    fn a_different_secret_does_not_verify() {
        let now = Utc::now();
        let token = codec().encode(&claims_at(now)).unwrap();
        let other = TokenCodec::new(
            &JwtSecret::new("another-secret").unwrap(),
            Duration::hours(24),
            Duration::hours(1),
        );
        assert_eq!(other.decode(&token, now), Err(AuthError::SignatureInvalid));
    }

    #[test]
    fn expired_tokens_fail_even_with_a_valid_signature() {
        let now = Utc::now();
        let codec = codec();
        let issued = codec.issue(Uuid::new_v4(), Some(Uuid::new_v4()), Role::Cashier, now).unwrap();

        let just_after = now + Duration::hours(24) + Duration::seconds(1);
        assert_eq!(codec.decode(&issued.token, just_after), Err(AuthError::TokenExpired));

        let at_expiry = now + Duration::hours(24);
        assert!(codec.decode(&issued.token, at_expiry).is_ok());
    }

    #[test]
    fn wrong_segment_count_is_malformed() {
        let codec = codec();
        let now = Utc::now();
        for token in ["", "abc", "a.b", "a.b.c.d", "a..c", "not a token"] {
            assert_eq!(codec.decode(token, now), Err(AuthError::MalformedToken), "{token:?}");
        }
    }

    #[test]
    fn missing_required_claims_are_malformed() {
        #[derive(serde::Serialize)]
        struct Partial {
            user_id: Uuid,
            role: Role,
            exp: i64,
        }

        let now = Utc::now();
        let codec = codec();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &Partial {
                user_id: Uuid::new_v4(),
                role: Role::Cashier,
                exp: (now + Duration::hours(1)).timestamp(),
            },
            &EncodingKey::from_secret(b"test-secret-with-enough-entropy"),
        )
        .unwrap();

        assert_eq!(codec.decode(&token, now), Err(AuthError::MalformedToken));
    }

    #[test]
    fn super_admin_sessions_are_shorter() {
        let now = Utc::now();
        let codec = codec();
        let issued = codec.issue(Uuid::new_v4(), None, Role::SuperAdmin, now).unwrap();

        assert_eq!(issued.claims.tenant_id, NO_TENANT);
        assert_eq!(issued.claims.exp - issued.claims.iat, 3600);
    }
}
