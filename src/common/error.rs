use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;

// ---
// Falhas de autenticação / autorização
// ---
// Os chamadores decidem pela variante, nunca pelo texto da mensagem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("token ausente")]
    MissingToken,

    #[error("token malformado")]
    MalformedToken,

    #[error("assinatura do token inválida")]
    SignatureInvalid,

    #[error("token expirado")]
    TokenExpired,

    #[error("usuário do token não existe")]
    UserNotFound,

    #[error("conta inativa")]
    AccountInactive,

    #[error("loja inativa")]
    TenantInactive,

    #[error("acesso negado")]
    Forbidden,

    #[error("armazenamento de credenciais indisponível")]
    StorageUnavailable,
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingToken
            | AuthError::MalformedToken
            | AuthError::SignatureInvalid
            | AuthError::TokenExpired
            | AuthError::UserNotFound => StatusCode::UNAUTHORIZED,
            // 403 separa "existe mas está bloqueado" de "credencial ruim"
            AuthError::AccountInactive | AuthError::TenantInactive | AuthError::Forbidden => {
                StatusCode::FORBIDDEN
            }
            AuthError::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn message_key(&self) -> &'static str {
        match self {
            AuthError::MissingToken
            | AuthError::MalformedToken
            | AuthError::SignatureInvalid
            | AuthError::TokenExpired
            | AuthError::UserNotFound => "auth.invalid_token",
            AuthError::AccountInactive => "auth.account_inactive",
            AuthError::TenantInactive => "auth.tenant_inactive",
            AuthError::Forbidden => "auth.forbidden",
            AuthError::StorageUnavailable => "service.unavailable",
        }
    }
}

// ---
// Erro da aplicação
// ---
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("E-mail cadastrado em mais de uma loja")]
    TenantSelectionRequired,

    #[error("Atribuição de cargo não permitida")]
    RoleAssignmentForbidden,

    #[error("Recurso não encontrado: {0}")]
    NotFound(&'static str),

    #[error("Falha de autenticação: {0}")]
    Auth(#[from] AuthError),

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

// O formato que vai para o cliente
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<serde_json::Value>,
}

impl AppError {
    // Único ponto onde o detalhe vira mensagem para o usuário.
    // O log mantém o tipo específico.
    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let lang = locale.0.as_str();
        let simple = |status: StatusCode, key: &str| ApiError {
            status,
            error: store.translate(lang, key),
            details: None,
        };

        match self {
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                ApiError {
                    status: StatusCode::BAD_REQUEST,
                    error: store.translate(lang, "validation.failed"),
                    details: Some(json!(details)),
                }
            }
            AppError::EmailAlreadyExists => simple(StatusCode::CONFLICT, "auth.email_exists"),
            AppError::InvalidCredentials => {
                simple(StatusCode::UNAUTHORIZED, "auth.invalid_credentials")
            }
            AppError::TenantSelectionRequired => {
                simple(StatusCode::CONFLICT, "auth.tenant_selection_required")
            }
            AppError::RoleAssignmentForbidden => {
                simple(StatusCode::FORBIDDEN, "users.role_assignment_forbidden")
            }
            AppError::NotFound(resource) => {
                tracing::debug!(resource, "recurso não encontrado no escopo da loja");
                simple(StatusCode::NOT_FOUND, "resource.not_found")
            }
            AppError::Auth(kind) => {
                tracing::warn!(kind = ?kind, status = %kind.status_code(), "requisição rejeitada");
                simple(kind.status_code(), kind.message_key())
            }
            AppError::DatabaseError(sqlx::Error::PoolTimedOut) => {
                tracing::error!("pool de conexões esgotado");
                simple(StatusCode::SERVICE_UNAVAILABLE, "service.unavailable")
            }
            e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                simple(StatusCode::INTERNAL_SERVER_ERROR, "internal.unexpected")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn en() -> Locale {
        Locale("en".to_string())
    }

    #[test]
    fn every_token_failure_collapses_to_the_same_401_body() {
        let store = I18nStore::new();
        let kinds = [
            AuthError::MissingToken,
            AuthError::MalformedToken,
            AuthError::SignatureInvalid,
            AuthError::TokenExpired,
            AuthError::UserNotFound,
        ];
        for kind in kinds {
            let api = AppError::from(kind).to_api_error(&en(), &store);
            assert_eq!(api.status, StatusCode::UNAUTHORIZED);
            assert_eq!(api.error, "Invalid or expired token");
        }
    }

    #[test]
    fn blocked_accounts_and_forbidden_are_403() {
        let store = I18nStore::new();
        for kind in [AuthError::AccountInactive, AuthError::TenantInactive, AuthError::Forbidden] {
            let api = AppError::from(kind).to_api_error(&en(), &store);
            assert_eq!(api.status, StatusCode::FORBIDDEN);
        }
    }

    #[test]
    fn storage_failures_are_503_not_401() {
        let store = I18nStore::new();
        let api = AppError::from(AuthError::StorageUnavailable).to_api_error(&en(), &store);
        assert_eq!(api.status, StatusCode::SERVICE_UNAVAILABLE);

        let api = AppError::from(sqlx::Error::PoolTimedOut).to_api_error(&en(), &store);
        assert_eq!(api.status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn messages_follow_the_locale() {
        let store = I18nStore::new();
        let api = AppError::from(AuthError::TokenExpired)
            .to_api_error(&Locale("pt".to_string()), &store);
        assert_eq!(api.error, "Token inválido ou expirado");
    }
}
