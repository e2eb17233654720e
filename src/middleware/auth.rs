use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::{
    common::error::{ApiError, AppError, AuthError},
    config::AppState,
    middleware::i18n::Locale,
    models::auth::Principal,
};

// O middleware em si: resolve o header Authorization num Principal verificado
// e o coloca nos "extensions" da requisição.
pub async fn auth_guard(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    match app_state.authenticator.authenticate(auth_header).await {
        Ok(principal) => {
            tracing::debug!(
                user_id = %principal.user_id(),
                role = ?principal.role(),
                path = %request.uri().path(),
                "principal autorizado"
            );
            request.extensions_mut().insert(AuthenticatedUser(principal));
            Ok(next.run(request).await)
        }
        Err(err) => {
            let locale = Locale::from_headers(request.headers());
            Err(AppError::Auth(err).to_api_error(&locale, &app_state.i18n_store))
        }
    }
}

// Extrator para obter o principal autenticado diretamente nos handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Principal);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>() {
            return Ok(user.clone());
        }

        // Rota sem o auth_guard: nunca trate como autenticada
        let app_state = AppState::from_ref(state);
        Err(AppError::Auth(AuthError::MissingToken)
            .to_api_error(&Locale::from_headers(&parts.headers), &app_state.i18n_store))
    }
}
