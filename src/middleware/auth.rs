// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use crate::{common::error::AppError, config::AppState, models::auth::Sessao};

/// Único ponto onde a sessão é montada. As rotas protegidas recebem a
/// `Sessao` pelos extensions da requisição.
pub async fn auth_guard(
    State(app_state): State<AppState>,
    mut request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Authorization(bearer) = request
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or(AppError::InvalidToken)?;

    let sessao = app_state.auth_service.validate_token(bearer.token()).await?;
    tracing::Span::current().record("user_id", tracing::field::display(sessao.user_id));

    request.extensions_mut().insert(sessao);
    Ok(next.run(request).await)
}

// Extrator para obter a sessão diretamente nos handlers
impl<S> FromRequestParts<S> for Sessao
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Sessao>()
            .cloned()
            .ok_or(AppError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::UserRole;
    use axum::http::Request;
    use uuid::Uuid;

    #[tokio::test]
    async fn session_is_read_from_extensions() {
        let sessao = Sessao {
            user_id: Uuid::new_v4(),
            email: "ana@obra.com".into(),
            nome: "Ana".into(),
            role: UserRole::Colaborador,
        };
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        parts.extensions.insert(sessao.clone());

        let extraida = Sessao::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(extraida, sessao);
    }

    #[tokio::test]
    async fn missing_session_is_unauthorized() {
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        let err = Sessao::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }
}
