// src/middleware/rbac.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

use crate::{
    common::error::AppError,
    models::auth::{Sessao, UserRole},
};

/// 1. O Trait que define um papel exigido
pub trait RoleDef: Send + Sync + 'static {
    fn role() -> UserRole;
    fn descricao() -> &'static str;
}

/// 2. O Extractor (Guardião)
pub struct RequireRole<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleDef,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let sessao = parts
            .extensions
            .get::<Sessao>()
            .ok_or(AppError::InvalidToken)?;

        // Admin pode tudo
        if sessao.role != T::role() && !sessao.is_admin() {
            return Err(AppError::AcessoNegado(format!(
                "Apenas {} podem realizar esta ação.",
                T::descricao()
            )));
        }

        Ok(RequireRole(PhantomData))
    }
}

// ---
// DEFINIÇÃO DOS PAPÉIS (TIPOS)
// ---

pub struct Admin;
impl RoleDef for Admin {
    fn role() -> UserRole {
        UserRole::Admin
    }
    fn descricao() -> &'static str {
        "administradores"
    }
}
