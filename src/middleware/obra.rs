// src/middleware/obra.rs

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{common::error::AppError, models::obra::Obra};

// O nome do nosso cabeçalho HTTP customizado
pub const OBRA_HEADER: &str = "x-obra";

/// Obra selecionada pelo cliente. Toda leitura e escrita é filtrada por ela.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObraContext(pub Obra);

impl<S> FromRequestParts<S> for ObraContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts.headers.get(OBRA_HEADER).ok_or_else(|| {
            AppError::Validacao("O cabeçalho x-obra é obrigatório.".to_string())
        })?;

        let value_str = value.to_str().map_err(|_| {
            AppError::Validacao("Cabeçalho x-obra contém caracteres inválidos.".to_string())
        })?;

        let obra = value_str.parse::<Obra>().map_err(AppError::Validacao)?;
        Ok(ObraContext(obra))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use rstest::rstest;

    async fn extrair(valor: Option<&str>) -> Result<ObraContext, AppError> {
        let mut builder = Request::builder();
        if let Some(v) = valor {
            builder = builder.header(OBRA_HEADER, v);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        ObraContext::from_request_parts(&mut parts, &()).await
    }

    #[rstest]
    #[case("masters", Obra::Masters)]
    #[case("Honda", Obra::Honda)]
    #[case(" HONDA ", Obra::Honda)]
    #[tokio::test]
    async fn parses_known_units(#[case] valor: &str, #[case] esperada: Obra) {
        assert_eq!(extrair(Some(valor)).await.unwrap(), ObraContext(esperada));
    }

    #[tokio::test]
    async fn missing_or_unknown_unit_is_rejected() {
        assert!(matches!(extrair(None).await, Err(AppError::Validacao(_))));
        assert!(matches!(extrair(Some("toyota")).await, Err(AppError::Validacao(_))));
    }
}
