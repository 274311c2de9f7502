use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro, agora com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Validação simples de regra de negócio (uma mensagem só)
    #[error("{0}")]
    Validacao(String),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Acesso negado: {0}")]
    AcessoNegado(String),

    #[error("{0} não encontrado(a)")]
    NaoEncontrado(&'static str),

    #[error("Transição inválida de '{de}' para '{para}'")]
    TransicaoInvalida { de: String, para: String },

    #[error("A ferramenta {0} já possui uma retirada em aberto")]
    FerramentaJaRetirada(String),

    #[error("Esta movimentação já foi devolvida")]
    MovimentacaoJaDevolvida,

    #[error("Estoque insuficiente: disponível {disponivel}, solicitado {solicitado}")]
    EstoqueInsuficiente {
        disponivel: Decimal,
        solicitado: Decimal,
    },

    #[error("Já existe uma requisição com o código {0}")]
    RequisicaoCodigoDuplicado(String),

    // Registro de ferramentas e livro de movimentações divergiram
    #[error("Estado inconsistente: {0}")]
    EstadoInconsistente(String),

    // Variante para erros de banco de dados (exemplo com sqlx)
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    // `anyhow::Error` é ótimo para capturar o contexto do erro.
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::Validacao(_)
            | AppError::EstoqueInsuficiente { .. } => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::AcessoNegado(_) => StatusCode::FORBIDDEN,
            AppError::UserNotFound | AppError::NaoEncontrado(_) => StatusCode::NOT_FOUND,
            AppError::EmailAlreadyExists
            | AppError::TransicaoInvalida { .. }
            | AppError::FerramentaJaRetirada(_)
            | AppError::MovimentacaoJaDevolvida
            | AppError::RequisicaoCodigoDuplicado(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let error_message = match self {
            // Retorna todos os detalhes da validação.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (status, body).into_response();
            }
            AppError::EmailAlreadyExists => "Este e-mail já está em uso.".to_string(),
            AppError::InvalidCredentials => "E-mail ou senha inválidos.".to_string(),
            AppError::InvalidToken => "Token de autenticação inválido ou ausente.".to_string(),
            AppError::UserNotFound => "Usuário não encontrado.".to_string(),
            AppError::EstadoInconsistente(ref detalhe) => {
                tracing::error!("Estado inconsistente detectado: {}", detalhe);
                "Os dados ficaram em um estado inconsistente. Recarregue e tente novamente."
                    .to_string()
            }
            e if status != StatusCode::INTERNAL_SERVER_ERROR => e.to_string(),

            // O `tracing` vai logar a mensagem detalhada que `thiserror` nos deu.
            e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                "Ocorreu um erro inesperado.".to_string()
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

/// Converte violação de chave única em um erro de domínio, mantendo os demais.
pub(crate) fn map_unique_violation(e: sqlx::Error, on_unique: impl FnOnce() -> AppError) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return on_unique();
        }
    }
    e.into()
}
