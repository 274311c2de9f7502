// src/models/colaborador.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Colaborador {
    pub id: Uuid,
    #[schema(example = "João da Silva")]
    pub nome: String,
    pub created_at: DateTime<Utc>,
}
