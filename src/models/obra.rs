// src/models/obra.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Unidade organizacional dona dos registros.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "obra", rename_all = "lowercase")] // Banco
#[serde(rename_all = "lowercase")] // JSON
pub enum Obra {
    Masters,
    Honda,
}

impl Obra {
    pub const TODAS: [Obra; 2] = [Obra::Masters, Obra::Honda];

    pub fn slug(&self) -> &'static str {
        match self {
            Obra::Masters => "masters",
            Obra::Honda => "honda",
        }
    }

    pub fn rotulo(&self) -> &'static str {
        match self {
            Obra::Masters => "Masters",
            Obra::Honda => "Honda",
        }
    }
}

impl std::str::FromStr for Obra {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "masters" => Ok(Obra::Masters),
            "honda" => Ok(Obra::Honda),
            other => Err(format!("Obra desconhecida: '{}'", other)),
        }
    }
}

impl std::fmt::Display for Obra {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}
