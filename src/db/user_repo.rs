use sqlx::PgPool;
use uuid::Uuid;
use crate::{
    common::error::{map_unique_violation, AppError},
    models::auth::{User, UserRole},
};

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Busca um usuário pelo seu e-mail
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    // Busca um usuário pelo seu ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    // Cria um novo usuário no banco de dados
    pub async fn create_user(
        &self,
        email: &str,
        nome: &str,
        role: UserRole,
        hashed_password: &str,
    ) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, nome, role, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(email)
        .bind(nome)
        .bind(role)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        // Converte erro de violação de chave única em um erro mais amigável
        .map_err(|e| map_unique_violation(e, || AppError::EmailAlreadyExists))
    }

    /// Invalida todos os tokens emitidos até agora (logout).
    pub async fn bump_token_version(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE users SET token_version = token_version + 1, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
