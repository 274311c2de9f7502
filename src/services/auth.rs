// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::auth::{AuthResponse, Claims, Sessao, User, UserRole},
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
    ttl_days: i64,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String, ttl_days: i64) -> Self {
        Self {
            user_repo,
            jwt_secret,
            ttl_days,
        }
    }

    async fn hash_password(password: &str) -> Result<String, AppError> {
        let password_clone = password.to_owned();
        let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
        Ok(hashed)
    }

    /// Cadastro feito por um admin. Não abre sessão para o novo usuário.
    pub async fn register_user(
        &self,
        email: &str,
        password: &str,
        nome: &str,
        role: UserRole,
    ) -> Result<User, AppError> {
        let email = email.trim().to_lowercase();
        let hashed_password = Self::hash_password(password).await?;

        let user = self
            .user_repo
            .create_user(&email, nome.trim(), role, &hashed_password)
            .await?;
        tracing::info!(user_id = %user.id, ?role, "👤 Usuário cadastrado");
        Ok(user)
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let user = self
            .user_repo
            .find_by_email(&email.trim().to_lowercase())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || {
            verify(&password_clone, &password_hash_clone)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        let token = self.create_token(&user)?;
        Ok(AuthResponse { token, user })
    }

    /// Valida o token e monta a sessão. Tokens anteriores ao último logout
    /// são recusados.
    pub async fn validate_token(&self, token: &str) -> Result<Sessao, AppError> {
        let claims = self.decode_token(token)?;

        let user = self
            .user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::UserNotFound)?;

        if claims.ver != user.token_version {
            return Err(AppError::InvalidToken);
        }
        Ok(Sessao::from(&user))
    }

    pub async fn logout(&self, sessao: &Sessao) -> Result<(), AppError> {
        self.user_repo.bump_token_version(sessao.user_id).await?;
        tracing::info!(user_id = %sessao.user_id, "Sessão encerrada");
        Ok(())
    }

    pub async fn me(&self, sessao: &Sessao) -> Result<User, AppError> {
        self.user_repo
            .find_by_id(sessao.user_id)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    /// Cria o primeiro admin a partir da configuração, se ainda não existir.
    pub async fn garantir_admin_inicial(
        &self,
        email: &str,
        password: &str,
        nome: &str,
    ) -> Result<(), AppError> {
        if self
            .user_repo
            .find_by_email(&email.trim().to_lowercase())
            .await?
            .is_some()
        {
            return Ok(());
        }
        self.register_user(email, password, nome, UserRole::Admin).await?;
        tracing::info!("🔑 Admin inicial criado");
        Ok(())
    }

    fn create_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(self.ttl_days);

        let claims = Claims {
            sub: user.id,
            ver: user.token_version,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }

    fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;
        Ok(token_data.claims)
    }
}
