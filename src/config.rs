// src/config.rs

use chrono::Duration as ChronoDuration;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{fmt, sync::Arc, time::Duration};
use thiserror::Error;

use crate::{
    common::i18n::I18nStore,
    db::{
        credentials::{CachedCredentialStore, CredentialStore},
        CatalogRepository, SettingsRepository, TenantRepository, UserRepository,
    },
    services::{
        auth::AuthService, authenticator::Authenticator, tenancy_service::TenantService,
        token::TokenCodec, user_service::UserService,
    },
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} deve ser definida")]
    Missing(&'static str),

    #[error("{0} não pode ser vazia")]
    Empty(&'static str),

    #[error("{key} inválida: '{value}'")]
    Invalid { key: &'static str, value: String },
}

// ---
// Segredo de assinatura
// ---
// Nunca aparece em logs: o Debug é mascarado.
#[derive(Clone)]
pub struct JwtSecret(Arc<str>);

impl JwtSecret {
    pub fn new(value: &str) -> Result<Self, ConfigError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ConfigError::Empty("JWT_SECRET"));
        }
        Ok(Self(Arc::from(value)))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JwtSecret(***)")
    }
}

// ---
// Configuração do processo
// ---
// Carregada uma vez na inicialização e injetada; nunca relida por requisição.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub jwt_secret: JwtSecret,
    pub token_ttl: ChronoDuration,
    pub super_admin_token_ttl: ChronoDuration,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub auth_lookup_timeout: Duration,
    pub credential_cache_ttl: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_source(|key| std::env::var(key).ok())
    }

    pub fn from_source<F>(source: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = source("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        if database_url.trim().is_empty() {
            return Err(ConfigError::Empty("DATABASE_URL"));
        }

        let jwt_secret = source("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        let jwt_secret = JwtSecret::new(&jwt_secret)?;

        let bind_addr = source("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string());

        let token_ttl_hours: i64 = parse_or(&source, "TOKEN_TTL_HOURS", 24)?;
        let super_admin_ttl_minutes: i64 = parse_or(&source, "SUPER_ADMIN_TOKEN_TTL_MINUTES", 60)?;
        let db_max_connections: u32 = parse_or(&source, "DB_MAX_CONNECTIONS", 5)?;
        let db_acquire_timeout_secs: u64 = parse_or(&source, "DB_ACQUIRE_TIMEOUT_SECS", 3)?;
        let lookup_timeout_ms: u64 = parse_or(&source, "AUTH_LOOKUP_TIMEOUT_MS", 2000)?;
        let cache_ttl_secs: u64 = parse_or(&source, "AUTH_CACHE_TTL_SECS", 0)?;

        if token_ttl_hours <= 0 {
            return Err(ConfigError::Invalid {
                key: "TOKEN_TTL_HOURS",
                value: token_ttl_hours.to_string(),
            });
        }
        if super_admin_ttl_minutes <= 0 {
            return Err(ConfigError::Invalid {
                key: "SUPER_ADMIN_TOKEN_TTL_MINUTES",
                value: super_admin_ttl_minutes.to_string(),
            });
        }

        Ok(Self {
            database_url,
            bind_addr,
            jwt_secret,
            token_ttl: ChronoDuration::hours(token_ttl_hours),
            super_admin_token_ttl: ChronoDuration::minutes(super_admin_ttl_minutes),
            db_max_connections,
            db_acquire_timeout: Duration::from_secs(db_acquire_timeout_secs),
            auth_lookup_timeout: Duration::from_millis(lookup_timeout_ms),
            credential_cache_ttl: Duration::from_secs(cache_ttl_secs),
        })
    }
}

fn parse_or<F, T>(source: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match source(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

// ---
// Estado compartilhado
// ---
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub i18n_store: I18nStore,
    pub authenticator: Authenticator,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub tenant_service: TenantService,
    pub catalog_repo: CatalogRepository,
    pub settings_repo: SettingsRepository,
}

impl AppState {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(config.db_acquire_timeout)
            .connect(&config.database_url)
            .await?;

        tracing::info!(
            max_connections = config.db_max_connections,
            "✅ Conexão com o banco de dados estabelecida com sucesso!"
        );

        let user_repo = UserRepository::new(db_pool.clone());
        Ok(Self::assemble(config, db_pool, Arc::new(user_repo)))
    }

    // Monta o gráfico de dependências sobre uma pool já criada e uma fonte de
    // credenciais qualquer (Postgres em produção, memória nos testes).
    pub fn assemble(
        config: AppConfig,
        db_pool: PgPool,
        credential_source: Arc<dyn CredentialStore>,
    ) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let tenant_repo = TenantRepository::new(db_pool.clone());

        let token_codec = TokenCodec::new(
            &config.jwt_secret,
            config.token_ttl,
            config.super_admin_token_ttl,
        );
        let credential_cache = Arc::new(CachedCredentialStore::new(
            credential_source,
            config.credential_cache_ttl,
        ));
        let authenticator = Authenticator::new(
            token_codec.clone(),
            credential_cache.clone(),
            config.auth_lookup_timeout,
        );

        let auth_service = AuthService::new(
            user_repo.clone(),
            tenant_repo.clone(),
            token_codec,
            db_pool.clone(),
        );
        let user_service = UserService::new(user_repo, credential_cache.clone());
        let tenant_service = TenantService::new(tenant_repo, credential_cache);

        Self {
            catalog_repo: CatalogRepository::new(db_pool.clone()),
            settings_repo: SettingsRepository::new(db_pool.clone()),
            db_pool,
            i18n_store: I18nStore::new(),
            authenticator,
            auth_service,
            user_service,
            tenant_service,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn source(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_secret_is_fatal() {
        let err = AppConfig::from_source(source(&[("DATABASE_URL", "postgres://x")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("JWT_SECRET")));
    }

    #[test]
    fn blank_secret_is_fatal() {
        let err = AppConfig::from_source(source(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "   "),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Empty("JWT_SECRET")));
    }

    #[test]
    fn defaults_apply() {
        let config = AppConfig::from_source(source(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "s3cret"),
        ]))
        .unwrap();

        assert_eq!(config.token_ttl, ChronoDuration::hours(24));
        assert_eq!(config.super_admin_token_ttl, ChronoDuration::hours(1));
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.db_acquire_timeout, Duration::from_secs(3));
        assert!(config.credential_cache_ttl.is_zero());
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
    }

    #[test]
    fn unparsable_numbers_are_rejected() {
        let err = AppConfig::from_source(source(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "s3cret"),
            ("TOKEN_TTL_HOURS", "um dia"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "TOKEN_TTL_HOURS", .. }));
    }

    #[test]
    fn secret_never_shows_in_debug_output() {
        let config = AppConfig::from_source(source(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "super-secret-value"),
        ]))
        .unwrap();
        assert!(!format!("{config:?}").contains("super-secret-value"));
    }
}
