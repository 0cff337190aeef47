// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variables are read once at startup into [`ServerConfig`].
//! A missing `JWT_SECRET` or any unparsable value is fatal.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `3000` |
//! | `DATABASE_PATH` | redb database file | `data/exoquest.redb` |
//! | `JWT_SECRET` | HMAC secret for session tokens | Required |
//! | `TOKEN_TTL_SECS` | Session token lifetime (1..=31536000) | `86400` |
//! | `BCRYPT_COST` | bcrypt cost factor (4..=31) | `10` |
//! | `STORE_MAX_CONNECTIONS` | Concurrent store operations | `10` |
//! | `STORE_ACQUIRE_TIMEOUT_MS` | Wait limit for a store slot | unset (queue) |
//! | `REQUEST_TIMEOUT_SECS` | Per-request deadline (non-zero) | `30` |
//! | `CORS_ALLOWED_ORIGIN` | Allowed browser origin | `http://localhost:8080` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM files enabling HTTPS | unset (HTTP) |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//!
//! Builds with the `dev` feature fall back to an ephemeral random secret when
//! `JWT_SECRET` is unset. Tokens then stop verifying after a restart.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::auth::password::{DEFAULT_BCRYPT_COST, MAX_BCRYPT_COST, MIN_BCRYPT_COST};
use crate::storage::pool::{StorePoolConfig, DEFAULT_MAX_CONNECTIONS};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const DATABASE_PATH_ENV: &str = "DATABASE_PATH";
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const TOKEN_TTL_SECS_ENV: &str = "TOKEN_TTL_SECS";
pub const BCRYPT_COST_ENV: &str = "BCRYPT_COST";
pub const STORE_MAX_CONNECTIONS_ENV: &str = "STORE_MAX_CONNECTIONS";
pub const STORE_ACQUIRE_TIMEOUT_MS_ENV: &str = "STORE_ACQUIRE_TIMEOUT_MS";
pub const REQUEST_TIMEOUT_SECS_ENV: &str = "REQUEST_TIMEOUT_SECS";
pub const CORS_ALLOWED_ORIGIN_ENV: &str = "CORS_ALLOWED_ORIGIN";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DATABASE_PATH: &str = "data/exoquest.redb";
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 24 * 60 * 60;
/// Longest accepted token lifetime (one year).
pub const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 60 * 60;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "http://localhost:8080";

/// Default `RUST_LOG` filter.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl LogFormat {
    /// Read `LOG_FORMAT`. Anything other than `json` means pretty.
    pub fn from_env() -> Self {
        Self::parse(std::env::var(LOG_FORMAT_ENV).ok().as_deref())
    }

    fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// PEM certificate chain and private key for HTTPS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub database_path: PathBuf,
    pub jwt_secret: String,
    /// True when the secret was generated at startup.
    pub ephemeral_secret: bool,
    pub token_ttl: Duration,
    pub bcrypt_cost: u32,
    pub pool: StorePoolConfig,
    pub request_timeout: Duration,
    pub cors_allowed_origin: String,
    pub tls: Option<TlsPaths>,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind_addr", &self.bind_addr)
            .field("database_path", &self.database_path)
            .field("jwt_secret", &"<redacted>")
            .field("ephemeral_secret", &self.ephemeral_secret)
            .field("token_ttl", &self.token_ttl)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("pool", &self.pool)
            .field("request_timeout", &self.request_timeout)
            .field("cors_allowed_origin", &self.cors_allowed_origin)
            .field("tls", &self.tls)
            .finish()
    }
}

impl ServerConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using `lookup` to resolve variable names. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let host: IpAddr = host.parse().map_err(|_| ConfigError::Invalid {
            var: HOST_ENV,
            reason: format!("'{host}' is not an IP address"),
        })?;
        let port = parse_or(get(PORT_ENV), PORT_ENV, DEFAULT_PORT)?;

        let (jwt_secret, ephemeral_secret) = match lookup(JWT_SECRET_ENV).filter(|s| !s.is_empty()) {
            Some(secret) => (secret, false),
            None => (ephemeral_secret()?, true),
        };

        let token_ttl_secs = parse_or(get(TOKEN_TTL_SECS_ENV), TOKEN_TTL_SECS_ENV, DEFAULT_TOKEN_TTL_SECS)?;
        if !(1..=MAX_TOKEN_TTL_SECS).contains(&token_ttl_secs) {
            return Err(ConfigError::Invalid {
                var: TOKEN_TTL_SECS_ENV,
                reason: format!("must be between 1 and {MAX_TOKEN_TTL_SECS}"),
            });
        }

        let bcrypt_cost = parse_or(get(BCRYPT_COST_ENV), BCRYPT_COST_ENV, DEFAULT_BCRYPT_COST)?;
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                var: BCRYPT_COST_ENV,
                reason: format!("must be between {MIN_BCRYPT_COST} and {MAX_BCRYPT_COST}"),
            });
        }

        let max_connections = parse_or(
            get(STORE_MAX_CONNECTIONS_ENV),
            STORE_MAX_CONNECTIONS_ENV,
            DEFAULT_MAX_CONNECTIONS,
        )?;
        if max_connections == 0 {
            return Err(ConfigError::Invalid {
                var: STORE_MAX_CONNECTIONS_ENV,
                reason: "must be at least 1".to_string(),
            });
        }
        let acquire_timeout = get(STORE_ACQUIRE_TIMEOUT_MS_ENV)
            .map(|v| parse_value::<u64>(&v, STORE_ACQUIRE_TIMEOUT_MS_ENV))
            .transpose()?
            .map(Duration::from_millis);

        let request_timeout_secs = parse_or(
            get(REQUEST_TIMEOUT_SECS_ENV),
            REQUEST_TIMEOUT_SECS_ENV,
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;
        if request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: REQUEST_TIMEOUT_SECS_ENV,
                reason: "must be greater than zero".to_string(),
            });
        }

        let tls = match (get(TLS_CERT_PATH_ENV), get(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing(TLS_KEY_PATH_ENV)),
            (None, Some(_)) => return Err(ConfigError::Missing(TLS_CERT_PATH_ENV)),
        };

        Ok(Self {
            bind_addr: SocketAddr::new(host, port),
            database_path: get(DATABASE_PATH_ENV)
                .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string())
                .into(),
            jwt_secret,
            ephemeral_secret,
            token_ttl: Duration::from_secs(token_ttl_secs),
            bcrypt_cost,
            pool: StorePoolConfig {
                max_connections,
                acquire_timeout,
            },
            request_timeout: Duration::from_secs(request_timeout_secs),
            cors_allowed_origin: get(CORS_ALLOWED_ORIGIN_ENV)
                .unwrap_or_else(|| DEFAULT_CORS_ALLOWED_ORIGIN.to_string()),
            tls,
        })
    }
}

#[cfg(feature = "dev")]
fn ephemeral_secret() -> Result<String, ConfigError> {
    Ok(format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    ))
}

#[cfg(not(feature = "dev"))]
fn ephemeral_secret() -> Result<String, ConfigError> {
    Err(ConfigError::Missing(JWT_SECRET_ENV))
}

fn parse_value<T>(value: &str, var: &'static str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        reason: format!("'{value}': {e}"),
    })
}

fn parse_or<T>(value: Option<String>, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match value {
        Some(v) => parse_value(&v, var),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = load(&[(JWT_SECRET_ENV, "s3cret")]).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(config.database_path, PathBuf::from(DEFAULT_DATABASE_PATH));
        assert_eq!(config.jwt_secret, "s3cret");
        assert!(!config.ephemeral_secret);
        assert_eq!(config.token_ttl, Duration::from_secs(86_400));
        assert_eq!(config.bcrypt_cost, 10);
        assert_eq!(config.pool, StorePoolConfig::default());
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.cors_allowed_origin, "http://localhost:8080");
        assert!(config.tls.is_none());
    }

    #[cfg(not(feature = "dev"))]
    #[test]
    fn missing_secret_is_fatal() {
        assert_eq!(
            load(&[]).unwrap_err(),
            ConfigError::Missing(JWT_SECRET_ENV)
        );
        assert_eq!(
            load(&[(JWT_SECRET_ENV, "")]).unwrap_err(),
            ConfigError::Missing(JWT_SECRET_ENV)
        );
    }

    #[cfg(feature = "dev")]
    #[test]
    fn missing_secret_is_generated_in_dev() {
        let config = load(&[]).unwrap();
        assert!(config.ephemeral_secret);
        assert_eq!(config.jwt_secret.len(), 64);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            (JWT_SECRET_ENV, "s3cret"),
            (HOST_ENV, "127.0.0.1"),
            (PORT_ENV, "8443"),
            (DATABASE_PATH_ENV, "/tmp/exo.redb"),
            (TOKEN_TTL_SECS_ENV, "60"),
            (BCRYPT_COST_ENV, "12"),
            (STORE_MAX_CONNECTIONS_ENV, "4"),
            (STORE_ACQUIRE_TIMEOUT_MS_ENV, "250"),
            (REQUEST_TIMEOUT_SECS_ENV, "5"),
            (CORS_ALLOWED_ORIGIN_ENV, "https://exoquest.example"),
            (TLS_CERT_PATH_ENV, "/certs/cert.pem"),
            (TLS_KEY_PATH_ENV, "/certs/key.pem"),
        ])
        .unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:8443".parse().unwrap());
        assert_eq!(config.database_path, PathBuf::from("/tmp/exo.redb"));
        assert_eq!(config.token_ttl, Duration::from_secs(60));
        assert_eq!(config.bcrypt_cost, 12);
        assert_eq!(config.pool.max_connections, 4);
        assert_eq!(config.pool.acquire_timeout, Some(Duration::from_millis(250)));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.cors_allowed_origin, "https://exoquest.example");
        assert_eq!(
            config.tls,
            Some(TlsPaths {
                cert: "/certs/cert.pem".into(),
                key: "/certs/key.pem".into(),
            })
        );
    }

    #[test]
    fn invalid_values_are_rejected() {
        let secret = (JWT_SECRET_ENV, "s3cret");
        for (var, value) in [
            (PORT_ENV, "http"),
            (HOST_ENV, "localhost"),
            (BCRYPT_COST_ENV, "3"),
            (BCRYPT_COST_ENV, "32"),
            (TOKEN_TTL_SECS_ENV, "0"),
            (TOKEN_TTL_SECS_ENV, "18446744073709551615"),
            (STORE_MAX_CONNECTIONS_ENV, "0"),
            (REQUEST_TIMEOUT_SECS_ENV, "0"),
            (STORE_ACQUIRE_TIMEOUT_MS_ENV, "soon"),
        ] {
            let err = load(&[secret, (var, value)]).unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { var: v, .. } if v == var),
                "{var}={value}: {err}"
            );
        }
    }

    #[test]
    fn token_ttl_upper_bound_is_inclusive() {
        let max = MAX_TOKEN_TTL_SECS.to_string();
        let config = load(&[(JWT_SECRET_ENV, "s3cret"), (TOKEN_TTL_SECS_ENV, max.as_str())]).unwrap();
        assert_eq!(config.token_ttl, Duration::from_secs(MAX_TOKEN_TTL_SECS));

        let over = (MAX_TOKEN_TTL_SECS + 1).to_string();
        let err = load(&[(JWT_SECRET_ENV, "s3cret"), (TOKEN_TTL_SECS_ENV, over.as_str())]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: TOKEN_TTL_SECS_ENV, .. }));
    }

    #[test]
    fn tls_paths_must_come_in_pairs() {
        let err = load(&[(JWT_SECRET_ENV, "s"), (TLS_CERT_PATH_ENV, "/c.pem")]).unwrap_err();
        assert_eq!(err, ConfigError::Missing(TLS_KEY_PATH_ENV));
    }

    #[test]
    fn debug_output_redacts_secret() {
        let config = load(&[(JWT_SECRET_ENV, "super-secret-value")]).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret-value"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn log_format_parsing() {
        assert_eq!(LogFormat::parse(Some("json")), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some(" JSON ")), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some("pretty")), LogFormat::Pretty);
        assert_eq!(LogFormat::parse(Some("xml")), LogFormat::Pretty);
        assert_eq!(LogFormat::parse(None), LogFormat::Pretty);
    }
}
