// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 DailyBudget contributors

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Directory holding the ledger database file | `/data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `TOKEN_SECRET` | Secret for session tokens and reset-token HMAC | Required |
//! | `PUBLIC_HOSTNAME` | Public base URL used in reset links | `http://localhost:8080/` |
//! | `MAIL_RELAY_URL` | HTTP mail relay endpoint | Unset = mail disabled |
//! | `MAIL_API_KEY` | Bearer credential for the mail relay | Optional |
//! | `MAIL_FROM` | From address on outbound mail | `no-reply@dailybudget.app` |
//! | `REQUEST_TIMEOUT_SECS` | Per-request timeout in seconds | `30` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::{env, path::PathBuf, time::Duration};

pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const TOKEN_SECRET_ENV: &str = "TOKEN_SECRET";
pub const PUBLIC_HOSTNAME_ENV: &str = "PUBLIC_HOSTNAME";
pub const MAIL_RELAY_URL_ENV: &str = "MAIL_RELAY_URL";
pub const MAIL_API_KEY_ENV: &str = "MAIL_API_KEY";
pub const MAIL_FROM_ENV: &str = "MAIL_FROM";
pub const REQUEST_TIMEOUT_ENV: &str = "REQUEST_TIMEOUT_SECS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_MAIL_FROM: &str = "no-reply@dailybudget.app";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingVar(&'static str),
}

/// Mail relay settings. Absent entirely when `MAIL_RELAY_URL` is unset.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub relay_url: String,
    pub api_key: Option<String>,
    pub from: String,
}

/// Server configuration, loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub token_secret: String,
    pub public_hostname: String,
    pub request_timeout: Duration,
    pub mail: Option<MailConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let token_secret = env::var(TOKEN_SECRET_ENV)
            .ok()
            .filter(|secret| !secret.is_empty())
            .ok_or(ConfigError::MissingVar(TOKEN_SECRET_ENV))?;

        let port = env_or_default(PORT_ENV, "8080").parse().unwrap_or(8080);
        let timeout_secs: u64 = env_or_default(REQUEST_TIMEOUT_ENV, "30").parse().unwrap_or(30);

        let mail = env::var(MAIL_RELAY_URL_ENV).ok().map(|relay_url| MailConfig {
            relay_url,
            api_key: env::var(MAIL_API_KEY_ENV).ok(),
            from: env_or_default(MAIL_FROM_ENV, DEFAULT_MAIL_FROM),
        });

        Ok(Self {
            data_dir: PathBuf::from(env_or_default(DATA_DIR_ENV, "/data")),
            host: env_or_default(HOST_ENV, "0.0.0.0"),
            port,
            token_secret,
            public_hostname: env_or_default(PUBLIC_HOSTNAME_ENV, "http://localhost:8080/"),
            request_timeout: Duration::from_secs(timeout_secs),
            mail,
        })
    }

    /// Location of the redb database file inside the data directory.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("ledger.redb")
    }
}

fn env_or_default(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}
