use std::time::Duration;

use anyhow::{Context, Result, anyhow};

use crate::csv_import::{ColumnMismatch, ImportOptions, InvalidId};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Apply server-confirmed records locally before the confirming re-fetch.
    pub optimistic_patch: bool,
    pub import: ImportOptions,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    pub endpoint: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub sync: SyncOptions,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:4000/graphql".into(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            sync: SyncOptions::default(),
        }
    }
}

impl ClientConfig {
    /// Reads `TEAMDIR_*` variables from the process environment.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let endpoint = var("TEAMDIR_ENDPOINT").unwrap_or(defaults.endpoint);
        let request_timeout = match var("TEAMDIR_TIMEOUT_SECS") {
            Some(raw) => parse_secs("TEAMDIR_TIMEOUT_SECS", &raw)?,
            None => defaults.request_timeout,
        };
        let connect_timeout = match var("TEAMDIR_CONNECT_TIMEOUT_SECS") {
            Some(raw) => parse_secs("TEAMDIR_CONNECT_TIMEOUT_SECS", &raw)?,
            None => defaults.connect_timeout,
        };
        let optimistic_patch = var("TEAMDIR_OPTIMISTIC")
            .map(|val| matches!(val.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let column_mismatch = match var("TEAMDIR_CSV_MISMATCH").as_deref() {
            None | Some("pad") => ColumnMismatch::PadWithNull,
            Some("reject") => ColumnMismatch::RejectRow,
            Some(other) => {
                return Err(anyhow!(
                    "TEAMDIR_CSV_MISMATCH must be `pad` or `reject`, got `{}`",
                    other
                ));
            }
        };
        let invalid_id = match var("TEAMDIR_CSV_INVALID_ID").as_deref() {
            None | Some("reject") => InvalidId::RejectRow,
            Some("pass-through") => InvalidId::PassThrough,
            Some(other) => {
                return Err(anyhow!(
                    "TEAMDIR_CSV_INVALID_ID must be `reject` or `pass-through`, got `{}`",
                    other
                ));
            }
        };

        Ok(Self {
            endpoint,
            request_timeout,
            connect_timeout,
            sync: SyncOptions {
                optimistic_patch,
                import: ImportOptions {
                    column_mismatch,
                    invalid_id,
                },
            },
        })
    }
}

fn parse_secs(key: &str, raw: &str) -> Result<Duration> {
    let secs: u64 = raw
        .parse()
        .with_context(|| format!("{} must be a whole number of seconds", key))?;
    if secs == 0 {
        return Err(anyhow!("{} must be greater than zero", key));
    }
    Ok(Duration::from_secs(secs))
}
