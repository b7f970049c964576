//! TOML shape of the configuration file. Every key is optional; missing keys
//! fall back to the embedded default file.

use crate::repo::{DeleteMode, WriteMode};
use duration_str::deserialize_option_duration;
use serde::Deserialize;
use std::{path::PathBuf, time::Duration};

const DEFAULT_CONFIG_FILE: &str = include_str!("establishment.default.toml");

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    pub db: Option<Db>,
    pub log: Option<Log>,
    pub store: Option<Store>,
}

impl Config {
    pub fn embedded_default() -> Result<Self, toml::de::Error> {
        toml::from_str(DEFAULT_CONFIG_FILE)
    }

    /// Fills every key missing in `self` from `fallback`.
    pub fn or(self, fallback: Self) -> Self {
        Self {
            db: merge(self.db, fallback.db, Db::or),
            log: merge(self.log, fallback.log, Log::or),
            store: merge(self.store, fallback.store, Store::or),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Db {
    pub path: Option<PathBuf>,
    #[serde(default, deserialize_with = "deserialize_option_duration")]
    pub busy_timeout: Option<Duration>,
}

impl Db {
    fn or(self, fallback: Self) -> Self {
        Self {
            path: self.path.or(fallback.path),
            busy_timeout: self.busy_timeout.or(fallback.busy_timeout),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Log {
    pub level: Option<String>,
    pub dir: Option<PathBuf>,
}

impl Log {
    fn or(self, fallback: Self) -> Self {
        Self {
            level: self.level.or(fallback.level),
            dir: self.dir.or(fallback.dir),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Store {
    pub write_mode: Option<WriteMode>,
    pub delete_mode: Option<DeleteMode>,
    #[serde(default, deserialize_with = "deserialize_option_duration")]
    pub request_timeout: Option<Duration>,
}

impl Store {
    fn or(self, fallback: Self) -> Self {
        Self {
            write_mode: self.write_mode.or(fallback.write_mode),
            delete_mode: self.delete_mode.or(fallback.delete_mode),
            request_timeout: self.request_timeout.or(fallback.request_timeout),
        }
    }
}

fn merge<T>(value: Option<T>, fallback: Option<T>, or: fn(T, T) -> T) -> Option<T> {
    match (value, fallback) {
        (Some(value), Some(fallback)) => Some(or(value, fallback)),
        (value, fallback) => value.or(fallback),
    }
}
