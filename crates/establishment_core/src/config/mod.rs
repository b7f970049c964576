//! Runtime configuration.
//!
//! # Responsibility
//! - Load `establishment.toml` (or a caller-provided file) on top of the
//!   embedded defaults.
//! - Convert the raw TOML shape into typed settings for db, logging and
//!   stores.
//!
//! # Invariants
//! - A missing configuration file is not an error; defaults apply.
//! - `ESTABLISHMENT_DB_PATH` wins over any file value for `db.path`.

use crate::repo::{Deadline, StoreOptions};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::{
    env, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

mod raw;

const DEFAULT_CONFIG_FILE_NAME: &str = "establishment.toml";

pub const ENV_NAME_DB_PATH: &str = "ESTABLISHMENT_DB_PATH";

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    /// A key parsed but holds an unusable value.
    Invalid { key: &'static str, message: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
            Self::Invalid { key, message } => write!(f, "invalid config value for `{key}`: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid { .. } => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub db: DbConfig,
    pub log: LogConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DbConfig {
    /// SQLite file; `None` opens an in-memory database.
    pub path: Option<PathBuf>,
    pub busy_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    pub level: String,
    /// Rolling log directory; logging is not initialised when unset.
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    pub options: StoreOptions,
    pub request_timeout: Option<Duration>,
}

impl StoreConfig {
    /// Deadline for one operation starting now.
    pub fn deadline(&self) -> Deadline {
        Deadline::from_timeout(self.request_timeout)
    }
}

impl Config {
    pub fn try_load_from_file_or_default<P: AsRef<Path>>(file_path: Option<P>) -> ConfigResult<Self> {
        let file_path: &Path = file_path.as_ref().map(|p| p.as_ref()).unwrap_or_else(|| {
            log::info!("event=config_load module=config status=default file={DEFAULT_CONFIG_FILE_NAME}");
            Path::new(DEFAULT_CONFIG_FILE_NAME)
        });

        let mut cfg = match fs::read_to_string(file_path) {
            Ok(cfg_string) => Self::from_toml_str(&cfg_string)?,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                log::info!(
                    "event=config_load module=config status=fallback file={} reason=not_found",
                    file_path.display()
                );
                Self::try_default()?
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: file_path.to_path_buf(),
                    source,
                })
            }
        };

        cfg.override_db_path(env::var(ENV_NAME_DB_PATH).ok());
        Ok(cfg)
    }

    /// Parses a TOML document on top of the embedded defaults.
    pub fn from_toml_str(input: &str) -> ConfigResult<Self> {
        let user: raw::Config = toml::from_str(input)?;
        Self::try_from(user.or(raw::Config::embedded_default()?))
    }

    /// Embedded defaults only.
    pub fn try_default() -> ConfigResult<Self> {
        Self::try_from(raw::Config::embedded_default()?)
    }

    /// Replaces `db.path` when `path` is set and non-blank.
    pub fn override_db_path(&mut self, path: Option<String>) {
        if let Some(path) = path.filter(|path| !path.trim().is_empty()) {
            self.db.path = Some(PathBuf::from(path));
        }
    }
}

impl TryFrom<raw::Config> for Config {
    type Error = ConfigError;

    fn try_from(from: raw::Config) -> ConfigResult<Self> {
        let raw::Config { db, log, store } = from;

        let raw::Db { path, busy_timeout } = db.unwrap_or_default();
        let db = DbConfig {
            path,
            busy_timeout: busy_timeout.ok_or_else(|| missing("db.busy-timeout"))?,
        };

        let raw::Log { level, dir } = log.unwrap_or_default();
        let level = level.unwrap_or_else(|| crate::logging::default_log_level().to_string());
        let level = crate::logging::normalize_level(&level)
            .map_err(|message| ConfigError::Invalid {
                key: "log.level",
                message,
            })?
            .to_string();
        if let Some(dir) = dir.as_ref().filter(|dir| !dir.is_absolute()) {
            return Err(ConfigError::Invalid {
                key: "log.dir",
                message: format!("must be an absolute path, got `{}`", dir.display()),
            });
        }
        let log = LogConfig { level, dir };

        let raw::Store {
            write_mode,
            delete_mode,
            request_timeout,
        } = store.unwrap_or_default();
        let store = StoreConfig {
            options: StoreOptions {
                write_mode: write_mode.unwrap_or_default(),
                delete_mode: delete_mode.unwrap_or_default(),
            },
            request_timeout,
        };

        Ok(Self { db, log, store })
    }
}

fn missing(key: &'static str) -> ConfigError {
    ConfigError::Invalid {
        key,
        message: "missing value".to_string(),
    }
}
