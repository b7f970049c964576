//! Repository error taxonomy.
//!
//! Callers above the store only distinguish "not found" from everything
//! else; see [`RepoError::is_not_found`].

use crate::db::DbError;
use crate::model::category::Category;
use crate::model::establishment::{EstablishmentId, EstablishmentValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Stage of a single statement at which the backend reported a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementPhase {
    /// Building the statement (SQL prepare).
    Prepare,
    /// Running the statement or stepping its rows.
    Execute,
    /// Reading columns out of a returned row.
    Scan,
}

impl Display for StatementPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Prepare => "prepare",
            Self::Execute => "execute",
            Self::Scan => "scan",
        })
    }
}

/// Error for establishment persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(EstablishmentValidationError),
    Db(DbError),
    /// A statement failed; `step` names the logical step of the operation.
    Persistence {
        step: &'static str,
        phase: StatementPhase,
        source: DbError,
    },
    /// No active entity row for the id (also zero-row update/delete).
    NotFound {
        category: Category,
        id: EstablishmentId,
    },
    /// Entity exists but its active location row is missing.
    LocationNotFound {
        category: Category,
        establishment_id: EstablishmentId,
    },
    /// No active row in a review/favourite table.
    RecordNotFound { table: &'static str, id: Uuid },
    /// The caller's deadline passed before `step` could run.
    DeadlineExceeded { step: &'static str },
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    InvalidData(String),
}

impl RepoError {
    /// Returns whether this error means "the requested row does not exist".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::LocationNotFound { .. } | Self::RecordNotFound { .. }
        )
    }

    pub(crate) fn persistence(
        step: &'static str,
        phase: StatementPhase,
        source: rusqlite::Error,
    ) -> Self {
        Self::Persistence {
            step,
            phase,
            source: DbError::Sqlite(source),
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Persistence {
                step,
                phase,
                source,
            } => write!(f, "failed to {phase} statement for {step}: {source}"),
            Self::NotFound { category, id } => write!(f, "{category} not found: {id}"),
            Self::LocationNotFound {
                category,
                establishment_id,
            } => write!(f, "location not found for {category} {establishment_id}"),
            Self::RecordNotFound { table, id } => write!(f, "no active row in {table}: {id}"),
            Self::DeadlineExceeded { step } => write!(f, "deadline exceeded before {step}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Persistence { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<EstablishmentValidationError> for RepoError {
    fn from(value: EstablishmentValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
