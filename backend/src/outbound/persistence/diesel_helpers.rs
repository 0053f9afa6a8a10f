//! Shared helpers for Diesel repository implementations.
//!
//! Repositories classify pool and Diesel failures through [`DbFailure`] and
//! then map the classification onto their own port error, so the logging and
//! constraint inspection live in one place.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;

/// Storage failure reduced to what repositories need to distinguish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DbFailure {
    /// The database could not be reached or dropped the connection.
    Connection(String),
    /// A unique constraint rejected the write.
    UniqueViolation { constraint: Option<String> },
    /// Any other query failure.
    Query(String),
}

impl DbFailure {
    /// True when the violated constraint name mentions `column`.
    pub(crate) fn violates(&self, column: &str) -> bool {
        matches!(
            self,
            Self::UniqueViolation { constraint: Some(name) } if name.contains(column)
        )
    }
}

impl From<PoolError> for DbFailure {
    fn from(error: PoolError) -> Self {
        match error {
            PoolError::Checkout { message } | PoolError::Build { message } => {
                Self::Connection(message)
            }
        }
    }
}

impl From<DieselError> for DbFailure {
    fn from(error: DieselError) -> Self {
        match &error {
            DieselError::DatabaseError(kind, info) => {
                debug!(
                    ?kind,
                    message = info.message(),
                    constraint = info.constraint_name(),
                    "diesel operation failed"
                );
            }
            _ => debug!(
                error_type = %std::any::type_name_of_val(&error),
                "diesel operation failed"
            ),
        }

        match error {
            DieselError::NotFound => Self::Query("record not found".to_owned()),
            DieselError::QueryBuilderError(_) => Self::Query("database query error".to_owned()),
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                Self::UniqueViolation {
                    constraint: info.constraint_name().map(str::to_owned),
                }
            }
            DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
                Self::Connection("database connection error".to_owned())
            }
            DieselError::DatabaseError(DatabaseErrorKind::CheckViolation, info) => {
                Self::Query(format!("check constraint violated: {}", info.message()))
            }
            DieselError::DatabaseError(_, _) => Self::Query("database error".to_owned()),
            _ => Self::Query("database error".to_owned()),
        }
    }
}

/// Collect row conversion results, mapping the first error through `map_err`.
pub(crate) fn collect_rows<T, E>(
    results: impl Iterator<Item = Result<T, String>>,
    map_err: impl FnOnce(String) -> E,
) -> Result<Vec<T>, E> {
    results.collect::<Result<Vec<_>, _>>().map_err(map_err)
}
