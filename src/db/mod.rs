mod forums;
pub mod paging;
mod posts;
mod service;
mod threads;
mod users;

use sqlx::PgPool;

pub use paging::{Bound, Page};

/// Database connection wrapper
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Outcome of an insert guarded by a unique constraint.
///
/// `Existing` carries the row(s) that already held the key, so callers can
/// hand back the canonical resource instead of an opaque error.
#[derive(Debug, Clone, PartialEq)]
pub enum Created<T, E = T> {
    New(T),
    Existing(E),
}

impl<T, E> Created<T, E> {
    pub fn is_new(&self) -> bool {
        matches!(self, Created::New(_))
    }
}

impl<T> Created<T> {
    pub fn into_inner(self) -> T {
        match self {
            Created::New(value) | Created::Existing(value) => value,
        }
    }
}

/// SQLSTATE raised by the post path trigger when a parent lives in another thread
pub(crate) const PARENT_MISMATCH: &str = "FP001";

/// Name of the constraint a database error violated, if any
pub(crate) fn violated_constraint(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db_err) => db_err.constraint(),
        _ => None,
    }
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

pub(crate) fn has_sqlstate(err: &sqlx::Error, code: &str) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_accessors() {
        let fresh: Created<i32> = Created::New(1);
        let clash: Created<i32> = Created::Existing(2);

        assert!(fresh.is_new());
        assert!(!clash.is_new());
        assert_eq!(fresh.into_inner(), 1);
        assert_eq!(clash.into_inner(), 2);
    }

    #[test]
    fn test_non_database_errors_have_no_constraint() {
        let err = sqlx::Error::RowNotFound;
        assert_eq!(violated_constraint(&err), None);
        assert!(!is_unique_violation(&err));
        assert!(!has_sqlstate(&err, PARENT_MISMATCH));
    }
}
