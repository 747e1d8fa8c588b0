//! Database connection management and SeaORM entities.

mod connections;
pub mod entity;

pub use connections::{DatabaseConfig, connect};

use sea_orm::{DbErr, RuntimeErr, sqlx};

/// Whether `err` means the database could not be reached, as opposed to a
/// statement the database rejected.
///
/// A connection that drops mid-query surfaces as `DbErr::Query` wrapping an
/// sqlx I/O error, so the wrapped error is inspected too.
pub(crate) fn is_connection_failure(err: &DbErr) -> bool {
    match err {
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => true,
        DbErr::Query(RuntimeErr::SqlxError(e)) | DbErr::Exec(RuntimeErr::SqlxError(e)) => matches!(
            e,
            sqlx::Error::Io(_)
                | sqlx::Error::PoolTimedOut
                | sqlx::Error::PoolClosed
                | sqlx::Error::WorkerCrashed
        ),
        _ => false,
    }
}
