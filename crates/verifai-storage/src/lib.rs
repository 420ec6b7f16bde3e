//! Persistence for verifications, chat history, settings, audit logs,
//! batch jobs and embedded knowledge base documents.
//!
//! [`store::VerifaiStore`] wraps a SeaORM connection pool (SQLite by
//! default). Schema is managed by the `migration` crate and applied on
//! connect.

pub mod entities;
pub mod error;
pub mod store;

#[cfg(test)]
mod tests;

pub use error::{Result, StorageError};
pub use store::{
    ActionCount, AuditLogFilter, AuditStats, BatchStats, DailyCount, StatusCounts, VectorRecord,
    VerificationFilter, VerifaiStore,
};
