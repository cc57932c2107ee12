//! Persistence on libsql (local SQLite file, in-memory, or remote Turso).
//!
//! [`TursoClient`] owns the connection and exposes one method per storage
//! operation. Account methods live in `turso`, catalog documents in
//! `catalog`. List-valued fields are stored as JSON text columns.

#![allow(missing_docs)]

pub mod catalog;
pub mod provider;
pub mod turso;

pub use provider::DatabaseProvider;
pub use turso::TursoClient;
