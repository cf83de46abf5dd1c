//! Appointment persistence behind a single trait with swappable backends.

pub mod memory;
pub mod redis_store;
pub mod sqlite;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Appointment, AppointmentId, NewAppointment, Reschedule};

pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite query failed")]
    Sqlite(#[from] sqlx::Error),

    #[error("sqlite migration failed")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("redis command failed")]
    Redis(#[from] redis::RedisError),

    #[error("could not get a redis connection from the pool")]
    Pool(#[from] bb8::RunError<redis::RedisError>),

    #[error("stored appointment {id} is corrupt: {reason}")]
    Corrupt { id: String, reason: String },
}

/// Capability set every backend provides. Records are never deleted or enumerated.
#[async_trait]
pub trait AppointmentStore: Send + Sync + std::fmt::Debug {
    /// Persists a validated booking under a freshly generated id.
    async fn create(&self, appointment: NewAppointment) -> Result<AppointmentId, StoreError>;

    async fn get(&self, id: AppointmentId) -> Result<Option<Appointment>, StoreError>;

    async fn exists(&self, id: AppointmentId) -> Result<bool, StoreError>;

    /// Overwrites date and time in place. Returns `false` when no record matches.
    async fn update(&self, id: AppointmentId, reschedule: &Reschedule)
    -> Result<bool, StoreError>;
}
