use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool, sqlite::SqlitePoolOptions};
use tracing::instrument;

use super::{AppointmentStore, StoreError};
use crate::{
    configuration::SqliteSettings,
    models::{Appointment, AppointmentId, NewAppointment, Reschedule},
};

#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

#[derive(Debug, FromRow)]
struct AppointmentRow {
    id: String,
    first_name: String,
    last_name: String,
    time: String,
    date: String,
    phone: String,
    email: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = StoreError;

    fn try_from(row: AppointmentRow) -> Result<Self, Self::Error> {
        let id = AppointmentId::parse(&row.id).ok_or_else(|| StoreError::Corrupt {
            id: row.id.clone(),
            reason: "id is not a uuid".into(),
        })?;
        Ok(Appointment {
            id,
            first_name: row.first_name,
            last_name: row.last_name,
            time: row.time,
            date: row.date,
            phone: row.phone,
            email: row.email,
            created_at: row.created_at,
        })
    }
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens the database file and brings its schema up to date.
    #[instrument(name = "Opening sqlite store", skip(settings), fields(path = %settings.path.display()))]
    pub async fn connect(
        settings: &SqliteSettings,
        acquire_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .acquire_timeout(acquire_timeout)
            .connect_with(settings.connect_options())
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl AppointmentStore for SqliteStore {
    #[instrument(name = "Saving new appointment to sqlite", skip(self, appointment))]
    async fn create(&self, appointment: NewAppointment) -> Result<AppointmentId, StoreError> {
        let id = AppointmentId::generate();
        sqlx::query(
            "INSERT INTO appointments (id, first_name, last_name, time, date, phone, email, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(&appointment.first_name)
        .bind(&appointment.last_name)
        .bind(&appointment.time)
        .bind(&appointment.date)
        .bind(&appointment.phone)
        .bind(&appointment.email)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to execute query: {:?}", e);
            e
        })?;
        Ok(id)
    }

    #[instrument(name = "Fetching appointment from sqlite", skip(self))]
    async fn get(&self, id: AppointmentId) -> Result<Option<Appointment>, StoreError> {
        let row = sqlx::query_as::<_, AppointmentRow>(
            r#"SELECT id, first_name, last_name, time, date, phone, email, created_at
            FROM appointments
            WHERE id = ?"#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch appointment: {:?}", e);
            e
        })?;
        row.map(Appointment::try_from).transpose()
    }

    #[instrument(name = "Checking appointment exists in sqlite", skip(self))]
    async fn exists(&self, id: AppointmentId) -> Result<bool, StoreError> {
        let found = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM appointments WHERE id = ?)",
        )
        .bind(id.to_string())
        .fetch_one(&self.pool)
        .await?;
        Ok(found)
    }

    #[instrument(name = "Rescheduling appointment in sqlite", skip(self))]
    async fn update(
        &self,
        id: AppointmentId,
        reschedule: &Reschedule,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE appointments SET date = ?, time = ? WHERE id = ?")
            .bind(&reschedule.date)
            .bind(&reschedule.time)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update appointment: {:?}", e);
                e
            })?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn open_store(dir: &TempDir) -> SqliteStore {
        let settings = SqliteSettings {
            path: dir.path().join("appointments.db"),
            create_if_missing: true,
        };
        SqliteStore::connect(&settings, Duration::from_secs(2))
            .await
            .unwrap()
    }

    fn booking() -> NewAppointment {
        NewAppointment {
            first_name: "Ann".into(),
            last_name: "Lee".into(),
            time: "10:00".into(),
            date: "2025-01-01".into(),
            phone: "555-1234".into(),
            email: "a@x.com".into(),
        }
    }

    #[tokio::test]
    async fn create_get_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        let id = store.create(booking()).await.unwrap();
        let record = store.get(id).await.unwrap().unwrap();

        assert_eq!(record.id, id);
        assert_eq!(record.first_name, "Ann");
        assert_eq!(record.last_name, "Lee");
        assert_eq!(record.time, "10:00");
        assert_eq!(record.date, "2025-01-01");
        assert_eq!(record.phone, "555-1234");
        assert_eq!(record.email, "a@x.com");
    }

    #[tokio::test]
    async fn exists_reflects_created_records() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        let id = store.create(booking()).await.unwrap();
        assert!(store.exists(id).await.unwrap());
        assert!(!store.exists(AppointmentId::generate()).await.unwrap());
    }

    #[tokio::test]
    async fn update_changes_only_date_and_time() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;
        let id = store.create(booking()).await.unwrap();
        let before = store.get(id).await.unwrap().unwrap();

        let reschedule = Reschedule {
            date: "2025-01-02".into(),
            time: "11:00".into(),
        };
        assert!(store.update(id, &reschedule).await.unwrap());

        let after = store.get(id).await.unwrap().unwrap();
        assert_eq!(after.date, "2025-01-02");
        assert_eq!(after.time, "11:00");
        assert_eq!(after.first_name, before.first_name);
        assert_eq!(after.email, before.email);
        assert_eq!(after.created_at, before.created_at);
    }

    #[tokio::test]
    async fn update_of_missing_record_reports_false() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;
        let reschedule = Reschedule {
            date: "2025-01-02".into(),
            time: "11:00".into(),
        };

        let updated = store
            .update(AppointmentId::generate(), &reschedule)
            .await
            .unwrap();
        assert!(!updated);
    }

    #[tokio::test]
    async fn records_survive_reopening_the_file() {
        let dir = TempDir::new().unwrap();
        let id = open_store(&dir).await.create(booking()).await.unwrap();

        let reopened = open_store(&dir).await;
        assert!(reopened.exists(id).await.unwrap());
    }
}
