use std::{collections::HashMap, sync::LazyLock, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::{AsyncCommands, Client, Script};
use secrecy::ExposeSecret;
use tracing::instrument;

use super::{AppointmentStore, StoreError};
use crate::{
    configuration::RedisSettings,
    models::{Appointment, AppointmentId, NewAppointment, Reschedule},
};

pub type ConnectionPool = bb8::Pool<Client>;

// Only rewrites the hash when it already exists, so a reschedule never creates
// a half-filled record.
static RESCHEDULE: LazyLock<Script> = LazyLock::new(|| {
    Script::new(
        r"
        if redis.call('EXISTS', KEYS[1]) == 1 then
            redis.call('HSET', KEYS[1], 'date', ARGV[1], 'time', ARGV[2])
            return 1
        end
        return 0
        ",
    )
});

/// Key-value backend: one hash per appointment under `<key_prefix>:<id>`.
#[derive(Clone, Debug)]
pub struct RedisStore {
    redis_pool: ConnectionPool,
    key_prefix: String,
}

impl RedisStore {
    pub fn new(redis_pool: ConnectionPool, key_prefix: impl Into<String>) -> Self {
        Self {
            redis_pool,
            key_prefix: key_prefix.into(),
        }
    }

    #[instrument(name = "Connecting to redis store", skip(settings), fields(key_prefix = %settings.key_prefix))]
    pub async fn connect(
        settings: &RedisSettings,
        acquire_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = Client::open(settings.url.expose_secret())?;
        let redis_pool = bb8::Pool::builder()
            .connection_timeout(acquire_timeout)
            .build(client)
            .await?;
        {
            // ping the server before accepting traffic
            let mut conn = redis_pool.get().await?;
            let _: String = redis::cmd("PING").query_async(&mut *conn).await?;
        }
        Ok(Self::new(redis_pool, settings.key_prefix.clone()))
    }

    fn key(&self, id: AppointmentId) -> String {
        format!("{}:{}", self.key_prefix, id)
    }
}

#[async_trait]
impl AppointmentStore for RedisStore {
    #[instrument(name = "Saving new appointment to redis", skip(self, appointment))]
    async fn create(&self, appointment: NewAppointment) -> Result<AppointmentId, StoreError> {
        let id = AppointmentId::generate();
        let record = Appointment::new(id, appointment, Utc::now());

        let mut conn = self.redis_pool.get().await?;
        let _: () = conn
            .hset_multiple(self.key(id), &to_hash(&record))
            .await
            .map_err(|e| {
                tracing::error!("Failed to write appointment hash: {:?}", e);
                e
            })?;
        Ok(id)
    }

    #[instrument(name = "Fetching appointment from redis", skip(self))]
    async fn get(&self, id: AppointmentId) -> Result<Option<Appointment>, StoreError> {
        let mut conn = self.redis_pool.get().await?;
        let fields: HashMap<String, String> = conn.hgetall(self.key(id)).await?;
        if fields.is_empty() {
            return Ok(None);
        }
        from_hash(id, fields).map(Some)
    }

    #[instrument(name = "Checking appointment exists in redis", skip(self))]
    async fn exists(&self, id: AppointmentId) -> Result<bool, StoreError> {
        let mut conn = self.redis_pool.get().await?;
        Ok(conn.exists(self.key(id)).await?)
    }

    #[instrument(name = "Rescheduling appointment in redis", skip(self))]
    async fn update(
        &self,
        id: AppointmentId,
        reschedule: &Reschedule,
    ) -> Result<bool, StoreError> {
        let mut conn = self.redis_pool.get().await?;
        let updated: i64 = RESCHEDULE
            .key(self.key(id))
            .arg(&reschedule.date)
            .arg(&reschedule.time)
            .invoke_async(&mut *conn)
            .await
            .map_err(|e| {
                tracing::error!("Failed to run reschedule script: {:?}", e);
                e
            })?;
        Ok(updated == 1)
    }
}

fn to_hash(record: &Appointment) -> [(&'static str, String); 7] {
    [
        ("firstName", record.first_name.clone()),
        ("lastName", record.last_name.clone()),
        ("time", record.time.clone()),
        ("date", record.date.clone()),
        ("phone", record.phone.clone()),
        ("email", record.email.clone()),
        ("createdAt", record.created_at.to_rfc3339()),
    ]
}

fn from_hash(
    id: AppointmentId,
    mut fields: HashMap<String, String>,
) -> Result<Appointment, StoreError> {
    let corrupt = |reason: String| StoreError::Corrupt {
        id: id.to_string(),
        reason,
    };
    let mut take = |name: &str| {
        fields
            .remove(name)
            .ok_or_else(|| corrupt(format!("missing field `{name}`")))
    };

    let first_name = take("firstName")?;
    let last_name = take("lastName")?;
    let time = take("time")?;
    let date = take("date")?;
    let phone = take("phone")?;
    let email = take("email")?;
    let created_at = DateTime::parse_from_rfc3339(&take("createdAt")?)
        .map_err(|e| corrupt(format!("bad createdAt: {e}")))?
        .with_timezone(&Utc);

    Ok(Appointment {
        id,
        first_name,
        last_name,
        time,
        date,
        phone,
        email,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> Appointment {
        Appointment::new(
            AppointmentId::generate(),
            NewAppointment {
                first_name: "Ann".into(),
                last_name: "Lee".into(),
                time: "10:00".into(),
                date: "2025-01-01".into(),
                phone: "555-1234".into(),
                email: "a@x.com".into(),
            },
            Utc::now(),
        )
    }

    fn as_map(record: &Appointment) -> HashMap<String, String> {
        to_hash(record)
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v))
            .collect()
    }

    #[test]
    fn hash_decodes_back_to_the_record() {
        let record = record();
        let decoded = from_hash(record.id, as_map(&record)).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn missing_hash_field_is_reported_as_corrupt() {
        let record = record();
        let mut fields = as_map(&record);
        fields.remove("phone");

        let err = from_hash(record.id, fields).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { ref reason, .. } if reason.contains("phone")));
    }

    #[test]
    fn unparseable_timestamp_is_reported_as_corrupt() {
        let record = record();
        let mut fields = as_map(&record);
        fields.insert("createdAt".into(), "yesterday".into());

        assert!(matches!(
            from_hash(record.id, fields),
            Err(StoreError::Corrupt { .. })
        ));
    }

    // Needs a running server: REDIS_URL=redis://127.0.0.1:6379 cargo test -- --ignored
    #[tokio::test]
    #[ignore]
    async fn live_round_trip_and_reschedule() {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into());
        let settings = RedisSettings {
            url: url.into(),
            key_prefix: format!("appointments-test-{}", std::process::id()),
        };
        let store = RedisStore::connect(&settings, Duration::from_secs(2))
            .await
            .unwrap();

        let original = record();
        let new = NewAppointment {
            first_name: original.first_name.clone(),
            last_name: original.last_name.clone(),
            time: original.time.clone(),
            date: original.date.clone(),
            phone: original.phone.clone(),
            email: original.email.clone(),
        };
        let id = store.create(new).await.unwrap();
        assert!(store.exists(id).await.unwrap());

        let reschedule = Reschedule {
            date: "2025-01-02".into(),
            time: "11:00".into(),
        };
        assert!(store.update(id, &reschedule).await.unwrap());
        assert!(
            !store
                .update(AppointmentId::generate(), &reschedule)
                .await
                .unwrap()
        );

        let stored = store.get(id).await.unwrap().unwrap();
        assert_eq!(stored.date, "2025-01-02");
        assert_eq!(stored.first_name, "Ann");
    }
}
