use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{AppointmentStore, StoreError};
use crate::models::{Appointment, AppointmentId, NewAppointment, Reschedule};

/// Process-local store. Contents vanish on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<AppointmentId, Appointment>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl AppointmentStore for MemoryStore {
    async fn create(&self, appointment: NewAppointment) -> Result<AppointmentId, StoreError> {
        let id = AppointmentId::generate();
        let record = Appointment::new(id, appointment, Utc::now());
        self.records.write().await.insert(id, record);
        Ok(id)
    }

    async fn get(&self, id: AppointmentId) -> Result<Option<Appointment>, StoreError> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn exists(&self, id: AppointmentId) -> Result<bool, StoreError> {
        Ok(self.records.read().await.contains_key(&id))
    }

    async fn update(
        &self,
        id: AppointmentId,
        reschedule: &Reschedule,
    ) -> Result<bool, StoreError> {
        match self.records.write().await.get_mut(&id) {
            Some(record) => {
                record.apply(reschedule);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
    async fn create_then_get_echoes_fields() {
        let store = MemoryStore::new();
        let id = store.create(booking()).await.unwrap();

        let record = store.get(id).await.unwrap().unwrap();
        assert_eq!(record.id, id);
        assert_eq!(record.first_name, "Ann");
        assert_eq!(record.email, "a@x.com");
        assert!(store.exists(id).await.unwrap());
    }

    #[tokio::test]
    async fn ids_are_unique() {
        let store = MemoryStore::new();
        let first = store.create(booking()).await.unwrap();
        let second = store.create(booking()).await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn update_of_unknown_id_changes_nothing() {
        let store = MemoryStore::new();
        let id = store.create(booking()).await.unwrap();
        let reschedule = Reschedule {
            date: "2025-01-02".into(),
            time: "11:00".into(),
        };

        let updated = store
            .update(AppointmentId::generate(), &reschedule)
            .await
            .unwrap();
        assert!(!updated);
        assert_eq!(store.get(id).await.unwrap().unwrap().date, "2025-01-01");
    }
}
