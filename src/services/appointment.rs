use std::sync::Arc;

use tracing::instrument;

use crate::{
    errors::AppointmentError,
    models::{Appointment, AppointmentFields, AppointmentId, NewAppointment, RescheduleFields},
    store::{AppointmentStore, StoreError},
};

#[derive(Clone, Debug)]
pub struct AppointmentService {
    store: Arc<dyn AppointmentStore>,
}

impl AppointmentService {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self { store }
    }

    #[instrument(name = "Service: Create appointment", skip(self, fields))]
    pub async fn create(
        &self,
        fields: AppointmentFields,
    ) -> Result<AppointmentId, AppointmentError> {
        let appointment = NewAppointment::parse(fields).inspect_err(|e| {
            tracing::warn!("Rejected booking: {}", e);
        })?;

        let id = self.store.create(appointment).await.map_err(store_failure)?;
        tracing::info!(appointment_id = %id, "Appointment created");
        Ok(id)
    }

    /// Malformed ids resolve to `NotFound`, never to an error of their own.
    #[instrument(name = "Service: Get appointment", skip(self))]
    pub async fn get(&self, raw_id: &str) -> Result<Appointment, AppointmentError> {
        let id = AppointmentId::parse(raw_id).ok_or(AppointmentError::NotFound)?;
        self.store
            .get(id)
            .await
            .map_err(store_failure)?
            .ok_or(AppointmentError::NotFound)
    }

    #[instrument(name = "Service: Verify appointment", skip(self))]
    pub async fn exists(&self, raw_id: &str) -> Result<bool, AppointmentError> {
        match AppointmentId::parse(raw_id) {
            Some(id) => self.store.exists(id).await.map_err(store_failure),
            None => Ok(false),
        }
    }

    #[instrument(name = "Service: Reschedule appointment", skip(self))]
    pub async fn reschedule(&self, fields: RescheduleFields) -> Result<(), AppointmentError> {
        let (raw_id, reschedule) = fields.parse()?;
        let id = AppointmentId::parse(&raw_id).ok_or(AppointmentError::NotFound)?;

        if self
            .store
            .update(id, &reschedule)
            .await
            .map_err(store_failure)?
        {
            tracing::info!(appointment_id = %id, "Appointment rescheduled");
            Ok(())
        } else {
            tracing::warn!(appointment_id = %id, "Reschedule target does not exist");
            Err(AppointmentError::NotFound)
        }
    }
}

fn store_failure(e: StoreError) -> AppointmentError {
    tracing::error!("Store operation failed: {:?}", e);
    AppointmentError::Store(e)
}
