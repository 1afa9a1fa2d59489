//! # Metered Decorators
//!
//! Wrap the dispatcher's store and messenger so bookings and confirmation
//! outcomes land in the Prometheus registry. The dispatcher itself stays
//! free of telemetry.

use async_trait::async_trait;
use bf_02_flow_dispatcher::{
    AppointmentRecord, AppointmentStore, ConfirmationMessenger, CustomerFields, CustomerHandle,
    MessagingError, NewAppointment, StoreError,
};
use booking_telemetry::{log_event, metric_inc, APPOINTMENTS_BOOKED, CONFIRMATIONS};
use chrono::NaiveDateTime;
use std::sync::Arc;

/// Counts successful appointment inserts.
pub struct MeteredStore {
    inner: Arc<dyn AppointmentStore>,
}

impl MeteredStore {
    /// Wrap a store.
    pub fn new(inner: Arc<dyn AppointmentStore>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl AppointmentStore for MeteredStore {
    async fn upsert_customer(
        &self,
        contact_id: &str,
        fields: CustomerFields,
    ) -> Result<CustomerHandle, StoreError> {
        self.inner.upsert_customer(contact_id, fields).await
    }

    async fn create_appointment(
        &self,
        appointment: NewAppointment,
    ) -> Result<AppointmentRecord, StoreError> {
        let result = self.inner.create_appointment(appointment).await;
        match &result {
            Ok(record) => {
                metric_inc!(APPOINTMENTS_BOOKED);
                log_event!(info, "store", "appointment created", reference = %record.reference);
            }
            Err(StoreError::Duplicate(existing)) => {
                log_event!(debug, "store", "duplicate booking", reference = %existing.reference);
            }
            Err(e) => log_event!(warn, "store", "appointment insert failed", error = %e),
        }
        result
    }

    async fn find_appointment(
        &self,
        contact_id: &str,
        scheduled_at: NaiveDateTime,
    ) -> Result<Option<AppointmentRecord>, StoreError> {
        self.inner.find_appointment(contact_id, scheduled_at).await
    }
}

/// Counts confirmation outcomes.
pub struct MeteredMessenger {
    inner: Arc<dyn ConfirmationMessenger>,
}

impl MeteredMessenger {
    /// Wrap a messenger.
    pub fn new(inner: Arc<dyn ConfirmationMessenger>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ConfirmationMessenger for MeteredMessenger {
    async fn send_confirmation(&self, contact_id: &str, text: &str) -> Result<(), MessagingError> {
        let result = self.inner.send_confirmation(contact_id, text).await;
        match &result {
            Ok(()) => metric_inc!(CONFIRMATIONS, &["sent"]),
            Err(e) => {
                metric_inc!(CONFIRMATIONS, &["failed"]);
                log_event!(warn, "messenger", "confirmation failed", error = %e);
            }
        }
        result
    }
}
