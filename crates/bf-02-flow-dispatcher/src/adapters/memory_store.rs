//! In-Memory Appointment Store
//!
//! Implements `AppointmentStore` with a single mutex so the uniqueness
//! checks (contact and time, reference token) and the insert are one
//! atomic step.

use crate::domain::{
    AppointmentHandle, AppointmentRecord, AppointmentStatus, CustomerFields, CustomerHandle,
    CustomerRecord, NewAppointment, ReferenceToken, StoreError,
};
use crate::ports::outbound::AppointmentStore;
use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use tracing::debug;
use uuid::Uuid;

#[derive(Default)]
struct StoreState {
    /// contact_id -> customer
    customers: HashMap<String, CustomerRecord>,
    /// (contact_id, scheduled_at) -> appointment
    appointments: HashMap<(String, NaiveDateTime), AppointmentRecord>,
    /// Tokens handed out so far
    references: HashSet<ReferenceToken>,
}

/// Process-local store. Data is lost on restart.
#[derive(Default)]
pub struct InMemoryAppointmentStore {
    state: Mutex<StoreState>,
}

impl InMemoryAppointmentStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored appointments.
    pub fn appointment_count(&self) -> usize {
        self.state.lock().appointments.len()
    }

    /// All appointments, oldest first.
    pub fn appointments(&self) -> Vec<AppointmentRecord> {
        let mut all: Vec<_> = self.state.lock().appointments.values().cloned().collect();
        all.sort_by_key(|a| a.created_at);
        all
    }

    /// Customer by contact id.
    pub fn customer(&self, contact_id: &str) -> Option<CustomerRecord> {
        self.state.lock().customers.get(contact_id).cloned()
    }
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn upsert_customer(
        &self,
        contact_id: &str,
        fields: CustomerFields,
    ) -> Result<CustomerHandle, StoreError> {
        let mut state = self.state.lock();
        let record = state
            .customers
            .entry(contact_id.to_string())
            .and_modify(|existing| {
                existing.display_name = fields.display_name.clone();
                existing.consent_at = fields.consent_at;
            })
            .or_insert_with(|| CustomerRecord {
                handle: CustomerHandle(Uuid::new_v4()),
                contact_id: contact_id.to_string(),
                display_name: fields.display_name.clone(),
                consent_at: fields.consent_at,
            });
        Ok(record.handle)
    }

    async fn create_appointment(
        &self,
        appointment: NewAppointment,
    ) -> Result<AppointmentRecord, StoreError> {
        let key = (appointment.contact_id.clone(), appointment.scheduled_at);
        let mut state = self.state.lock();

        if let Some(existing) = state.appointments.get(&key) {
            debug!(reference = %existing.reference, "duplicate appointment rejected");
            return Err(StoreError::Duplicate(Box::new(existing.clone())));
        }

        if state.references.contains(&appointment.reference) {
            debug!(reference = %appointment.reference, "reference token collision");
            return Err(StoreError::ReferenceTaken(appointment.reference));
        }

        let record = AppointmentRecord {
            handle: AppointmentHandle(Uuid::new_v4()),
            reference: appointment.reference,
            customer: appointment.customer,
            contact_id: appointment.contact_id,
            service_id: appointment.service_id,
            location_id: appointment.location_id,
            scheduled_at: appointment.scheduled_at,
            notes: appointment.notes,
            status: AppointmentStatus::Scheduled,
            created_at: Utc::now(),
        };
        state.references.insert(record.reference.clone());
        state.appointments.insert(key, record.clone());
        Ok(record)
    }

    async fn find_appointment(
        &self,
        contact_id: &str,
        scheduled_at: NaiveDateTime,
    ) -> Result<Option<AppointmentRecord>, StoreError> {
        Ok(self
            .state
            .lock()
            .appointments
            .get(&(contact_id.to_string(), scheduled_at))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ReferenceToken;
    use chrono::NaiveDate;

    fn when() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 9, 26)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn new_appointment(customer: CustomerHandle, token: &str) -> NewAppointment {
        appointment_for("+15550100", customer, token)
    }

    fn appointment_for(contact_id: &str, customer: CustomerHandle, token: &str) -> NewAppointment {
        NewAppointment {
            reference: ReferenceToken::parse(token).unwrap(),
            customer,
            contact_id: contact_id.into(),
            service_id: "haircut".into(),
            location_id: "downtown".into(),
            scheduled_at: when(),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_upsert_customer_keeps_handle() {
        let store = InMemoryAppointmentStore::new();
        let fields = |name: &str| CustomerFields {
            display_name: name.into(),
            consent_at: Utc::now(),
        };

        let first = store.upsert_customer("+15550100", fields("Ana")).await.unwrap();
        let second = store.upsert_customer("+15550100", fields("Ana Maria")).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.customer("+15550100").unwrap().display_name, "Ana Maria");
    }

    #[tokio::test]
    async fn test_create_then_find() {
        let store = InMemoryAppointmentStore::new();
        let customer = CustomerHandle(Uuid::new_v4());
        let created = store
            .create_appointment(new_appointment(customer, "APT-000001"))
            .await
            .unwrap();

        assert_eq!(created.status, AppointmentStatus::Scheduled);
        let found = store.find_appointment("+15550100", when()).await.unwrap();
        assert_eq!(found, Some(created));
        assert!(store.find_appointment("+15550199", when()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_returns_existing() {
        let store = InMemoryAppointmentStore::new();
        let customer = CustomerHandle(Uuid::new_v4());
        store
            .create_appointment(new_appointment(customer, "APT-000001"))
            .await
            .unwrap();

        match store
            .create_appointment(new_appointment(customer, "APT-000002"))
            .await
        {
            Err(StoreError::Duplicate(existing)) => {
                assert_eq!(existing.reference.as_str(), "APT-000001")
            }
            other => panic!("expected duplicate, got {other:?}"),
        }
        assert_eq!(store.appointment_count(), 1);
    }

    #[tokio::test]
    async fn test_reference_taken_by_other_contact() {
        let store = InMemoryAppointmentStore::new();
        let customer = CustomerHandle(Uuid::new_v4());
        store
            .create_appointment(appointment_for("+15550100", customer, "APT-000001"))
            .await
            .unwrap();

        let clash = store
            .create_appointment(appointment_for("+15550199", customer, "APT-000001"))
            .await;
        assert!(matches!(
            clash,
            Err(StoreError::ReferenceTaken(ref token)) if token.as_str() == "APT-000001"
        ));

        store
            .create_appointment(appointment_for("+15550199", customer, "APT-000002"))
            .await
            .unwrap();
        assert_eq!(store.appointment_count(), 2);
    }
}
