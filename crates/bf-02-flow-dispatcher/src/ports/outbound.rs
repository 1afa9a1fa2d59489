//! # Outbound Ports
//!
//! Traits for the dispatcher's collaborators: reference data, persistence,
//! messaging and the clock.

use crate::domain::{
    AppointmentRecord, CustomerFields, CustomerHandle, Location, MessagingError, NewAppointment,
    ServiceOffering, StoreError,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use parking_lot::Mutex;
use std::time::Duration;

/// Active services and locations.
#[async_trait]
pub trait ReferenceDataProvider: Send + Sync {
    /// Services that can be booked.
    async fn list_active_services(&self) -> Result<Vec<ServiceOffering>, StoreError>;

    /// Locations that take bookings.
    async fn list_active_locations(&self) -> Result<Vec<Location>, StoreError>;
}

/// Customer and appointment persistence.
///
/// Implementations must enforce uniqueness of `(contact_id, scheduled_at)`
/// atomically and answer a conflicting insert with
/// `StoreError::Duplicate(existing)`. A reference token already held by
/// another appointment is answered with `StoreError::ReferenceTaken`.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// Create or update the customer keyed by `contact_id`.
    async fn upsert_customer(
        &self,
        contact_id: &str,
        fields: CustomerFields,
    ) -> Result<CustomerHandle, StoreError>;

    /// Insert an appointment.
    async fn create_appointment(
        &self,
        appointment: NewAppointment,
    ) -> Result<AppointmentRecord, StoreError>;

    /// Existing appointment for a contact at a time, if any.
    async fn find_appointment(
        &self,
        contact_id: &str,
        scheduled_at: NaiveDateTime,
    ) -> Result<Option<AppointmentRecord>, StoreError>;
}

/// Sends the post-booking confirmation.
#[async_trait]
pub trait ConfirmationMessenger: Send + Sync {
    /// Send `text` to `contact_id`.
    async fn send_confirmation(&self, contact_id: &str, text: &str) -> Result<(), MessagingError>;
}

/// Time source trait for testability
pub trait TimeSource: Send + Sync {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// System time implementation
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Settable clock.
#[derive(Debug)]
pub struct FixedTimeSource {
    now: Mutex<DateTime<Utc>>,
}

impl FixedTimeSource {
    /// Clock frozen at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Move the clock.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    /// Advance by `millis`.
    pub fn advance_millis(&self, millis: i64) {
        let mut now = self.now.lock();
        *now += chrono::Duration::milliseconds(millis);
    }
}

impl TimeSource for FixedTimeSource {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Messenger that records what it was asked to send.
#[derive(Debug, Default)]
pub struct MockMessenger {
    /// `(contact_id, text)` pairs, in order.
    pub sent: Mutex<Vec<(String, String)>>,
    /// Fail every send?
    pub should_fail: bool,
    /// Sleep before answering.
    pub delay: Option<Duration>,
}

impl MockMessenger {
    /// Messenger that always fails.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Default::default()
        }
    }

    /// Messenger that answers after `delay`.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Default::default()
        }
    }

    /// Number of recorded sends.
    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }
}

#[async_trait]
impl ConfirmationMessenger for MockMessenger {
    async fn send_confirmation(&self, contact_id: &str, text: &str) -> Result<(), MessagingError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.should_fail {
            return Err(MessagingError::Transport("Mock failure".to_string()));
        }
        self.sent
            .lock()
            .push((contact_id.to_string(), text.to_string()));
        Ok(())
    }
}

/// Store that is down or slow.
#[derive(Debug, Default)]
pub struct UnavailableStore {
    /// Sleep before failing.
    pub delay: Option<Duration>,
}

#[async_trait]
impl AppointmentStore for UnavailableStore {
    async fn upsert_customer(
        &self,
        _contact_id: &str,
        _fields: CustomerFields,
    ) -> Result<CustomerHandle, StoreError> {
        self.fail().await
    }

    async fn create_appointment(
        &self,
        _appointment: NewAppointment,
    ) -> Result<AppointmentRecord, StoreError> {
        self.fail().await
    }

    async fn find_appointment(
        &self,
        _contact_id: &str,
        _scheduled_at: NaiveDateTime,
    ) -> Result<Option<AppointmentRecord>, StoreError> {
        self.fail().await
    }
}

impl UnavailableStore {
    async fn fail<T>(&self) -> Result<T, StoreError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Err(StoreError::Unavailable("Mock failure".to_string()))
    }
}
