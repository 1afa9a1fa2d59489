//! # Flow Dispatcher Service
//!
//! Implements `FlowExchangeApi`: runs the pure screen machine, then
//! executes booking plans against the outbound ports.
//!
//! ## Booking steps (SUMMARY with both consents)
//!
//! 1. Look up an existing appointment for `(phone, when)`; reuse it if found
//! 2. Upsert the customer with the consent timestamp
//! 3. Create the appointment; a store-level duplicate resolves to the existing
//!    record, a taken reference token is retried with the next token
//! 4. Send the confirmation (bounded, best effort) on its own task
//!
//! Each of the three store stages runs under `persistence_timeout`. The
//! confirmation task outlives a cancelled request.

use crate::algorithms::{
    confirmation_text, initial_screen, needs_catalog, persistence_failure_response,
    success_response, transition, BookingPlan, CatalogSnapshot, Transition,
};
use crate::domain::{
    AppointmentRecord, CustomerFields, DecryptedRequest, DispatchError, DispatcherConfig,
    FlowResponse, NewAppointment, ReferenceToken, StoreError,
};
use crate::ports::inbound::FlowExchangeApi;
use crate::ports::outbound::{
    AppointmentStore, ConfirmationMessenger, ReferenceDataProvider, TimeSource,
};
use async_trait::async_trait;
use chrono::{FixedOffset, NaiveDate};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn, Instrument};

/// Reference tokens tried before a booking gives up.
const MAX_REFERENCE_ATTEMPTS: u32 = 5;

/// Result of the persistence steps.
struct Booking {
    record: AppointmentRecord,
    /// False when an existing booking was reused.
    created: bool,
}

/// The flow dispatcher.
///
/// Holds only shared port handles; every request is independent.
pub struct FlowDispatcher {
    config: DispatcherConfig,
    catalog: Arc<dyn ReferenceDataProvider>,
    store: Arc<dyn AppointmentStore>,
    messenger: Arc<dyn ConfirmationMessenger>,
    clock: Arc<dyn TimeSource>,
}

impl FlowDispatcher {
    /// Create a dispatcher with the given collaborators.
    pub fn new(
        config: DispatcherConfig,
        catalog: Arc<dyn ReferenceDataProvider>,
        store: Arc<dyn AppointmentStore>,
        messenger: Arc<dyn ConfirmationMessenger>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            config,
            catalog,
            store,
            messenger,
            clock,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    async fn load_catalog(&self) -> Result<CatalogSnapshot, DispatchError> {
        let lookup = async {
            tokio::try_join!(
                self.catalog.list_active_services(),
                self.catalog.list_active_locations()
            )
        };

        let timeout = self.config.reference_timeout();
        match tokio::time::timeout(timeout, lookup).await {
            Ok(Ok((services, locations))) => Ok(CatalogSnapshot::new(services, locations)),
            Ok(Err(e)) => Err(DispatchError::ReferenceData(e.to_string())),
            Err(_) => Err(DispatchError::Timeout {
                operation: "reference_data",
                timeout_ms: millis(timeout),
            }),
        }
    }

    /// Reference data for summaries; raw ids are shown if it is unavailable.
    async fn catalog_or_empty(&self) -> CatalogSnapshot {
        self.load_catalog().await.unwrap_or_else(|e| {
            warn!(error = %e, "reference data unavailable, summaries use raw ids");
            CatalogSnapshot::default()
        })
    }

    async fn book(&self, plan: BookingPlan) -> FlowResponse {
        match self.persist(&plan).await {
            Ok(booking) => {
                if booking.created {
                    info!(reference = %booking.record.reference, "appointment booked");
                    self.send_confirmation(&plan, &booking.record.reference).await;
                } else {
                    info!(
                        reference = %booking.record.reference,
                        "repeat submission, returning existing booking"
                    );
                }
                success_response(&booking.record.reference, &plan.appointment_summary)
            }
            Err(e) => {
                warn!(error = %e, "booking not persisted");
                persistence_failure_response(&plan)
            }
        }
    }

    async fn persist(&self, plan: &BookingPlan) -> Result<Booking, DispatchError> {
        let contact_id = plan.contact.phone.as_str();
        let scheduled_at = plan.selection.scheduled_at();

        let existing = self
            .bounded(
                "find_appointment",
                self.store.find_appointment(contact_id, scheduled_at),
            )
            .await?;
        if let Some(record) = existing {
            return Ok(Booking {
                record,
                created: false,
            });
        }

        let now = self.clock.now();
        let customer = self
            .bounded(
                "upsert_customer",
                self.store.upsert_customer(
                    contact_id,
                    CustomerFields {
                        display_name: plan.contact.name.clone(),
                        consent_at: now,
                    },
                ),
            )
            .await?;

        let create = async {
            let mut reference = ReferenceToken::from_clock(now);
            let mut attempts = 1;
            loop {
                let appointment = NewAppointment {
                    reference: reference.clone(),
                    customer,
                    contact_id: contact_id.to_string(),
                    service_id: plan.selection.service.clone(),
                    location_id: plan.selection.location.clone(),
                    scheduled_at,
                    notes: plan.contact.notes.clone(),
                };

                match self.store.create_appointment(appointment).await {
                    Err(StoreError::ReferenceTaken(taken)) if attempts < MAX_REFERENCE_ATTEMPTS => {
                        debug!(reference = %taken, attempts, "reference token taken, trying the next one");
                        reference = taken.successor();
                        attempts += 1;
                    }
                    other => return other,
                }
            }
        };

        match self.bounded("create_appointment", create).await {
            Ok(record) => Ok(Booking {
                record,
                created: true,
            }),
            Err(DispatchError::Persistence(StoreError::Duplicate(existing))) => Ok(Booking {
                record: *existing,
                created: false,
            }),
            Err(e) => Err(e),
        }
    }

    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T, DispatchError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        let timeout = self.config.persistence_timeout();
        match tokio::time::timeout(timeout, call).await {
            Ok(result) => result.map_err(DispatchError::from),
            Err(_) => Err(DispatchError::Timeout {
                operation,
                timeout_ms: millis(timeout),
            }),
        }
    }

    async fn send_confirmation(&self, plan: &BookingPlan, reference: &ReferenceToken) {
        let text = confirmation_text(&plan.contact, &plan.appointment_summary, reference);
        let contact_id = plan.contact.phone.clone();
        let reference = reference.clone();
        let messenger = Arc::clone(&self.messenger);
        let timeout = self.config.messaging_timeout();

        // Spawned so that dropping the request future leaves the send running.
        let send = tokio::spawn(
            async move {
                match tokio::time::timeout(timeout, messenger.send_confirmation(&contact_id, &text))
                    .await
                {
                    Ok(Ok(())) => debug!(%reference, "confirmation sent"),
                    Ok(Err(e)) => warn!(%reference, error = %e, "confirmation failed"),
                    Err(_) => warn!(
                        %reference,
                        timeout_ms = millis(timeout),
                        "confirmation timed out"
                    ),
                }
            }
            .in_current_span(),
        );

        if let Err(e) = send.await {
            warn!(error = %e, "confirmation task aborted");
        }
    }

    fn local_today(&self) -> NaiveDate {
        let now = self.clock.now();
        match FixedOffset::east_opt(self.config.utc_offset_minutes * 60) {
            Some(offset) => now.with_timezone(&offset).date_naive(),
            None => now.date_naive(),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[async_trait]
impl FlowExchangeApi for FlowDispatcher {
    async fn dispatch(&self, request: DecryptedRequest) -> FlowResponse {
        debug!(
            action = %request.action,
            screen = request.screen.as_deref().unwrap_or("-"),
            version = %request.version,
            "dispatching flow request"
        );

        let catalog = if needs_catalog(&request) {
            self.catalog_or_empty().await
        } else {
            CatalogSnapshot::default()
        };

        match transition(&request, &catalog) {
            Transition::Respond(response) => response,
            Transition::Book(plan) => self.book(plan).await,
        }
    }

    async fn initial_screen(&self) -> Result<FlowResponse, DispatchError> {
        let catalog = self.load_catalog().await?;
        Ok(initial_screen(
            &catalog,
            self.local_today(),
            self.config.booking_horizon_days,
            &self.config.time_slots,
        ))
    }
}
