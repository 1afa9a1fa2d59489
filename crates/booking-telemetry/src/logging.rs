//! Structured log helpers.
//!
//! Every event carries a `component` field naming the part of the service
//! that emitted it (`codec`, `dispatcher`, `gateway`, `runtime`), so JSON
//! logs can be filtered per component without parsing targets.

/// Emit a tracing event tagged with a component.
///
/// ```rust,ignore
/// use booking_telemetry::log_event;
///
/// log_event!(warn, "gateway", "Envelope rejected", class = "key_unwrap");
/// ```
#[macro_export]
macro_rules! log_event {
    (info, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };

    (warn, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::warn!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };

    (error, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::error!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };

    (debug, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::debug!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a flow exchange with the screen it moved to.
#[macro_export]
macro_rules! log_flow_event {
    ($level:ident, $msg:expr, $screen:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = "dispatcher",
            screen = %$screen,
            $($($field)*,)?
            $msg
        )
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_macros_expand_without_subscriber() {
        log_event!(info, "gateway", "started");
        log_event!(warn, "codec", "rejected", class = "key_unwrap");
        log_event!(error, "runtime", "failed", attempt = 2u32);
        log_event!(debug, "dispatcher", "dispatching");
        log_flow_event!(info, "transition", "SUMMARY", booked = false);
    }
}
