//! Flow Gateway service: router, handlers and server lifecycle.

use crate::domain::{FlowError, FlowOutcome, GatewayConfig, GatewayError};
use crate::middleware::{GatewayMetrics, RequestTimer, SignatureLayer, TimeoutLayer, TracingLayer};
use crate::ports::ChatEventSink;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bf_01_envelope_codec::{
    decrypt_envelope, encrypt_response, CodecError, DecryptedEnvelope, EncryptedEnvelope,
    PrivateKeyMaterial,
};
use bf_02_flow_dispatcher::{FlowExchangeApi, FlowResponse, Screen};
use booking_telemetry::log_event;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{debug, info};

/// Flow Gateway service state
pub struct FlowGatewayService {
    config: GatewayConfig,
    state: AppState,
}

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    private_key: Arc<PrivateKeyMaterial>,
    dispatcher: Arc<dyn FlowExchangeApi>,
    chat_sink: Arc<dyn ChatEventSink>,
    metrics: Arc<GatewayMetrics>,
}

impl FlowGatewayService {
    /// Create a new Flow Gateway service
    pub fn new(
        config: GatewayConfig,
        private_key: Arc<PrivateKeyMaterial>,
        dispatcher: Arc<dyn FlowExchangeApi>,
        chat_sink: Arc<dyn ChatEventSink>,
    ) -> Result<Self, GatewayError> {
        config
            .validate()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        Ok(Self {
            config,
            state: AppState {
                private_key,
                dispatcher,
                chat_sink,
                metrics: Arc::new(GatewayMetrics::new()),
            },
        })
    }

    /// Get metrics
    pub fn metrics(&self) -> Arc<GatewayMetrics> {
        Arc::clone(&self.state.metrics)
    }

    /// Bind the configured HTTP address.
    pub async fn bind(&self) -> Result<TcpListener, GatewayError> {
        let addr = self.config.http_addr();
        TcpListener::bind(addr)
            .await
            .map_err(|e| GatewayError::Bind(format!("{addr}: {e}")))
    }

    /// Serve on `listener` until `shutdown` resolves, then drain in-flight
    /// requests.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local_addr: Option<SocketAddr> = listener.local_addr().ok();
        info!(addr = ?local_addr, "Starting Flow Gateway");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| GatewayError::Serve(e.to_string()))?;

        info!("Flow Gateway stopped");
        Ok(())
    }

    /// Bind and serve until `shutdown` resolves.
    pub async fn run<F>(&self, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = self.bind().await?;
        self.serve(listener, shutdown).await
    }

    /// Build the HTTP router with its middleware stack.
    pub fn router(&self) -> Router {
        let max_body_bytes = self.config.limits.max_body_bytes;

        let flow_route = post(handle_flow).layer(SignatureLayer::new(
            self.config.security.app_secret.as_deref(),
            max_body_bytes,
            Arc::clone(&self.state.metrics),
        ));

        let middleware = ServiceBuilder::new()
            .layer(RequestBodyLimitLayer::new(max_body_bytes))
            .layer(TracingLayer::new())
            .layer(TimeoutLayer::new(
                self.config.request_timeout(),
                Arc::clone(&self.state.metrics),
            ));

        Router::new()
            .route("/flow", flow_route)
            .route("/flow/initial-screen", get(handle_initial_screen))
            .route("/health", get(health_check))
            .route("/metrics", get(metrics_json))
            .route("/metrics/prometheus", get(metrics_prometheus))
            .layer(middleware)
            .with_state(self.state.clone())
    }
}

/// `POST /flow`: encrypted flow exchange, or a plain chat event.
async fn handle_flow(State(state): State<AppState>, body: Bytes) -> Result<Response, FlowError> {
    let value: serde_json::Value =
        serde_json::from_slice(&body).map_err(|e| FlowError::InvalidBody(e.to_string()))?;

    if !EncryptedEnvelope::looks_like_envelope(&value) {
        state.metrics.record_chat_event();
        state.chat_sink.handle_event(value).await?;
        let mut response = Json(serde_json::json!({ "status": "received" })).into_response();
        response.extensions_mut().insert(FlowOutcome::ChatEvent);
        return Ok(response);
    }

    let timer = RequestTimer::new(Arc::clone(&state.metrics));
    let result = exchange(&state, value).await;
    timer.finish(result.is_ok());

    match result {
        Ok((encrypted, screen)) => {
            let mut response =
                (StatusCode::OK, [(header::CONTENT_TYPE, "text/plain")], encrypted).into_response();
            response.extensions_mut().insert(FlowOutcome::Screen(screen));
            Ok(response)
        }
        Err(e) => {
            log_event!(
                warn,
                "gateway",
                "Flow exchange failed",
                status = e.status().as_u16(),
                error = %e
            );
            Err(e)
        }
    }
}

/// Decrypt, dispatch, encrypt. Returns the sealed reply and its screen label.
async fn exchange(
    state: &AppState,
    value: serde_json::Value,
) -> Result<(String, &'static str), FlowError> {
    let envelope: EncryptedEnvelope = serde_json::from_value(value)
        .map_err(|e| CodecError::MalformedEnvelope(format!("envelope fields: {e}")))?;

    let DecryptedEnvelope { plaintext, keys } =
        match decrypt_envelope(&envelope, &state.private_key) {
            Ok(decrypted) => {
                state.metrics.record_decrypted();
                decrypted
            }
            Err(e) => {
                state.metrics.record_decrypt_failure(e.class());
                return Err(e.into());
            }
        };

    let response = state.dispatcher.dispatch_value(plaintext).await?;
    let screen = screen_label(&response);
    state.metrics.record_screen(screen);
    debug!(screen, error = response.is_error(), "Flow response ready");

    Ok((encrypt_response(&response, &keys)?, screen))
}

fn screen_label(response: &FlowResponse) -> &'static str {
    match &response.screen {
        None => "ack",
        Some(Screen::Appointment) => "APPOINTMENT",
        Some(Screen::Details) => "DETAILS",
        Some(Screen::Summary) => "SUMMARY",
        Some(Screen::Success) => "SUCCESS",
        Some(Screen::Unknown(_)) => "other",
    }
}

/// `GET /flow/initial-screen`: first APPOINTMENT payload, unencrypted.
async fn handle_initial_screen(State(state): State<AppState>) -> Result<Response, FlowError> {
    let response = state.dispatcher.initial_screen().await?;
    Ok(Json(response).into_response())
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "flow-gateway",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn metrics_json(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.metrics.to_json())
}

async fn metrics_prometheus() -> Response {
    match booking_telemetry::encode_metrics() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => {
            log_event!(error, "gateway", "Metrics encoding failed", error = %e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
