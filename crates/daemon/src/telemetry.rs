//! OpenTelemetry export for the daemon's tracing spans
//!
//! # Environment Variables
//!
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (e.g., http://localhost:4317)
//! - `OTEL_SERVICE_NAME`: Service name (default: lsa-payment-daemon)
//!
//! The layer is built before the subscriber is installed, so the outcome is
//! kept in [`TelemetryStatus`] and logged once logging is up.

use anyhow::Result;
use tracing_subscriber::{Layer, Registry};

pub type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

pub enum TelemetryStatus {
    Disabled,
    Enabled { endpoint: String, service_name: String },
    FeatureMissing { endpoint: String },
}

pub struct Telemetry {
    pub layer: Option<BoxedLayer>,
    pub status: TelemetryStatus,
}

impl TelemetryStatus {
    pub fn log(&self) {
        match self {
            TelemetryStatus::Disabled => {
                tracing::debug!(
                    "OpenTelemetry not configured (OTEL_EXPORTER_OTLP_ENDPOINT not set)"
                );
            }
            TelemetryStatus::Enabled {
                endpoint,
                service_name,
            } => {
                tracing::info!(
                    service_name = %service_name,
                    endpoint = %endpoint,
                    "OpenTelemetry export enabled"
                );
            }
            TelemetryStatus::FeatureMissing { endpoint } => {
                tracing::warn!(
                    endpoint = %endpoint,
                    "OpenTelemetry endpoint set but feature 'telemetry' not enabled"
                );
                tracing::warn!("Rebuild with: cargo build --features telemetry");
            }
        }
    }
}

/// Build the OpenTelemetry layer if an endpoint is configured
pub fn init_telemetry() -> Result<Telemetry> {
    let Ok(endpoint) = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") else {
        return Ok(Telemetry {
            layer: None,
            status: TelemetryStatus::Disabled,
        });
    };

    #[cfg(feature = "telemetry")]
    {
        let service_name = std::env::var("OTEL_SERVICE_NAME")
            .unwrap_or_else(|_| "lsa-payment-daemon".to_string());
        let layer = build_layer(&endpoint, &service_name)?;
        Ok(Telemetry {
            layer: Some(layer),
            status: TelemetryStatus::Enabled {
                endpoint,
                service_name,
            },
        })
    }

    #[cfg(not(feature = "telemetry"))]
    {
        Ok(Telemetry {
            layer: None,
            status: TelemetryStatus::FeatureMissing { endpoint },
        })
    }
}

#[cfg(feature = "telemetry")]
fn build_layer(endpoint: &str, service_name: &str) -> Result<BoxedLayer> {
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry::KeyValue;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::trace::TracerProvider;
    use opentelemetry_sdk::{runtime, Resource};

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    let provider = TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_resource(Resource::new(vec![KeyValue::new(
            "service.name",
            service_name.to_string(),
        )]))
        .build();

    let tracer = provider.tracer(service_name.to_string());
    opentelemetry::global::set_tracer_provider(provider);

    Ok(Box::new(tracing_opentelemetry::layer().with_tracer(tracer)))
}
