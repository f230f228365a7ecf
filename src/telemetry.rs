use opentelemetry::trace::TraceId;
use tracing_subscriber::{prelude::*, EnvFilter, Registry};

/// Current trace id as seen through the full tracing stack, for correlating
/// log lines with exported spans.
pub fn get_trace_id() -> TraceId {
    use opentelemetry::trace::TraceContextExt as _; // opentelemetry::Context -> opentelemetry::trace::Span
    use tracing_opentelemetry::OpenTelemetrySpanExt as _; // tracing::Span -> opentelemetry::Context

    tracing::Span::current()
        .context()
        .span()
        .span_context()
        .trace_id()
}

fn build_tracer() -> opentelemetry_sdk::trace::Tracer {
    use opentelemetry::trace::TracerProvider;
    #[cfg(feature = "telemetry")]
    use opentelemetry_otlp::SpanExporter;
    use opentelemetry_sdk::trace::SdkTracerProvider;

    let builder = SdkTracerProvider::builder();
    #[cfg(feature = "telemetry")]
    let builder = {
        let exporter = SpanExporter::builder().with_tonic().build().unwrap();
        builder.with_batch_exporter(exporter)
    };
    builder.build().tracer("hub-console-sync")
}

/// Install the global subscriber: compact log lines, `RUST_LOG`-style
/// filtering defaulting to `info`, and span export when the `telemetry`
/// feature is on.
pub fn init() {
    let otel = tracing_opentelemetry::layer().with_tracer(build_tracer());
    let logger = tracing_subscriber::fmt::layer().compact();
    let env_filter = EnvFilter::try_from_default_env()
        .or(EnvFilter::try_new("info"))
        .unwrap();

    let collector = Registry::default().with(otel).with(logger).with(env_filter);
    tracing::subscriber::set_global_default(collector).unwrap();
}
