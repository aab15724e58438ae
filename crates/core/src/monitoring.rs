use metrics::describe_counter;
use tracing::info;

pub const TOKEN_REFRESHES: &str = "hltb_token_refreshes_total";
pub const TOKEN_EXTRACT_FAILURES: &str = "hltb_token_extract_failures_total";
pub const SEARCH_ATTEMPTS: &str = "hltb_search_attempts_total";

/// Initialize tracing subscriber with default configuration
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hltb_core=info,hltb=info".into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Errors only, so machine-readable stdout stays clean
pub fn init_tracing_quiet() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from("error"))
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Installs the Prometheus exporter when `HLTB_METRICS_PORT` is set.
/// Returns the port it listens on.
pub fn init_metrics_from_env() -> anyhow::Result<Option<u16>> {
    let Ok(raw) = std::env::var("HLTB_METRICS_PORT") else {
        return Ok(None);
    };
    let port: u16 = raw
        .trim()
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid HLTB_METRICS_PORT '{raw}': {e}"))?;

    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()?;
    describe_metrics();
    info!("Metrics endpoint available at http://localhost:{}/metrics", port);
    Ok(Some(port))
}

fn describe_metrics() {
    describe_counter!(TOKEN_REFRESHES, "Access token refresh cycles");
    describe_counter!(
        TOKEN_EXTRACT_FAILURES,
        "Candidate scripts that did not contain a token"
    );
    describe_counter!(
        SEARCH_ATTEMPTS,
        "Search requests by token placement and outcome"
    );
}
