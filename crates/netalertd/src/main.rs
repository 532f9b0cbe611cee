// # netalertd - Alarm Notification Daemon
//
// This is a THIN integration layer: all pipeline logic lives in
// netalert-core. The daemon is responsible for:
// 1. Loading configuration (TOML file + environment overrides)
// 2. Initializing tracing
// 3. Wiring the provider, ledger, and notifier
// 4. Running the alert engine's periodic loop
//
// ## Configuration
//
// The config file path comes from `NETALERT_CONFIG` (default
// `netalert.toml`). Environment variables take precedence over file values
// and are applied in one resolution step before any component is built:
//
// - `NETALERT_RECIPIENTS`: comma-separated recipient addresses
// - `NETALERT_CHANNEL`: delivery channel (smtp, sendgrid)
// - `NETALERT_FROM_EMAIL`: from-address for outgoing messages
// - `NETALERT_SMTP_HOST` / `NETALERT_SMTP_PORT`
// - `NETALERT_SMTP_USERNAME` / `NETALERT_SMTP_PASSWORD`
// - `NETALERT_SMTP_TLS`: negotiate STARTTLS (true/false)
// - `NETALERT_SENDGRID_API_KEY`: bearer credential for the mail API
// - `NETALERT_POLL_INTERVAL_SECS`: seconds between fetch cycles
// - `NETALERT_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export NETALERT_CONFIG=/etc/netalert/netalert.toml
// export NETALERT_RECIPIENTS=noc@example.com,oncall@example.com
// export NETALERT_SMTP_PASSWORD=app-password
//
// netalertd
// ```

use std::env;
use std::process::ExitCode;

use anyhow::Result;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use netalert_core::config::{LedgerConfig, ProviderConfig};
use netalert_core::traits::{AlarmProvider, DedupStore};
use netalert_core::{AlertEngine, MemoryLedger, NetalertConfig, Notifier, SqliteLedger};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum NetalertExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<NetalertExitCode> for ExitCode {
    fn from(code: NetalertExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let config_path = env::var("NETALERT_CONFIG").unwrap_or_else(|_| "netalert.toml".to_string());

    // Resolve configuration once: file, then environment precedence.
    let mut config = match NetalertConfig::load(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return NetalertExitCode::ConfigError.into();
        }
    };
    config.apply_env_overrides();

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return NetalertExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match env::var("NETALERT_LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return NetalertExitCode::ConfigError.into();
    }

    info!("starting netalertd");
    info!(
        "provider type: {}, {} recipient(s)",
        config.provider.type_name(),
        config.notifier.recipients.len()
    );

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return NetalertExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {}", e);
            NetalertExitCode::RuntimeError
        } else {
            NetalertExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(config: NetalertConfig) -> Result<()> {
    let provider = build_provider(&config.provider)?;
    let ledger = build_ledger(&config.ledger)?;
    let notifier = Notifier::from_config(config.notifier.clone());

    let (engine, _events) = AlertEngine::new(provider, ledger, notifier, &config.engine);

    info!("alert engine wired, entering periodic loop");
    engine.run().await?;

    Ok(())
}

/// Construct the alarm provider selected by the configuration
fn build_provider(config: &ProviderConfig) -> Result<Box<dyn AlarmProvider>> {
    match config {
        #[cfg(feature = "json-sim")]
        ProviderConfig::JsonFile { path } => {
            Ok(Box::new(netalert_source_json::JsonFileProvider::new(path)))
        }

        #[cfg(feature = "nms")]
        ProviderConfig::NmsApi {
            base_url,
            api_token,
        } => Ok(Box::new(netalert_source_nms::NmsApiProvider::new(
            base_url, api_token,
        ))),

        #[allow(unreachable_patterns)]
        other => anyhow::bail!(
            "provider type '{}' is not compiled into this build",
            other.type_name()
        ),
    }
}

/// Construct the dedup ledger selected by the configuration
fn build_ledger(config: &LedgerConfig) -> Result<Box<dyn DedupStore>> {
    match config {
        LedgerConfig::Sqlite { path } => Ok(Box::new(SqliteLedger::open(path)?)),
        LedgerConfig::Memory => {
            warn!("using in-memory ledger; alarms may be re-notified after a restart");
            Ok(Box::new(MemoryLedger::new()))
        }
    }
}
