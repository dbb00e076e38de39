// # cfsync - Cloudflare zone reconciler
//
// This binary is a thin integration layer: all reconciliation logic lives in
// cfsync-core.
//
// The cfsync binary is responsible for:
// 1. Reading configuration from flags and environment variables
// 2. Initializing logging and the runtime
// 3. Building the shared HTTP client, the trace IP source and the
//    Cloudflare zone API
// 4. Running one reconciliation and printing its outcome
//
// ## Configuration
//
// | flag | environment | default |
// |---|---|---|
// | `-location` / `--location` | `CFSYNC_LOCATION` | required |
// | `-token` / `--token` | `CFSYNC_TOKEN` | required |
// | `--api-base` | `CFSYNC_API_BASE` | `https://api.cloudflare.com/client/v4/zones` |
// | `--trace-url` | `CFSYNC_TRACE_URL` | `https://cloudflare.com/cdn-cgi/trace` |
// | `--timeout-secs` | `CFSYNC_TIMEOUT_SECS` | 30 |
// | `--concurrency` | `CFSYNC_CONCURRENCY` | 1 |
// | `--log-level` | `CFSYNC_LOG_LEVEL` | info |
//
// ## Example
//
// ```bash
// cfsync -location 023e105f4ecef8ad9ca31a8372d0c353 -token your_token
// ```

use anyhow::Result;
use cfsync_core::config::{ApiToken, DEFAULT_API_BASE, DEFAULT_TRACE_URL, ReconcileConfig};
use cfsync_core::{ReconcileEvent, ReconcileReport, Reconciler};
use cfsync_ip_trace::TraceIpSource;
use cfsync_provider_cloudflare::{CloudflareProvider, http_client};
use clap::Parser;
use clap::error::{ContextKind, ContextValue, ErrorKind};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

/// Single-dash long flags accepted for compatibility
const LEGACY_FLAGS: &[&str] = &["-location", "-token"];

const MISSING_LOCATION: &str = "need to pass -location <zone id>";
const MISSING_TOKEN: &str = "need to pass -token <api token>";

/// Exit codes for different termination scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CfsyncExitCode {
    /// Every listed record was updated, or a required flag was missing
    /// and nothing was done
    Success = 0,
    /// Invalid flag value or startup failure
    ConfigError = 1,
    /// The run stopped before the update phase (unknown IP, listing failure)
    Aborted = 2,
    /// The run completed but at least one record update failed
    PartialFailure = 3,
}

impl From<CfsyncExitCode> for ExitCode {
    fn from(code: CfsyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

impl CfsyncExitCode {
    fn for_report(report: &ReconcileReport) -> Self {
        if report.all_succeeded() {
            Self::Success
        } else {
            Self::PartialFailure
        }
    }
}

/// Point every DNS record of a Cloudflare zone at the current public IP
#[derive(Parser, Debug)]
#[command(name = "cfsync", version, about, long_about = None)]
struct Cli {
    /// Zone id whose records are reconciled
    #[arg(long, env = "CFSYNC_LOCATION")]
    location: Option<String>,

    /// Cloudflare API token with Zone:DNS:Edit permission
    #[arg(long, env = "CFSYNC_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Zones endpoint of the Cloudflare API
    #[arg(long, env = "CFSYNC_API_BASE", default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// Plaintext trace endpoint used to discover the public IP
    #[arg(long, env = "CFSYNC_TRACE_URL", default_value = DEFAULT_TRACE_URL)]
    trace_url: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "CFSYNC_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// Number of record updates in flight at once
    #[arg(long, env = "CFSYNC_CONCURRENCY", default_value_t = 1)]
    concurrency: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "CFSYNC_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Cli {
    /// Instructional message for the first required flag that is absent or blank
    fn missing_flag(&self) -> Option<&'static str> {
        let blank = |value: &Option<String>| value.as_deref().is_none_or(|v| v.trim().is_empty());

        if blank(&self.location) {
            Some(MISSING_LOCATION)
        } else if blank(&self.token) {
            Some(MISSING_TOKEN)
        } else {
            None
        }
    }

    /// Turn parsed flags into a validated run configuration
    fn into_config(self) -> Result<ReconcileConfig> {
        let Some(location) = self.location.filter(|l| !l.trim().is_empty()) else {
            anyhow::bail!(MISSING_LOCATION);
        };

        let Some(token) = self.token.filter(|t| !t.trim().is_empty()) else {
            anyhow::bail!(MISSING_TOKEN);
        };

        let config = ReconcileConfig::new(location, ApiToken::new(token))
            .with_api_base(self.api_base)
            .with_trace_url(self.trace_url)
            .with_timeout_secs(self.timeout_secs)
            .with_max_concurrent_updates(self.concurrency);

        config.validate()?;

        Ok(config)
    }

    fn log_level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "Log level '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }
}

/// Rewrite `-location`/`-token` into their `--` form
fn normalize_legacy_flags<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    args.into_iter()
        .map(|arg| {
            if LEGACY_FLAGS.contains(&arg.as_str()) {
                format!("-{}", arg)
            } else {
                arg
            }
        })
        .collect()
}

/// Parse the command line
///
/// `--help` and `--version` print and exit as usual. A `-location` or
/// `-token` given without a value is treated like a missing flag.
fn parse_cli<I>(args: I) -> std::result::Result<Cli, CfsyncExitCode>
where
    I: IntoIterator<Item = String>,
{
    match Cli::try_parse_from(normalize_legacy_flags(args)) {
        Ok(cli) => Ok(cli),
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => e.exit(),
            _ => match missing_value_message(&e) {
                Some(message) => {
                    println!("{}", message);
                    Err(CfsyncExitCode::Success)
                }
                None => {
                    let _ = e.print();
                    Err(CfsyncExitCode::ConfigError)
                }
            },
        },
    }
}

/// Instructional message when clap rejected `--location`/`--token` for lacking a value
fn missing_value_message(err: &clap::Error) -> Option<&'static str> {
    if err.kind() != ErrorKind::InvalidValue {
        return None;
    }

    match err.get(ContextKind::InvalidArg) {
        Some(ContextValue::String(arg)) if arg.starts_with("--location") => Some(MISSING_LOCATION),
        Some(ContextValue::String(arg)) if arg.starts_with("--token") => Some(MISSING_TOKEN),
        _ => None,
    }
}

/// Build the run configuration, or the exit code to stop with
///
/// A missing zone or token is a no-op: the message is printed and the
/// process exits 0 without any network call. Values that are present but
/// invalid exit with [`CfsyncExitCode::ConfigError`].
fn configure(cli: Cli) -> std::result::Result<ReconcileConfig, CfsyncExitCode> {
    if let Some(message) = cli.missing_flag() {
        println!("{}", message);
        return Err(CfsyncExitCode::Success);
    }

    cli.into_config().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        CfsyncExitCode::ConfigError
    })
}

fn main() -> ExitCode {
    let cli = match parse_cli(std::env::args()) {
        Ok(cli) => cli,
        Err(code) => return code.into(),
    };

    let log_level = match cli.log_level() {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return CfsyncExitCode::ConfigError.into();
        }
    };

    let config = match configure(cli) {
        Ok(config) => config,
        Err(code) => return code.into(),
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return CfsyncExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return CfsyncExitCode::ConfigError.into();
        }
    };

    let code = rt.block_on(async {
        match run_once(&config).await {
            Ok(report) => {
                print_summary(&report);
                CfsyncExitCode::for_report(&report)
            }
            Err(cfsync_core::Error::Config(e)) => {
                eprintln!("Configuration error: {}", e);
                CfsyncExitCode::ConfigError
            }
            Err(e) => {
                eprintln!("{}", e);
                CfsyncExitCode::Aborted
            }
        }
    });

    code.into()
}

/// Run one reconciliation
///
/// The HTTP client is created here and shared by the IP source and the zone
/// API; it is dropped with the reconciler on every exit path.
async fn run_once(config: &ReconcileConfig) -> cfsync_core::Result<ReconcileReport> {
    let client = http_client(Duration::from_secs(config.timeout_secs))?;

    let ip_source = TraceIpSource::with_client(config.trace_url.clone(), client.clone());
    let api = CloudflareProvider::from_config(client, config);

    let (reconciler, mut events) = Reconciler::new(Box::new(ip_source), Box::new(api), config)?;

    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if let Some(line) = status_line(&event) {
                println!("{}", line);
            }
        }
    });

    info!("Reconciling zone {}", config.location);
    let result = reconciler.reconcile().await;

    // Closes the event channel and releases the transport
    drop(reconciler);
    if let Err(e) = printer.await {
        error!("Event printer failed: {}", e);
    }

    result
}

/// Human-readable line for an event, if it deserves one
fn status_line(event: &ReconcileEvent) -> Option<String> {
    match event {
        ReconcileEvent::IpResolved { ip } => Some(format!("my ip is {}", ip)),
        ReconcileEvent::RecordsListed { count, result_info } => Some(match result_info {
            Some(info) => format!(
                "Got {} DNS record(s) (page {}, {} per page, {} total)",
                count, info.page, info.per_page, info.total_count
            ),
            None => format!("Got {} DNS record(s)", count),
        }),
        ReconcileEvent::UpdateSucceeded {
            record_name,
            status,
            ..
        } => Some(format!(
            "{} ip address for {} updated",
            fmt_status(*status),
            record_name
        )),
        ReconcileEvent::UpdateFailed {
            record_name,
            status,
            error,
            ..
        } => Some(format!(
            "{} update for {} failed: {}",
            fmt_status(*status),
            record_name,
            error.as_deref().unwrap_or("no details")
        )),
        ReconcileEvent::Aborted { reason } => Some(format!("aborted: {}", reason)),
        ReconcileEvent::Transition { .. } | ReconcileEvent::Finished { .. } => None,
    }
}

fn fmt_status(status: Option<u16>) -> String {
    status.map_or_else(|| "---".to_string(), |s| s.to_string())
}

fn print_summary(report: &ReconcileReport) {
    println!(
        "zone {}: {} of {} record(s) now point at {}",
        report.zone_id,
        report.succeeded(),
        report.outcomes.len(),
        report.ip
    );

    for failure in report.failures() {
        println!(
            "  failed: {} ({}) status {}",
            failure.record_name,
            failure.record_id,
            fmt_status(failure.status)
        );
    }
}
