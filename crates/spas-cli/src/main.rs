// # spas - SPAS address lookup from the command line
//
// A THIN integration layer over spas-core:
// - Reads configuration from environment variables
// - Installs the tracing subscriber
// - Runs exactly one client operation and prints the payload as JSON
//
// No classification, retry, or rate limiting logic lives here.
//
// ## Usage
//
// ```bash
// spas search <query>
// spas autocomplete <text> [limit]
// spas details <object_id>
// spas regions
// spas --help
// ```
//
// ## Configuration
//
// - `SPAS_TOKEN`: Bearer token (falls back to `FIAS_TOKEN`)
// - `SPAS_BASE_URL`: Service base URL
// - `SPAS_TIMEOUT_SECS`: Per-call timeout, fractions allowed
// - `SPAS_OPERATION_TIMEOUT_SECS`: Deadline for one operation, retries included
// - `SPAS_MAX_RETRIES`: Attempt ceiling per operation, first attempt included
// - `SPAS_MAX_CONNECTIONS`: Concurrent in-flight requests
// - `SPAS_RATE_LIMIT_REQUESTS` / `SPAS_RATE_LIMIT_WINDOW_SECS`: Sliding-window budget
// - `SPAS_ADDRESS_TYPE`: `administrative` (default) or `municipal`
// - `SPAS_LOG_LEVEL`: trace, debug, info, warn, error (default: warn)
//
// ## Example
//
// ```bash
// export SPAS_TOKEN=your_token
// spas search "Москва, Тверская 1"
// ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use spas_core::{AddressType, SpasConfig};
use std::env;
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;
use tracing::{Level, debug, error};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for the possible outcomes of one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpasExitCode {
    /// Operation succeeded and produced a result
    Success = 0,
    /// Bad arguments or configuration
    ConfigError = 1,
    /// The operation failed (network, service, or decode error)
    RuntimeError = 2,
    /// The search completed but found nothing
    NotFound = 3,
}

impl From<SpasExitCode> for ExitCode {
    fn from(code: SpasExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Resilient client for the SPAS address-search service
#[derive(Debug, Parser)]
#[command(name = "spas")]
#[command(about = "Look up Russian addresses in the SPAS registry")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// One client operation requested on the command line
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
enum Command {
    /// Resolve one address from free text, an id, a global id or a cadastral number
    Search {
        /// Query; its shape selects the lookup
        query: String,
    },

    /// Suggest addresses for partial input
    Autocomplete {
        /// Partial address text
        text: String,
        /// Maximum number of suggestions
        #[arg(default_value_t = 10)]
        limit: usize,
    },

    /// Show extended attributes of an address
    Details {
        /// Internal numeric id of the address
        object_id: i64,
    },

    /// List top-level regions
    Regions,
}

/// Application configuration
struct Config {
    token: String,
    base_url: Option<String>,
    timeout_secs: Option<f64>,
    operation_timeout_secs: Option<f64>,
    max_retries: Option<u32>,
    max_connections: Option<usize>,
    rate_limit_requests: Option<usize>,
    rate_limit_window_secs: Option<f64>,
    address_type: String,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            token: env::var("SPAS_TOKEN")
                .or_else(|_| env::var("FIAS_TOKEN"))
                .unwrap_or_default(),
            base_url: env::var("SPAS_BASE_URL").ok(),
            timeout_secs: env_number("SPAS_TIMEOUT_SECS")?,
            operation_timeout_secs: env_number("SPAS_OPERATION_TIMEOUT_SECS")?,
            max_retries: env_number("SPAS_MAX_RETRIES")?,
            max_connections: env_number("SPAS_MAX_CONNECTIONS")?,
            rate_limit_requests: env_number("SPAS_RATE_LIMIT_REQUESTS")?,
            rate_limit_window_secs: env_number("SPAS_RATE_LIMIT_WINDOW_SECS")?,
            address_type: env::var("SPAS_ADDRESS_TYPE")
                .unwrap_or_else(|_| "administrative".to_string()),
            log_level: env::var("SPAS_LOG_LEVEL").unwrap_or_else(|_| "warn".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            anyhow::bail!(
                "SPAS_TOKEN is required. \
                Set it via: export SPAS_TOKEN=your_token"
            );
        }

        if let Some(ref url) = self.base_url
            && !url.starts_with("https://")
            && !url.starts_with("http://")
        {
            anyhow::bail!("SPAS_BASE_URL must use HTTP or HTTPS scheme. Got: {}", url);
        }

        for (name, secs) in [
            ("SPAS_TIMEOUT_SECS", self.timeout_secs),
            ("SPAS_OPERATION_TIMEOUT_SECS", self.operation_timeout_secs),
            ("SPAS_RATE_LIMIT_WINDOW_SECS", self.rate_limit_window_secs),
        ] {
            if let Some(secs) = secs
                && !(secs.is_finite() && secs > 0.0)
            {
                anyhow::bail!("{} must be a positive number of seconds. Got: {}", name, secs);
            }
        }

        if let Some(max_retries) = self.max_retries
            && (max_retries == 0 || max_retries > 10)
        {
            anyhow::bail!("SPAS_MAX_RETRIES must be between 1 and 10. Got: {}", max_retries);
        }

        match self.address_type.to_lowercase().as_str() {
            "administrative" | "municipal" => {}
            _ => anyhow::bail!(
                "SPAS_ADDRESS_TYPE '{}' is not valid. \
                Valid types: administrative, municipal",
                self.address_type
            ),
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "SPAS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    /// Client configuration with every override applied
    fn to_client_config(&self) -> Result<SpasConfig> {
        let mut config = SpasConfig::new().with_token(self.token.clone());

        if let Some(ref url) = self.base_url {
            config = config.with_base_url(url.clone());
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(seconds("SPAS_TIMEOUT_SECS", secs)?);
        }
        if let Some(secs) = self.operation_timeout_secs {
            config = config.with_operation_timeout(seconds("SPAS_OPERATION_TIMEOUT_SECS", secs)?);
        }
        if let Some(retries) = self.max_retries {
            config = config.with_max_retries(retries);
        }
        if let Some(connections) = self.max_connections {
            config = config.with_max_connections(connections);
        }
        if self.rate_limit_requests.is_some() || self.rate_limit_window_secs.is_some() {
            let requests = self.rate_limit_requests.unwrap_or(config.rate_limit_requests);
            let window = match self.rate_limit_window_secs {
                Some(secs) => seconds("SPAS_RATE_LIMIT_WINDOW_SECS", secs)?,
                None => config.rate_limit_window(),
            };
            config = config.with_rate_limit_window(requests, window);
        }
        if self.address_type.eq_ignore_ascii_case("municipal") {
            config = config.with_address_type(AddressType::Municipal);
        }

        config.validate()?;
        Ok(config)
    }
}

/// Convert fractional seconds from the environment
fn seconds(name: &str, secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs)
        .with_context(|| format!("{} is not a valid duration. Got: {}", name, secs))
}

/// Read an optional numeric environment variable
fn env_number<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{} must be a number. Got: {}", name, value)),
        Err(_) => Ok(None),
    }
}

fn main() -> ExitCode {
    let command = match Cli::try_parse() {
        Ok(cli) => cli.command,
        Err(e) => {
            // --help and --version are reported through the same error type
            let _ = e.print();
            return if e.use_stderr() {
                SpasExitCode::ConfigError.into()
            } else {
                SpasExitCode::Success.into()
            };
        }
    };

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return SpasExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return SpasExitCode::ConfigError.into();
    }

    let client_config = match config.to_client_config() {
        Ok(client_config) => client_config,
        Err(e) => {
            eprintln!("Configuration validation error: {}", e);
            return SpasExitCode::ConfigError.into();
        }
    };

    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    // Logs go to stderr so stdout carries only the JSON result
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return SpasExitCode::ConfigError.into();
    }

    debug!("Running {:?} against {}", command, client_config.base_url);

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return SpasExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        match run(&client_config, command).await {
            Ok(code) => code,
            Err(e) => {
                error!("{:#}", e);
                SpasExitCode::RuntimeError
            }
        }
    });

    result.into()
}

/// Run one operation and print its result
async fn run(config: &SpasConfig, command: Command) -> Result<SpasExitCode> {
    let client = spas_transport_http::connect(config)?;

    let output = client
        .scope(|spas| async move {
            let value = match command {
                Command::Search { query } => spas.search(query.as_str()).await?,
                Command::Autocomplete { text, limit } => {
                    Some(serde_json::Value::Array(spas.autocomplete(&text, limit).await?))
                }
                Command::Details { object_id } => Some(spas.get_details(object_id).await?),
                Command::Regions => Some(serde_json::Value::Array(spas.get_regions().await?)),
            };
            Ok::<_, spas_core::Error>(value)
        })
        .await?;

    match output {
        Some(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(SpasExitCode::Success)
        }
        None => {
            eprintln!("No address found");
            Ok(SpasExitCode::NotFound)
        }
    }
}
