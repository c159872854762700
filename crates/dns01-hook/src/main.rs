// # dns01-hook - DNS-01 challenge hook
//
// Thin integration layer between a certificate-issuance client and
// `dns01-core`. No DNS, zone or session logic lives here.
//
// The hook is responsible for:
// 1. Reading configuration from flags or environment variables
// 2. Initializing tracing and the runtime
// 3. Running one provisioning run per invocation (connect, reconcile, finalize)
//
// ## Usage
//
// ```bash
// dns01-hook present _acme-challenge.www.example.com <validation-token>
// dns01-hook cleanup _acme-challenge.www.example.com <validation-token>
// ```
//
// ## Configuration
//
// - `--user` / `DNS01_USER`: API account user (required)
// - `--password` / `DNS01_PASSWORD`: API account password (required)
// - `--shared-secret` / `DNS01_SHARED_SECRET`: OTP shared secret (rejected: not supported)
// - `--endpoint` / `DNS01_ENDPOINT`: explicit JSON-RPC endpoint URL
// - `--sandbox` / `DNS01_SANDBOX`: use the sandbox endpoint
// - `--log-level` / `DNS01_LOG_LEVEL`: trace, debug, info, warn, error (default: info)

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{Args, Parser, Subcommand};
use dns01_core::{ApiConfig, ChallengeProvisioner, Credentials, UpsertOutcome};
use dns01_jsonrpc::HttpRpcTransport;
use std::process::ExitCode;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
#[derive(Debug, Clone, Copy)]
enum HookExitCode {
    /// Record reconciled
    Success = 0,
    /// Configuration or usage error
    ConfigError = 1,
    /// Provisioning failed
    RuntimeError = 2,
}

impl From<HookExitCode> for ExitCode {
    fn from(code: HookExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

#[derive(Parser)]
#[command(name = "dns01-hook")]
#[command(about = "Publish and remove DNS-01 challenge TXT records", long_about = None)]
#[command(version)]
struct Cli {
    /// API account user
    #[arg(long, env = "DNS01_USER")]
    user: String,

    /// API account password
    #[arg(long, env = "DNS01_PASSWORD", hide_env_values = true)]
    password: String,

    /// Shared secret for one-time passwords (not supported)
    #[arg(long, env = "DNS01_SHARED_SECRET", hide_env_values = true)]
    shared_secret: Option<String>,

    /// Explicit JSON-RPC endpoint URL
    #[arg(long, env = "DNS01_ENDPOINT")]
    endpoint: Option<String>,

    /// Use the sandbox endpoint
    #[arg(long, env = "DNS01_SANDBOX")]
    sandbox: bool,

    /// Log level: trace, debug, info, warn, error
    #[arg(long, env = "DNS01_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Commands {
    /// Publish the challenge record
    Present(ChallengeArgs),

    /// Remove the challenge record
    Cleanup(ChallengeArgs),
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
struct ChallengeArgs {
    /// Fully qualified record name (e.g., _acme-challenge.www.example.com)
    record: String,

    /// TXT record content
    value: String,

    /// Extra context passed by some clients; ignored
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, hide = true)]
    extra: Vec<String>,
}

/// Application configuration
struct Config {
    api: ApiConfig,
    credentials: Credentials,
    log_level: String,
}

impl From<&Cli> for Config {
    fn from(cli: &Cli) -> Self {
        Self {
            api: ApiConfig {
                endpoint: cli.endpoint.clone().filter(|s| !s.is_empty()),
                sandbox: cli.sandbox,
            },
            credentials: Credentials {
                user: cli.user.clone(),
                password: cli.password.clone(),
                shared_secret: cli.shared_secret.clone().filter(|s| !s.is_empty()),
            },
            log_level: cli.log_level.clone(),
        }
    }
}

impl Config {
    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        self.credentials.validate()?;
        self.api.validate()?;

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "DNS01_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    fn level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => HookExitCode::Success.into(),
                _ => HookExitCode::ConfigError.into(),
            };
        }
    };

    let config = Config::from(&cli);
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return HookExitCode::ConfigError.into();
    }

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.level())
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return HookExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return HookExitCode::RuntimeError.into();
        }
    };

    match rt.block_on(run(config, cli.command)) {
        Ok(()) => HookExitCode::Success.into(),
        Err(e) => {
            error!("{:#}", e);
            HookExitCode::RuntimeError.into()
        }
    }
}

/// One provisioning run
async fn run(config: Config, command: Commands) -> Result<()> {
    let transport = HttpRpcTransport::from_config(&config.api)?;
    info!("Using endpoint {}", config.api.endpoint_url());

    let mut provisioner = ChallengeProvisioner::new(Box::new(transport));
    let creds = &config.credentials;

    let outcome = match &command {
        Commands::Present(ChallengeArgs { record, value, .. }) => provisioner
            .provision_txt(record, value, creds)
            .await
            .map(|outcome| match outcome {
                UpsertOutcome::Created { .. } => info!("Created {}", record),
                UpsertOutcome::Updated { ids } => {
                    info!("Updated {} record(s) for {}", ids.len(), record)
                }
            })
            .with_context(|| format!("Failed to provision {}", record)),
        Commands::Cleanup(ChallengeArgs { record, value, .. }) => provisioner
            .deprovision_txt(record, value, creds)
            .await
            .map(|removed| info!("Removed {} record(s) for {}", removed, record))
            .with_context(|| format!("Failed to remove {}", record)),
    };

    provisioner.finalize(creds).await;
    outcome
}
