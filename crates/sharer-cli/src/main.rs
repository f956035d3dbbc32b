//! sharer: split a secret into two QR codes and recover it
//!
//! Commands:
//!   encrypt [--input FILE] [--json]   - seal a secret, print the recovery sheet
//!   decrypt --scan <TEXT>... [--code] - recover a secret from scanned codes
//!   relay                             - JSON-lines relay on stdin/stdout
//!   check                             - report missing platform capabilities
//!   config show                       - display current configuration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use secrecy::ExposeSecret;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};

use sharer_core::config::{SharerConfig, MIN_RECOMMENDED_ITERATIONS};
use sharer_flow::{
    check_capabilities, seal_secret, DecryptSession, DecryptState, RecoverySheet, SheetRenderer,
    TextSheetRenderer,
};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "sharer",
    version,
    about = "Split-secret QR encryption",
    long_about = "sharer: encrypt a secret into two QR carriers plus a printed security code"
)]
struct Cli {
    /// Path to sharer.toml configuration file
    #[arg(long, short = 'c', env = "SHARER_CONFIG", default_value = "sharer.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, env = "SHARER_LOG")]
    log: Option<String>,

    /// Log format; overrides the config file
    #[arg(long, env = "SHARER_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, ValueEnum, PartialEq)]
enum LogFormat {
    Json,
    Text,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encrypt a secret and print the two-part recovery sheet
    Encrypt {
        /// Read the secret from this file instead of stdin
        #[arg(long, short = 'i')]
        input: Option<PathBuf>,
        /// Print payloads and security code as JSON instead of the sheet
        #[arg(long)]
        json: bool,
    },

    /// Recover a secret from scanned QR code contents
    Decrypt {
        /// Scanned text (carrier URL or bare payload); repeat for each code
        #[arg(long = "scan", short = 's', required = true)]
        scans: Vec<String>,
        /// Security code; prompted for when omitted
        #[arg(long)]
        code: Option<String>,
    },

    /// Serve the relay protocol as JSON lines on stdin/stdout
    Relay,

    /// Check that every capability the flows need is available
    Check,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let loaded = load_config(&cli.config).await?;
    let config = loaded.clone().unwrap_or_default();

    let (level, format) = log_settings(&cli, &config);
    init_logging(&level, &format);

    if loaded.is_none() {
        warn!(
            "config file not found: {}  (using defaults)",
            cli.config.display()
        );
    }
    if config.weak_kdf() {
        warn!(
            iterations = config.crypto.pbkdf2_iterations,
            recommended = MIN_RECOMMENDED_ITERATIONS,
            "PBKDF2 work factor below recommendation"
        );
    }

    match cli.command {
        Commands::Encrypt { input, json } => cmd_encrypt(&config, input.as_deref(), json).await,
        Commands::Decrypt { scans, code } => cmd_decrypt(&config, &scans, code).await,
        Commands::Relay => cmd_relay(&config).await,
        Commands::Check => cmd_check(&config).await,
        Commands::Config {
            action: ConfigAction::Show,
        } => cmd_config_show(&config, &cli.config, loaded.is_some()),
    }
}

// ── Config loading ────────────────────────────────────────────────────────────

/// `None` when the file does not exist.
async fn load_config(path: &Path) -> Result<Option<SharerConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading config: {}", path.display()))?;
    let config = SharerConfig::from_toml(&content)
        .with_context(|| format!("parsing config: {}", path.display()))?;
    Ok(Some(config))
}

/// Flags and env win over the config file.
fn log_settings(cli: &Cli, config: &SharerConfig) -> (String, LogFormat) {
    let level = cli.log.clone().unwrap_or_else(|| config.log.level.clone());
    let format = cli.log_format.clone().unwrap_or_else(|| {
        if config.log.format.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    });
    (level, format)
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries command output
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

// ── `sharer encrypt` ──────────────────────────────────────────────────────────

async fn cmd_encrypt(config: &SharerConfig, input: Option<&Path>, json: bool) -> Result<()> {
    let plaintext = match input {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading secret: {}", path.display()))?,
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("reading secret from stdin")?;
            buf
        }
    };
    let plaintext = secrecy::SecretString::from(plaintext);
    require_secret(plaintext.expose_secret())?;

    let sealed = seal_secret(plaintext.expose_secret(), config)
        .await
        .context("sealing secret")?;

    if json {
        let out = serde_json::json!({
            "payloads": sealed.payloads,
            "security_code": sealed.security_code.expose(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        let sheet = RecoverySheet::new(&sealed, config.crypto.pbkdf2_iterations);
        print!("{}", TextSheetRenderer.render(&sheet)?);
    }
    Ok(())
}

fn require_secret(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        anyhow::bail!("nothing to encrypt: input is empty");
    }
    Ok(())
}

// ── `sharer decrypt` ──────────────────────────────────────────────────────────

async fn cmd_decrypt(config: &SharerConfig, scans: &[String], code: Option<String>) -> Result<()> {
    let relay = sharer_relay::spawn(&config.relay);
    let mut session = DecryptSession::new(Some(relay), config);

    let mut state = session.load(None).await?;
    for scan in scans {
        state = session.scan(scan).await?;
        info!(?state, "scan processed");
    }
    match state {
        DecryptState::ReadyToDecrypt => {}
        DecryptState::WaitingForSecond { have } => {
            anyhow::bail!("only the {have} code was scanned; scan the other part too")
        }
        other => anyhow::bail!("no secret found in the scans ({other:?})"),
    }

    let code = match code {
        Some(code) => code,
        None => tokio::task::spawn_blocking(|| rpassword::prompt_password("Security code: "))
            .await
            .context("prompt task failed")?
            .context("reading security code")?,
    };
    let code = secrecy::SecretString::from(code);

    match session.submit_code(code.expose_secret()).await {
        Ok(secret) => {
            println!("{}", secret.expose_secret());
            Ok(())
        }
        Err(e) => anyhow::bail!("{}", e.user_message()),
    }
}

// ── `sharer relay` ────────────────────────────────────────────────────────────

async fn cmd_relay(config: &SharerConfig) -> Result<()> {
    let relay = sharer_relay::spawn(&config.relay);
    info!(max_age_secs = config.relay.max_age_secs, "relay serving on stdin/stdout");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await.context("reading request")? {
        if line.trim().is_empty() {
            continue;
        }
        let reply = relay.handle_json(&line).await;
        stdout.write_all(reply.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    // Leave nothing behind once the peer hangs up.
    if let Err(e) = relay.clear().await {
        warn!(error = %e, "could not clear relay");
    }
    info!("relay input closed");
    Ok(())
}

// ── `sharer check` ────────────────────────────────────────────────────────────

async fn cmd_check(config: &SharerConfig) -> Result<()> {
    let relay = sharer_relay::spawn(&config.relay);
    let report = check_capabilities(Some(&relay)).await;

    println!("{}", serde_json::to_string_pretty(&report)?);
    if !report.compatible {
        std::process::exit(1);
    }
    Ok(())
}

// ── `sharer config show` ──────────────────────────────────────────────────────

fn cmd_config_show(config: &SharerConfig, config_path: &Path, from_file: bool) -> Result<()> {
    if from_file {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!(
            "# Configuration: defaults (no file at {})",
            config_path.display()
        );
    }
    println!();
    let rendered = toml::to_string_pretty(config).context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config_logging() {
        let mut config = SharerConfig::default();
        config.log.format = "json".into();

        let cli = Cli::parse_from(["sharer", "check"]);
        let (level, format) = log_settings(&cli, &config);
        assert_eq!(level, "info");
        assert_eq!(format, LogFormat::Json);

        let cli = Cli::parse_from(["sharer", "--log", "debug", "--log-format", "text", "check"]);
        let (level, format) = log_settings(&cli, &config);
        assert_eq!(level, "debug");
        assert_eq!(format, LogFormat::Text);
    }

    #[test]
    fn decrypt_takes_repeated_scans() {
        let cli = Cli::parse_from([
            "sharer",
            "decrypt",
            "--scan",
            "https://example.com/s#data=A",
            "-s",
            "https://example.com/s#key=B",
        ]);
        match cli.command {
            Commands::Decrypt { scans, code } => {
                assert_eq!(scans.len(), 2);
                assert!(code.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn blank_input_is_refused() {
        assert!(require_secret(" \n\t").is_err());
        assert!(require_secret("hunter2").is_ok());
    }

    #[tokio::test]
    async fn missing_config_file_means_defaults() {
        let loaded = load_config(Path::new("/nonexistent/sharer.toml"))
            .await
            .unwrap();
        assert!(loaded.is_none());
    }
}
