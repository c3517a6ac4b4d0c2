//! # chatlink CLI
//!
//! Terminal client that logs in, keeps one realtime session open and prints
//! what arrives on it.
//!
//! ## Startup
//!
//! 1. Load [`AppConfig`] from `--config` and `CHATLINK_*` variables
//! 2. Obtain a validated credential: reuse the stored one, or log in
//!    interactively (email, or phone with CAPTCHA and SMS code)
//! 3. Open the session and print events until Ctrl-C or the session ends
//!
//! The CAPTCHA image for phone login is served at
//! `http://<captcha.bind_addr>/captcha` while the phone flow runs.

pub mod captcha;
pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod prompt;

use std::sync::Arc;

use chatlink_auth::{ApiClient, CredentialBootstrap, FileCredentialStore, SessionCredential};
use chatlink_protocol::LoginPayload;
use chatlink_websocket::ConnectionSession;
use clap::Parser;
use tracing::{info, warn};

pub use captcha::AxumCaptchaSink;
pub use cli::{Cli, OutputFormat};
pub use config::AppConfig;
pub use error::{CliError, CliResult};
pub use output::Formatter;
pub use prompt::{LinePrompter, StdinPrompter};

/// Run the CLI application
pub async fn run() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = AppConfig::load(cli.config.as_deref())?;
    let formatter = Formatter::new(cli.format, !cli.no_color);

    let client = ApiClient::new(config.api_config())?;
    let store = Arc::new(FileCredentialStore::new(config.credential_path()));
    let prompter = Arc::new(StdinPrompter::stdin());
    let sink = Arc::new(AxumCaptchaSink::new(config.captcha_bind_addr()?));

    let credential = CredentialBootstrap::new(client, store, prompter, sink)
        .obtain()
        .await?;
    info!(
        "logged in as {} ({}) on {}",
        credential.identity.display_name, credential.identity.user_id, credential.device.platform
    );

    let (session, mut events) =
        ConnectionSession::new(config.session_config(), login_payload(&credential));
    session.connect().await?;

    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    let outcome = loop {
        tokio::select! {
            signal = &mut interrupt => {
                if let Err(e) = signal {
                    warn!("failed to listen for Ctrl-C: {}", e);
                }
                info!("interrupted, closing session");
                break Ok(());
            }
            event = events.recv() => match event {
                Some(event) => {
                    if let Err(e) = formatter.display(&event) {
                        break Err(e);
                    }
                }
                None => break Ok(()),
            },
        }
    };

    session.destroy().await;
    outcome
}

/// Login frame payload for a validated credential
pub fn login_payload(credential: &SessionCredential) -> LoginPayload {
    LoginPayload {
        user_id: credential.identity.user_id.clone(),
        token: credential.identity.token.clone(),
        platform: credential.device.platform.clone(),
        device_id: credential.device.device_id.clone(),
    }
}

/// Log to stderr; `RUST_LOG` wins over `-v`
fn init_tracing(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();
}
