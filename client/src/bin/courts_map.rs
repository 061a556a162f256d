//! Courts Map headless front end.
//!
//! Reads commands from stdin, feeds them to the map driver and prints a
//! summary line after every state change.
//!
//! # Usage
//!
//! ```bash
//! COURTFINDER_BACKEND_URL=http://localhost:8000 cargo run --bin courts-map
//! cargo run --bin courts-map -- --config ./courtfinder.toml --no-persist
//! COURTFINDER_PASSWORD=secret cargo run --bin courts-map -- --login me@example.com
//! COURTFINDER_PASSWORD=secret cargo run --bin courts-map -- --signup me@example.com "Me"
//! ```
//!
//! The map needs a session. Without a stored token, pass `--login` or
//! `--signup`.
//!
//! # Environment Variables
//!
//! - `COURTFINDER_CONFIG`: TOML file to load
//! - `COURTFINDER_BACKEND_URL`: backend base URL (default: http://localhost:8000)
//! - `COURTFINDER_TOKEN_FILE`: where the session token is persisted
//! - `COURTFINDER_PASSWORD`: password for `--login` / `--signup`
//! - `RUST_LOG`: Log filter, e.g. `courtfinder_client=debug` (default: warn)

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use courtfinder_client::config::ClientConfig;
use courtfinder_client::http::{BackendClient, HttpCourtsApi};
use courtfinder_client::runtime::{MapDriver, UiEvent};
use courtfinder_client::services::{
    FixedGeolocation, GeolocationProvider, MapSnapshot, UnavailableGeolocation,
};
use courtfinder_client::session::{
    require_session, AuthClient, FileTokenStore, MemoryTokenStore, SessionContext, TokenStore,
};

const PASSWORD_VAR: &str = "COURTFINDER_PASSWORD";

const HELP: &str = "\
commands:
  q <text>                    free-text search
  filter <field> <value>      indoor_outdoor | min_courts | court_type | lighting
  clear <field>               unset a filter
  hover <id>                  hover a list row
  click <id>                  click a map pin
  mode map|list|toggle        switch view mode
  recenter <lat> <lon> <zoom> move the map
  refresh | dismiss | show | help | quit";

enum SignIn {
    Login { email: String },
    Signup { email: String, display_name: String },
}

struct Args {
    config: Option<PathBuf>,
    persist: bool,
    sign_in: Option<SignIn>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = Args {
        config: None,
        persist: true,
        sign_in: None,
    };
    let mut iter = env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter.next().context("--config needs a path")?;
                args.config = Some(PathBuf::from(path));
            }
            "--no-persist" => args.persist = false,
            "--login" => {
                let email = iter.next().context("--login needs an email")?;
                args.sign_in = Some(SignIn::Login { email });
            }
            "--signup" => {
                let email = iter.next().context("--signup needs an email")?;
                let display_name = iter.next().context("--signup needs a display name")?;
                args.sign_in = Some(SignIn::Signup {
                    email,
                    display_name,
                });
            }
            other => anyhow::bail!("unknown argument '{}'", other),
        }
    }
    Ok(args)
}

async fn sign_in(
    auth: &AuthClient,
    session: &mut SessionContext,
    request: &SignIn,
) -> anyhow::Result<()> {
    let password =
        env::var(PASSWORD_VAR).with_context(|| format!("{} must be set to sign in", PASSWORD_VAR))?;
    let result = match request {
        SignIn::Login { email } => auth.sign_in(session, email, &password).await,
        SignIn::Signup {
            email,
            display_name,
        } => auth.register(session, email, &password, display_name).await,
    };
    result.map_err(|e| anyhow::anyhow!("sign-in failed: {}", e))
}

fn summary(snapshot: &MapSnapshot) -> String {
    let mut line = format!(
        "[{:?}] {} @ z{} | {} rows, {} pins",
        snapshot.view_mode,
        snapshot.viewport.center,
        snapshot.viewport.zoom,
        snapshot.rows.len(),
        snapshot.markers.len(),
    );
    if snapshot.loading {
        line.push_str(" | loading");
    }
    if let Some(active) = &snapshot.active {
        line.push_str(&format!(" | active={}", active));
    }
    if let Some(hovered) = &snapshot.hovered {
        line.push_str(&format!(" | hovered={}", hovered));
    }
    if let Some(notice) = &snapshot.notice {
        line.push_str(&format!(" | {}", notice.message));
    }
    line
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args()?;
    let config = ClientConfig::load(args.config.as_deref()).map_err(|e| anyhow::anyhow!(e))?;
    info!(backend = %config.backend.url, "configuration loaded");

    let store: Arc<dyn TokenStore> = match (&config.session.token_file, args.persist) {
        (Some(path), true) => Arc::new(FileTokenStore::new(path)),
        _ => Arc::new(MemoryTokenStore::new()),
    };
    let mut session = SessionContext::init(store).map_err(|e| anyhow::anyhow!(e))?;

    let backend = BackendClient::new(&config.backend).map_err(|e| anyhow::anyhow!(e))?;
    let auth = AuthClient::new(backend.clone());
    if let Some(request) = &args.sign_in {
        sign_in(&auth, &mut session, request).await?;
    } else if session.is_signed_in() {
        if let Err(err) = auth.refresh_profile(&mut session).await {
            warn!(error = %err, "could not load profile");
        }
    }
    require_session(&session).map_err(|e| {
        anyhow::anyhow!("{}; pass --login <email> or --signup <email> <name>", e)
    })?;

    let geolocation: Arc<dyn GeolocationProvider> = match config.device.position() {
        Some(position) => Arc::new(FixedGeolocation(position)),
        None => Arc::new(UnavailableGeolocation),
    };
    let api = Arc::new(HttpCourtsApi::new(backend));

    let (mut handle, driver) = MapDriver::from_config(&config, api, geolocation)
        .with_session(&session)
        .spawn();

    let mut updates = handle.subscribe();
    let printer = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let line = summary(&updates.borrow_and_update());
            println!("{}", line);
        }
    });

    println!("{}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "" => continue,
            "help" => println!("{}", HELP),
            "show" => println!("{}", serde_json::to_string_pretty(&handle.snapshot())?),
            command => match command.parse::<UiEvent>() {
                Ok(event) => {
                    let quitting = event == UiEvent::Unmount;
                    if !handle.send(event) || quitting {
                        break;
                    }
                }
                Err(message) => eprintln!("{}", message),
            },
        }
        while let Some(id) = handle.try_next_scroll() {
            println!("scroll to {}", id);
        }
    }

    drop(handle);
    let controller = driver.await?;
    printer.abort();
    info!(courts = controller.results().len(), "exiting");
    Ok(())
}
