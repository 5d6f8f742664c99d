//! Chirp server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! store, and serves the API over HTTP.
//!
//! # Adding a user
//!
//! ```sh
//! cargo run -p chirp-server --bin chirp -- add-user --username alice \
//!   --image-url https://example.com/alice.png
//! ```
//!
//! The password is read from stdin; the new identity id is printed.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use chirp_api::AppState;
use chirp_core::limiter::{RateLimiter, SlidingWindowLimiter};
use chirp_server::{LimiterBackend, ServerConfig, load_config};
use chirp_store_sqlite::{NewIdentity, SqliteStore};
use clap::{Parser, Subcommand};
use rand_core::OsRng;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Chirp server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP API (the default).
  Serve,
  /// Print the argon2 hash for a password entered on stdin and exit.
  HashPassword,
  /// Register an identity; the password is read from stdin.
  AddUser {
    /// Handle shown as the author name. Omit to create a nameless identity.
    #[arg(long)]
    username:  Option<String>,
    /// Profile picture URL.
    #[arg(long)]
    image_url: String,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let server_cfg = load_config(&cli.config)
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::HashPassword => {
      let password = read_password()?;
      println!("{}", hash_password(&password)?);
      Ok(())
    }
    Command::AddUser { username, image_url } => {
      let store = open_store(&server_cfg).await?;
      let password = read_password()?;
      let record = store
        .add_identity(NewIdentity {
          username,
          image_url,
          password_hash: hash_password(&password)?,
        })
        .await
        .context("failed to add identity")?;
      tracing::info!(identity_id = %record.id, "identity added");
      println!("{}", record.id);
      Ok(())
    }
    Command::Serve => {
      let store = open_store(&server_cfg).await?;
      let rl = &server_cfg.rate_limit;
      match rl.backend {
        LimiterBackend::Sqlite => {
          let limiter = store.rate_limiter(rl.max_requests, rl.window());
          serve(&server_cfg, store, limiter).await
        }
        LimiterBackend::Memory => {
          let limiter = SlidingWindowLimiter::new(rl.max_requests, rl.window());
          serve(&server_cfg, store, limiter).await
        }
      }
    }
  }
}

async fn open_store(cfg: &ServerConfig) -> anyhow::Result<SqliteStore> {
  // Expand `~` in store path.
  let store_path = expand_tilde(&cfg.store_path);
  SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))
}

async fn serve<L>(cfg: &ServerConfig, store: SqliteStore, limiter: L) -> anyhow::Result<()>
where
  L: RateLimiter + 'static,
{
  let store = Arc::new(store);
  let state = AppState::new(store.clone(), store, Arc::new(limiter));

  let app = chirp_server::app(state);
  let address = format!("{}:{}", cfg.host, cfg.port);

  tracing::info!(
    max_requests = cfg.rate_limit.max_requests,
    window_secs = cfg.rate_limit.window_secs,
    backend = ?cfg.rate_limit.backend,
    "write rate limit configured"
  );
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

fn hash_password(password: &str) -> anyhow::Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string(),
  )
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  let stdin = io::stdin();
  eprint!("Password: ");
  io::stderr().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  let password = line.trim_end_matches(['\n', '\r']).to_string();
  anyhow::ensure!(!password.is_empty(), "password must not be empty");
  Ok(password)
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
