//! topbreja server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! SQLite store and serves the JSON API under `/api`.
//!
//! # Provisioning
//!
//! Sign-up and token issuance happen in the authentication provider. For
//! local development the binary can write the same records directly:
//!
//! ```text
//! topbreja add-user --email ana@example.com --name Ana --admin
//! topbreja add-session --user <uuid> --token dev-token --hours 24
//! ```

mod settings;

use std::sync::Arc;

use anyhow::Context as _;
use axum::Router;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use topbreja_api::{AppState, api_router};
use topbreja_core::{
  image::PublicUrlResolver,
  session::TtlCache,
  store::BrejaStore,
  user::{NewUser, Role},
};
use topbreja_store_sqlite::SqliteStore;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::settings::{ServerConfig, expand_tilde};

#[derive(Parser)]
#[command(author, version, about = "TopBreja API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: std::path::PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the API (default).
  Serve,
  /// Create a user record and print its id.
  AddUser {
    #[arg(long)]
    email: String,
    #[arg(long)]
    name:  String,
    #[arg(long)]
    admin: bool,
  },
  /// Register a bearer token for an existing user.
  AddSession {
    #[arg(long)]
    user:  Uuid,
    #[arg(long)]
    token: String,
    #[arg(long, default_value_t = 24)]
    hours: i64,
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
  let server_cfg = ServerConfig::load(&cli.config)?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(server_cfg, store).await,
    Command::AddUser { email, name, admin } => {
      let mut input = NewUser::member(Uuid::new_v4(), &email, &name);
      if admin {
        input.role = Role::Admin;
      }
      let user = store.add_user(input).await.context("failed to add user")?;
      println!("{}", user.user_id);
      Ok(())
    }
    Command::AddSession { user, token, hours } => {
      let expires_at = chrono::Utc::now() + chrono::Duration::hours(hours);
      store
        .register_session(&token, user, expires_at)
        .await
        .context("failed to register session")?;
      tracing::info!(%user, %expires_at, "session registered");
      Ok(())
    }
  }
}

async fn serve(server_cfg: ServerConfig, store: SqliteStore) -> anyhow::Result<()> {
  let state = AppState::new(
    Arc::new(store),
    server_cfg.ranking,
    Arc::new(TtlCache::new(server_cfg.session_ttl())),
    Arc::new(PublicUrlResolver::new(server_cfg.image_base_url.clone())),
  );

  // Bring positions and badges up to date with whatever is on disk.
  state
    .recorder
    .compute_ranking()
    .await
    .context("failed to compute initial ranking")?;

  let app = Router::new()
    .nest("/api", api_router(state))
    .layer(TraceLayer::new_for_http());
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
