//! # Numin Mock — projection API server
//!
//! ```text
//!  ┌──────────────┐  GET/POST /projection/single-ticker  ┌──────────────────────┐
//!  │  numin-algo  │ ────────────────────────────────────▶│ AppState             │
//!  │  (backtest)  │ ◀──── { clusteredProjection, ... } ──│ └─ ProjectionSource  │
//!  └──────────────┘                                      │    (mock | file)     │
//!                                                        └──────────────────────┘
//!                    GET /  ·  GET /health
//! ```
//!
//! See [`numin_mock::config`] for the environment variables.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use numin_mock::{build_router, build_state, config::ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Load .env ──────────────────────────────────────────────────────────
    dotenvy::dotenv().ok();

    // ── 2. Structured logging ─────────────────────────────────────────────────
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive("numin_mock=debug".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    info!(r#"

  ╔═══════════════════════════════════════════════╗
  ║        NUMIN MOCK — Projection API            ║
  ║        clustered · consolidated               ║
  ╚═══════════════════════════════════════════════╝"#);

    // ── 3. Config & shared state ──────────────────────────────────────────────
    let config = ServerConfig::from_env().context("Failed to load config")?;
    let state = build_state(&config);

    // ── 4. Router ─────────────────────────────────────────────────────────────
    let app = build_router(state);

    // ── 5. Bind & Serve ───────────────────────────────────────────────────────
    info!(addr = ?config.bind_addr, "🚀 Numin mock API starting");
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("cannot bind {}", config.bind_addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
