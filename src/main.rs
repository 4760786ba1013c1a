//! # Survivor: Options-Selling Engine
//!
//! ```text
//!  ┌─────────────┐  POST /api/feed/tick   ┌──────────┐  mpsc (bounded)  ┌──────────────────────┐
//!  │ Market-data │ ─────────────────────▶ │  Axum    │ ───────────────▶ │ Tick runner          │
//!  │ relay       │                        │  router  │                  │  SurvivorStrategy    │
//!  └─────────────┘                        └──────────┘                  │  ├─ trigger PE / CE  │
//!                                              ▲                        │  ├─ risk gate        │
//!  ┌─────────────┐  ws://host/ws/monitor       │  snapshot + events     │  ├─ strike search ───┼──▶ Broker
//!  │  Dashboard  │ ◀───────────────────────────┴─────────────────────── │  ├─ executor ────────┼──▶ (Kite / paper)
//!  └─────────────┘  GET /api/monitor/*                                  │  └─ reset            │
//!                                                                       └──────────────────────┘
//! ```
//!
//! ## Environment Variables
//!
//! | Variable              | Default                | Description                        |
//! |-----------------------|------------------------|------------------------------------|
//! | `BROKER_NAME`         | `paper`                | `zerodha` or `paper`               |
//! | `KITE_API_KEY`        |                        | Kite Connect key (zerodha)         |
//! | `KITE_ACCESS_TOKEN`   |                        | Kite session token (zerodha)       |
//! | `BIND_ADDR`           | `0.0.0.0:3000`         | Address Axum listens on            |
//! | `TICK_QUEUE_CAPACITY` | `1024`                 | Ticks buffered before back-pressure|
//! | `ORDER_JOURNAL`       |                        | JSON-lines order log               |
//! | `API_KEY`             |                        | Require `X-API-Key` when set       |
//! | `PAPER_SPOT`          | `24500`                | Paper broker's starting index level|
//! | `SURVIVOR_CONFIG`     | `config/survivor.toml` | Strategy file                      |
//! | `RUST_LOG`            | `survivor=debug`       | Tracing filter                     |

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod auth;
mod broker;
mod cli;
mod config;
mod engine;
mod error;
mod events;
mod models;
mod orders;
mod routes;
mod state;

use broker::{build_broker, OrderRecorder};
use cli::Args;
use config::{RuntimeConfig, StrategyConfig};
use engine::{runner, strategy::SurvivorStrategy};
use orders::OrderTracker;
use state::{build_state, StateParts};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Load .env ──────────────────────────────────────────────────────────
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // ── 2. Structured logging ─────────────────────────────────────────────────
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive("survivor=debug".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    // ── 3. Strategy configuration (file, then CLI) ────────────────────────────
    let mut config = StrategyConfig::load(&args.config_file)?;
    for key in args.apply_overrides(&mut config) {
        info!(key, "⚙️ Overridden from command line");
    }

    if args.show_config {
        println!("{}", config.render_summary());
        return Ok(());
    }

    for key in config.check_startup()? {
        warn!(key, "⚠️ Still at the shipped default, check your configuration");
    }
    let config = Arc::new(config);

    info!(r#"

  ╔═══════════════════════════════════════════════╗
  ║        SURVIVOR — Options Selling Engine      ║
  ║   Trigger · Risk · Strike Search · Reset      ║
  ╚═══════════════════════════════════════════════╝"#);

    // ── 4. Runtime wiring ─────────────────────────────────────────────────────
    let runtime = RuntimeConfig::from_env()?;
    let broker = build_broker(&runtime, &config).await?;

    let orders = Arc::new(match &runtime.order_journal {
        Some(path) => OrderTracker::with_journal(path).await?,
        None => OrderTracker::in_memory(),
    });

    let (broadcast_tx, _) = broadcast::channel(256);

    // ── 5. Strategy (fatal if the initial quote fails) ───────────────────────
    let recorder: Arc<dyn OrderRecorder> = orders.clone();
    let strategy = SurvivorStrategy::initialize(
        config.clone(),
        broker,
        recorder,
        broadcast_tx.clone(),
    )
    .await?;

    let (state, tick_rx) = build_state(StateParts {
        config:         config.clone(),
        snapshot:       strategy.snapshot(),
        orders,
        broadcast_tx,
        queue_capacity: runtime.tick_queue_capacity,
        api_key:        runtime.api_key.clone(),
    });

    // ── 6. Tick runner ────────────────────────────────────────────────────────
    let runner = tokio::spawn(runner::run(strategy, tick_rx, state.publisher()));

    // ── 7. Bind & Serve ───────────────────────────────────────────────────────
    let app = routes::router(state);
    let addr: SocketAddr = runtime.bind_addr.parse()?;

    info!(?addr, auth = runtime.api_key.is_some(), "🚀 Survivor server starting");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // router dropped → last tick sender gone → runner drains and exits.
    // Open monitor sockets only hold a SnapshotPublisher.
    runner.await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Ctrl-C handler failed, shutting down");
    }
    info!("🛑 Shutdown requested");
}
