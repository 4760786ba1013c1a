//! # state
//!
//! Shared state injected into every Axum handler.
//!
//! The strategy itself is *not* in here: it is owned by the tick runner task.
//! Handlers only see the tick queue (write side), the snapshot the runner
//! publishes after each tick, the order tracker and the counters.

use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, RwLock};

use crate::config::StrategyConfig;
use crate::engine::strategy::StrategySnapshot;
use crate::models::TickData;
use crate::orders::OrderTracker;

#[derive(Clone)]
pub struct AppState {
    // ── Tick feed ─────────────────────────────────────────────────────────────
    /// Bounded; a full queue makes the ingestion handler wait.
    pub tick_tx:        mpsc::Sender<TickData>,
    pub queue_capacity: usize,

    // ── Strategy view ─────────────────────────────────────────────────────────
    pub config:   Arc<StrategyConfig>,
    pub snapshot: Arc<RwLock<StrategySnapshot>>,
    pub orders:   Arc<OrderTracker>,

    // ── Monitor / WebSocket ───────────────────────────────────────────────────
    pub broadcast_tx: broadcast::Sender<String>,

    // ── Metrics ───────────────────────────────────────────────────────────────
    pub tick_count:  Arc<AtomicU64>,
    pub trade_count: Arc<AtomicU64>,

    // ── Auth ──────────────────────────────────────────────────────────────────
    /// `None` = dev mode, every route open.
    pub api_key: Option<String>,
}

impl AppState {
    /// Monitor handles without `tick_tx`, for the tick runner and for
    /// WebSocket clients.  The queue closes once the router drops its state.
    pub fn publisher(&self) -> SnapshotPublisher {
        SnapshotPublisher {
            snapshot:     self.snapshot.clone(),
            broadcast_tx: self.broadcast_tx.clone(),
            tick_count:   self.tick_count.clone(),
            trade_count:  self.trade_count.clone(),
        }
    }
}

/// The monitor view: written by the tick runner, read by `/ws/monitor`.
#[derive(Clone)]
pub struct SnapshotPublisher {
    pub snapshot:     Arc<RwLock<StrategySnapshot>>,
    pub broadcast_tx: broadcast::Sender<String>,
    pub tick_count:   Arc<AtomicU64>,
    pub trade_count:  Arc<AtomicU64>,
}

pub type SharedState = Arc<AppState>;

/// Everything `build_state` needs besides the queue it creates.
pub struct StateParts {
    pub config:         Arc<StrategyConfig>,
    pub snapshot:       StrategySnapshot,
    pub orders:         Arc<OrderTracker>,
    pub broadcast_tx:   broadcast::Sender<String>,
    pub queue_capacity: usize,
    pub api_key:        Option<String>,
}

/// Build the state and the receiving end of the tick queue.
pub fn build_state(parts: StateParts) -> (SharedState, mpsc::Receiver<TickData>) {
    let (tick_tx, tick_rx) = mpsc::channel(parts.queue_capacity);

    let state = AppState {
        tick_tx,
        queue_capacity: parts.queue_capacity,
        config:         parts.config,
        snapshot:       Arc::new(RwLock::new(parts.snapshot)),
        orders:         parts.orders,
        broadcast_tx:   parts.broadcast_tx,
        tick_count:     Arc::new(AtomicU64::new(0)),
        trade_count:    Arc::new(AtomicU64::new(0)),
        api_key:        parts.api_key,
    };

    (Arc::new(state), tick_rx)
}
