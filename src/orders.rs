//! # orders
//!
//! [`OrderTracker`]: every order the broker accepted this session.
//!
//! Kept in memory for `/api/monitor/orders`; when `ORDER_JOURNAL` is set each
//! order is also appended to that file as one JSON line, and the file is read
//! back at startup so history survives a restart.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::broker::OrderRecorder;
use crate::models::OrderDetails;

pub struct OrderTracker {
    orders:  RwLock<Vec<OrderDetails>>,
    journal: Option<PathBuf>,
}

impl OrderTracker {
    pub fn in_memory() -> Self {
        Self { orders: RwLock::new(Vec::new()), journal: None }
    }

    /// Open (or start) a journal.  Existing lines are loaded; malformed lines
    /// are skipped with a warning.
    pub async fn with_journal(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let orders = load_journal(&path).await?;
        if !orders.is_empty() {
            info!(path = %path.display(), count = orders.len(), "📒 Order journal loaded");
        }
        Ok(Self { orders: RwLock::new(orders), journal: Some(path) })
    }

    pub async fn orders(&self) -> Vec<OrderDetails> {
        self.orders.read().await.clone()
    }

    async fn append_to_journal(&self, path: &Path, details: &OrderDetails) -> std::io::Result<()> {
        let mut line = serde_json::to_string(details)?;
        line.push('\n');

        let mut file = OpenOptions::new().create(true).append(true).open(path).await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }
}

async fn load_journal(path: &Path) -> std::io::Result<Vec<OrderDetails>> {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut orders = Vec::new();
    for (n, line) in text.lines().enumerate().filter(|(_, l)| !l.trim().is_empty()) {
        match serde_json::from_str::<OrderDetails>(line) {
            Ok(details) => orders.push(details),
            Err(e) => warn!(line = n + 1, error = %e, "Skipping malformed journal line"),
        }
    }
    Ok(orders)
}

#[async_trait]
impl OrderRecorder for OrderTracker {
    async fn record_order(&self, details: OrderDetails) {
        if let Some(path) = &self.journal {
            // the in-memory copy is still kept when the disk write fails
            if let Err(e) = self.append_to_journal(path, &details).await {
                error!(path = %path.display(), error = %e, order_id = %details.order_id, "Order journal write failed");
            }
        }
        self.orders.write().await.push(details);
    }
}
