//! # engine::runner
//!
//! The single consumer of the tick queue.  Owns the strategy, processes one
//! tick at a time to completion, then publishes the snapshot and counters.
//! Returns the strategy once every sender is dropped.

use std::sync::atomic::Ordering;

use tokio::sync::mpsc;
use tracing::info;

use crate::engine::strategy::SurvivorStrategy;
use crate::events::{publish, WsEvent};
use crate::models::TickData;
use crate::state::SnapshotPublisher;

/// A `TICK_STATS` heartbeat goes out every this many ticks.
pub const STATS_EVERY: u64 = 100;

pub async fn run(
    mut strategy: SurvivorStrategy,
    mut ticks: mpsc::Receiver<TickData>,
    out: SnapshotPublisher,
) -> SurvivorStrategy {
    info!("▶️ Tick runner started");

    while let Some(tick) = ticks.recv().await {
        let report = strategy.on_tick(tick.last_price).await;

        let tick_count = out.tick_count.fetch_add(1, Ordering::Relaxed) + 1;
        let trades = report.trades();
        let trade_count = out.trade_count.fetch_add(trades, Ordering::Relaxed) + trades;

        let snapshot = strategy.snapshot();
        if tick_count % STATS_EVERY == 0 {
            publish(&out.broadcast_tx, &WsEvent::TickStats {
                tick_count,
                trade_count,
                last_price:   tick.last_price,
                pe_reference: snapshot.pe.reference_price,
                ce_reference: snapshot.ce.reference_price,
            });
        }
        *out.snapshot.write().await = snapshot;
    }

    info!(
        ticks  = out.tick_count.load(Ordering::Relaxed),
        trades = out.trade_count.load(Ordering::Relaxed),
        "🛑 Tick feed closed, strategy shutdown complete"
    );
    strategy
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;
    use crate::broker::fake::FakeBroker;
    use crate::config::tests::make_config;
    use crate::models::Side;
    use crate::orders::OrderTracker;
    use crate::state::tests::make_state;
    use crate::state::SharedState;

    async fn make_strategy(state: &SharedState) -> SurvivorStrategy {
        SurvivorStrategy::initialize(
            Arc::new(make_config()),
            Arc::new(FakeBroker::new(24500.0)),
            Arc::new(OrderTracker::in_memory()),
            state.broadcast_tx.clone(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_processes_in_order_and_stops_when_senders_drop() {
        let (state, rx) = make_state(None, 8);
        let strategy = make_strategy(&state).await;
        let mut events = state.broadcast_tx.subscribe();
        let out = state.publisher();

        let handle = tokio::spawn(run(strategy, rx, out.clone()));

        // 24530 trades PE (ref 24525), 24480 resets it (ref 24510)
        for price in [24530.0, 24480.0, 24490.0] {
            state.tick_tx.send(TickData::new(price)).await.unwrap();
        }
        drop(state);

        let strategy = handle.await.unwrap();

        assert_eq!(out.tick_count.load(Ordering::Relaxed), 3);
        assert_eq!(out.trade_count.load(Ordering::Relaxed), 1);
        assert_eq!(strategy.state(Side::Pe).reference_price, 24510.0);

        let snap = out.snapshot.read().await;
        assert_eq!(snap.last_price, Some(24490.0));
        assert!(snap.pe.armed);

        let first: serde_json::Value = serde_json::from_str(&events.recv().await.unwrap()).unwrap();
        assert_eq!(first["event"], "TRIGGER_FIRED");
    }

    #[tokio::test]
    async fn test_stats_heartbeat() {
        let (state, rx) = make_state(None, STATS_EVERY as usize);
        let strategy = make_strategy(&state).await;
        let mut events = state.broadcast_tx.subscribe();
        let out = state.publisher();

        let handle = tokio::spawn(run(strategy, rx, out.clone()));
        // flat market: no triggers, only the heartbeat
        for _ in 0..STATS_EVERY {
            state.tick_tx.send(TickData::new(24500.0)).await.unwrap();
        }
        drop(state);
        handle.await.unwrap();

        assert_eq!(out.tick_count.load(Ordering::Relaxed), STATS_EVERY);
        let stats: serde_json::Value = serde_json::from_str(&events.recv().await.unwrap()).unwrap();
        assert_eq!(stats["event"], "TICK_STATS");
        assert_eq!(stats["tick_count"], STATS_EVERY);
    }

    #[tokio::test]
    async fn test_open_monitor_socket_does_not_block_shutdown() {
        let (state, rx) = make_state(None, 8);
        let strategy = make_strategy(&state).await;
        let out = state.publisher();
        let runner = tokio::spawn(run(strategy, rx, out.clone()));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            axum::serve(listener, crate::routes::router(state))
                .with_graceful_shutdown(async {
                    stop_rx.await.ok();
                })
                .await
        });

        let mut client = tokio::net::TcpStream::connect(addr).await.unwrap();
        client
            .write_all(
                b"GET /ws/monitor HTTP/1.1\r\n\
                  Host: localhost\r\n\
                  Connection: Upgrade\r\n\
                  Upgrade: websocket\r\n\
                  Sec-WebSocket-Version: 13\r\n\
                  Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\r\n",
            )
            .await
            .unwrap();
        let mut buf = [0u8; 1024];
        let n = client.read(&mut buf).await.unwrap();
        assert!(buf[..n].starts_with(b"HTTP/1.1 101"));

        // socket task is live once it has subscribed to the event stream
        tokio::time::timeout(Duration::from_secs(2), async {
            while out.broadcast_tx.receiver_count() == 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();

        stop_tx.send(()).unwrap();
        server.await.unwrap().unwrap();

        // the client is still connected here
        let finished = tokio::time::timeout(Duration::from_secs(2), runner).await;
        assert!(finished.is_ok(), "runner still waiting on the tick queue");
        drop(client);
    }
}
