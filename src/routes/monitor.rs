//! # routes::monitor
//!
//! Read-only view of the running strategy.
//!
//! | Method    | Path                  | Description                                  |
//! |-----------|-----------------------|----------------------------------------------|
//! | GET (WS)  | `/ws/monitor`         | Snapshot on connect, then every [`WsEvent`]  |
//! | GET       | `/api/monitor/state`  | References, armed flags, last price          |
//! | GET       | `/api/monitor/orders` | Orders recorded this session (plus journal)  |
//!
//! [`WsEvent`]: crate::events::WsEvent

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    Json,
};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use std::sync::atomic::Ordering;
use tracing::{debug, info};

use crate::state::{SharedState, SnapshotPublisher};

// ─── WebSocket ────────────────────────────────────────────────────────────────

pub async fn ws_monitor(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    // the socket outlives the server; it must not keep the tick queue open
    let view = state.publisher();
    ws.on_upgrade(|socket| handle_socket(socket, view))
}

async fn handle_socket(socket: WebSocket, state: SnapshotPublisher) {
    let mut rx = state.broadcast_tx.subscribe();
    let (mut sender, mut receiver) = socket.split();

    info!("🔌 WebSocket client connected");

    let snapshot = {
        let strategy = state.snapshot.read().await.clone();
        json!({
            "event":       "SNAPSHOT",
            "strategy":    strategy,
            "tick_count":  state.tick_count.load(Ordering::Relaxed),
            "trade_count": state.trade_count.load(Ordering::Relaxed),
        })
        .to_string()
    };

    if sender.send(Message::Text(snapshot)).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(json_str) => {
                        if sender.send(Message::Text(json_str)).await.is_err() {
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        debug!("WS client lagged, skipped {n} events");
                    }
                    Err(_) => break,
                }
            }

            result = receiver.next() => {
                match result {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sender.send(Message::Pong(data)).await;
                    }
                    _ => {}
                }
            }
        }
    }

    info!("🔌 WebSocket client disconnected");
}

// ─── REST ─────────────────────────────────────────────────────────────────────

/// GET /api/monitor/state
pub async fn get_state(State(state): State<SharedState>) -> impl IntoResponse {
    let snapshot = state.snapshot.read().await.clone();
    let config = &state.config;

    Json(json!({
        "ok":          true,
        "pe":          snapshot.pe,
        "ce":          snapshot.ce,
        "last_price":  snapshot.last_price,
        "updated_at":  snapshot.updated_at,
        "tick_count":  state.tick_count.load(Ordering::Relaxed),
        "trade_count": state.trade_count.load(Ordering::Relaxed),
        "index":       config.index_symbol,
        "series":      config.symbol_initials,
        "gaps": {
            "pe_gap":       config.pe_gap,
            "ce_gap":       config.ce_gap,
            "pe_reset_gap": config.pe_reset_gap,
            "ce_reset_gap": config.ce_reset_gap,
        },
    }))
}

/// GET /api/monitor/orders
pub async fn get_orders(State(state): State<SharedState>) -> impl IntoResponse {
    let orders = state.orders.orders().await;
    Json(json!({
        "ok":     true,
        "count":  orders.len(),
        "orders": orders,
    }))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::Request,
    };
    use chrono::Utc;
    use tower::ServiceExt;

    use crate::broker::OrderRecorder;
    use crate::models::{OrderDetails, Side, TransactionType};
    use crate::routes::router;
    use crate::state::tests::make_state;

    async fn get_json(app: axum::Router, uri: &str) -> serde_json::Value {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        serde_json::from_slice(&to_bytes(resp.into_body(), usize::MAX).await.unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_state_shows_references() {
        let (state, _rx) = make_state(None, 8);
        state.snapshot.write().await.pe.armed = true;

        let body = get_json(crate::routes::router(state), "/api/monitor/state").await;
        assert_eq!(body["pe"]["reference_price"], 24500.0);
        assert_eq!(body["pe"]["armed"], true);
        assert_eq!(body["ce"]["armed"], false);
        assert_eq!(body["series"], "NIFTY25JAN30");
    }

    #[tokio::test]
    async fn test_orders_listed() {
        let (state, _rx) = make_state(None, 8);
        state
            .orders
            .record_order(OrderDetails {
                order_id:         "FAKE-1".into(),
                symbol:           "NIFTY25JAN3024300PE".into(),
                side:             Side::Pe,
                transaction_type: TransactionType::Sell,
                quantity:         75,
                price:            None,
                timestamp:        Utc::now(),
            })
            .await;

        let body = get_json(router(state), "/api/monitor/orders").await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["orders"][0]["order_id"], "FAKE-1");
        assert_eq!(body["orders"][0]["side"], "PE");
        assert_eq!(body["orders"][0]["transaction_type"], "SELL");
    }
}
