//! # broker::kite
//!
//! Zerodha **Kite Connect** REST adapter.
//!
//! | Call              | Endpoint                    |
//! |-------------------|-----------------------------|
//! | instrument master | `GET  /instruments/{EXCH}` (CSV, once at startup) |
//! | quote             | `GET  /quote?i=EXCH:SYMBOL` |
//! | place order       | `POST /orders/{variety}` (form-encoded) |
//!
//! Every response is wrapped in `{ "status": "success" | "error", "data": …, "message": … }`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::broker::{Broker, InstrumentBook, InstrumentLocator, OrderPlacer, QuoteProvider};
use crate::error::BrokerError;
use crate::models::{Instrument, OrderRequest, Quote, Side};

const KITE_API_URL: &str = "https://api.kite.trade";

/// Quote and order calls must not stall the tick loop.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
/// The NFO master is several MB.
const MASTER_TIMEOUT: Duration = Duration::from_secs(30);

// ─── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct KiteEnvelope<T> {
    status:  String,
    data:    Option<T>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct KiteQuote {
    instrument_token: Option<u64>,
    last_price:       f64,
}

#[derive(Debug, Deserialize)]
struct KiteOrderData {
    order_id: String,
}

// ─── KiteBroker ───────────────────────────────────────────────────────────────

pub struct KiteBroker {
    client:       reqwest::Client,
    base_url:     String,
    api_key:      String,
    access_token: String,
    book:         InstrumentBook,
}

impl KiteBroker {
    /// Build the client and download the option chain for `exchange`.
    pub async fn connect(
        api_key: String,
        access_token: String,
        exchange: &str,
    ) -> Result<Self, BrokerError> {
        let mut broker = Self::with_base_url(KITE_API_URL, api_key, access_token, InstrumentBook::default());
        broker.book = broker.fetch_instruments(exchange).await?;
        if broker.book.is_empty() {
            return Err(BrokerError::Decode(format!("instrument master for {exchange} has no options")));
        }
        Ok(broker)
    }

    pub fn with_base_url(
        base_url: &str,
        api_key: String,
        access_token: String,
        book: InstrumentBook,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            access_token,
            book,
        }
    }

    pub fn instrument_count(&self) -> usize {
        self.book.len()
    }

    pub fn listed(&self, option_type: Side) -> usize {
        self.book.strike_counts().get(&option_type).copied().unwrap_or(0)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("X-Kite-Version", "3")
            .header("Authorization", format!("token {}:{}", self.api_key, self.access_token))
    }

    async fn fetch_instruments(&self, exchange: &str) -> Result<InstrumentBook, BrokerError> {
        let url = format!("{}/instruments/{exchange}", self.base_url);
        info!(%url, "📥 Downloading instrument master");

        let response = self
            .authorized(self.client.get(&url))
            .timeout(MASTER_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BrokerError::Api(format!("instrument master HTTP {status}: {body}")));
        }

        let master = response.text().await?;
        Ok(InstrumentBook::from_kite_csv(&master))
    }
}

/// `EXCH:SYMBOL`, unless the symbol already carries an exchange prefix.
fn quote_key(symbol: &str, exchange: &str) -> String {
    if symbol.contains(':') {
        symbol.to_string()
    } else {
        format!("{exchange}:{symbol}")
    }
}

/// Unwrap Kite's envelope.  Error statuses (HTTP or `status: "error"`) become
/// `BrokerError::Api` carrying Kite's message.
fn decode_envelope<T: DeserializeOwned>(http_ok: bool, body: &str) -> Result<T, BrokerError> {
    let envelope: KiteEnvelope<T> = serde_json::from_str(body)
        .map_err(|e| BrokerError::Decode(format!("{e}: {body}")))?;

    if !http_ok || envelope.status != "success" {
        let message = envelope.message.unwrap_or_else(|| "unknown error".to_string());
        return Err(BrokerError::Api(message));
    }

    envelope
        .data
        .ok_or_else(|| BrokerError::Decode("response without data".to_string()))
}

#[async_trait]
impl QuoteProvider for KiteBroker {
    async fn get_quote(&self, symbol: &str, exchange: &str) -> Result<Quote, BrokerError> {
        let key = quote_key(symbol, exchange);
        let url = format!("{}/quote", self.base_url);

        let response = self
            .authorized(self.client.get(&url))
            .query(&[("i", key.as_str())])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let http_ok = response.status().is_success();
        let body = response.text().await?;
        let mut data: HashMap<String, KiteQuote> = decode_envelope(http_ok, &body)?;

        let quote = data.remove(&key).ok_or_else(|| BrokerError::QuoteUnavailable {
            symbol:   symbol.to_string(),
            exchange: exchange.to_string(),
        })?;

        Ok(Quote {
            symbol:           symbol.to_string(),
            last_price:       quote.last_price,
            instrument_token: quote.instrument_token,
        })
    }
}

impl InstrumentLocator for KiteBroker {
    fn find_instrument(
        &self,
        series_id: &str,
        option_type: Side,
        reference_price: f64,
        gap: f64,
    ) -> Option<Instrument> {
        self.book.find(series_id, option_type, reference_price, gap)
    }
}

#[async_trait]
impl OrderPlacer for KiteBroker {
    async fn place_order(&self, request: &OrderRequest) -> Result<String, BrokerError> {
        let url = format!("{}/orders/{}", self.base_url, request.variety);

        let quantity = request.quantity.to_string();
        let mut form: Vec<(&str, String)> = vec![
            ("tradingsymbol",    request.symbol.clone()),
            ("exchange",         request.exchange.clone()),
            ("transaction_type", request.transaction_type.as_str().to_string()),
            ("order_type",       request.order_type.as_str().to_string()),
            ("quantity",         quantity),
            ("product",          request.product.as_str().to_string()),
            ("validity",         "DAY".to_string()),
            ("tag",              request.tag.to_string()),
        ];
        if let Some(price) = request.price {
            form.push(("price", format!("{price:.2}")));
        }

        info!(
            symbol   = %request.symbol,
            quantity = request.quantity,
            side     = %request.transaction_type.as_str(),
            "🚀 [KITE] Placing order"
        );

        let response = self
            .authorized(self.client.post(&url))
            .form(&form)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Kite unreachable");
                BrokerError::Http(e)
            })?;

        let http_ok = response.status().is_success();
        let body = response.text().await?;
        let data: KiteOrderData = decode_envelope(http_ok, &body).map_err(|e| {
            warn!(error = %e, "Kite rejected order");
            e
        })?;

        Ok(data.order_id)
    }
}

impl Broker for KiteBroker {
    fn name(&self) -> &'static str {
        "zerodha"
    }
}
