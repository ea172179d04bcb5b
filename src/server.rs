//! WebSocket transport.
//!
//! A thin request/response relay over the scanning core: each connected
//! session can trigger the two refresh operations and run scans. Sessions
//! are independent; a session dropping mid-scan just loses its reply.

use crate::arbitrage::{self, ScanFilter, ScanOutcome};
use crate::config::AppConfig;
use crate::errors::Result;
use crate::models::VenueFailure;
use crate::snapshot::SnapshotStore;
use crate::venue::VenueRegistry;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{info, warn};
use uuid::Uuid;

/// Everything a session needs to serve requests.
pub struct App {
    pub config: AppConfig,
    pub venues: VenueRegistry,
    pub store: SnapshotStore,
}

fn default_scope() -> String {
    "all".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum Request {
    Handshake,
    FetchCurrencies,
    FetchTickers,
    SearchArbitrage {
        #[serde(default = "default_scope")]
        starting_exchange: String,
        #[serde(default = "default_scope")]
        ending_exchange: String,
        min_profit: Option<f64>,
        max_profit: Option<f64>,
    },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum Response {
    Handshake { data: String },
    Currencies { failures: Vec<VenueFailure> },
    Tickers { failures: Vec<VenueFailure> },
    Arbitrage { data: ScanOutcome },
    Error { data: String },
}

/// Accept WebSocket sessions forever.
pub async fn run(app: std::sync::Arc<App>) -> Result<()> {
    let listener = TcpListener::bind(&app.config.bind_addr).await?;
    info!(addr = %app.config.bind_addr, "transport listening");

    loop {
        let (stream, peer) = listener.accept().await?;
        let app = app.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_session(&app, stream).await {
                warn!(%peer, error = %e, "session ended with error");
            }
        });
    }
}

async fn handle_session(app: &App, stream: TcpStream) -> Result<()> {
    let ws = accept_async(stream).await?;
    let session = Uuid::new_v4();
    info!(%session, "client connected");

    let (mut sink, mut source) = ws.split();
    while let Some(msg) = source.next().await {
        match msg? {
            Message::Text(txt) => {
                let reply = dispatch(app, &txt).await;
                sink.send(Message::Text(serde_json::to_string(&reply)?)).await?;
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    info!(%session, "client disconnected");
    Ok(())
}

async fn dispatch(app: &App, raw: &str) -> Response {
    match serde_json::from_str::<Request>(raw) {
        Ok(Request::Handshake) => Response::Handshake {
            data: "Successfully connected".to_string(),
        },
        Ok(Request::FetchCurrencies) => Response::Currencies {
            failures: app.store.refresh_chains().await,
        },
        Ok(Request::FetchTickers) => Response::Tickers {
            failures: app.store.refresh_quotes().await,
        },
        Ok(Request::SearchArbitrage {
            starting_exchange,
            ending_exchange,
            min_profit,
            max_profit,
        }) => {
            let filter = ScanFilter {
                source_venue: starting_exchange,
                dest_venue: ending_exchange,
                min_profit,
                max_profit,
            };
            let outcome = arbitrage::scan(&app.store, &app.venues, &app.config, &filter).await;
            Response::Arbitrage { data: outcome }
        }
        Err(e) => Response::Error {
            data: format!("unrecognized message: {e}"),
        },
    }
}
