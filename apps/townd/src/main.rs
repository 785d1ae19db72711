use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use towncore::TownRegistry;
use tracing::{info, Level};

mod broker;
mod http;
mod ws;

fn usage_and_exit() -> ! {
    eprintln!(
        "townd (virtual-town host)\n\n\
USAGE:\n  townd [--bind HOST:PORT]\n\n\
ENV:\n  TOWND_BIND             default 0.0.0.0:8081\n  TOWND_TOWN_CAPACITY    default 50\n  TOWND_MEDIA_URL        optional; external media-token endpoint (POST)\n  TOWND_MEDIA_AUTH       required if TOWND_MEDIA_URL set\n  TOWND_MEDIA_TIMEOUT_S  default 5\n"
    );
    std::process::exit(2);
}

#[derive(Clone, Debug)]
struct Config {
    bind: SocketAddr,
    town_capacity: usize,
    media_url: Option<String>,
    media_auth: Option<String>,
    media_timeout_s: u64,
}

fn parse_args() -> Config {
    let mut bind: SocketAddr = std::env::var("TOWND_BIND")
        .unwrap_or_else(|_| "0.0.0.0:8081".to_string())
        .parse()
        .unwrap_or_else(|_| usage_and_exit());

    let town_capacity: usize = std::env::var("TOWND_TOWN_CAPACITY")
        .unwrap_or_else(|_| "50".to_string())
        .parse()
        .unwrap_or_else(|_| usage_and_exit());

    let media_url = std::env::var("TOWND_MEDIA_URL").ok();
    let media_auth = std::env::var("TOWND_MEDIA_AUTH").ok();
    let media_timeout_s: u64 = std::env::var("TOWND_MEDIA_TIMEOUT_S")
        .unwrap_or_else(|_| "5".to_string())
        .parse()
        .unwrap_or_else(|_| usage_and_exit());

    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--bind" => {
                let v = it.next().unwrap_or_else(|| usage_and_exit());
                bind = v.parse().unwrap_or_else(|_| usage_and_exit());
            }
            "-h" | "--help" => usage_and_exit(),
            _ => usage_and_exit(),
        }
    }

    Config {
        bind,
        town_capacity,
        media_url,
        media_auth,
        media_timeout_s,
    }
}

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<TownRegistry>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,townd=info".into()),
        )
        .with_target(false)
        .with_max_level(Level::INFO)
        .init();

    let cfg = parse_args();
    let media = broker::from_config(&cfg)?;
    let registry = Arc::new(TownRegistry::with_capacity(media, cfg.town_capacity));
    let state = AppState { registry };

    let app = Router::new()
        .route("/healthz", get(|| async { "ok\n" }))
        .route("/towns", post(http::create_town).get(http::list_towns))
        .route(
            "/towns/:town_id",
            patch(http::update_town).delete(http::delete_town),
        )
        .route("/sessions", post(http::join_town))
        .route("/conversationAreas", post(http::create_conversation_area))
        .route("/ws", get(ws::town_socket))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    info!(bind = %cfg.bind, "townd listening");
    let listener = tokio::net::TcpListener::bind(cfg.bind).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
