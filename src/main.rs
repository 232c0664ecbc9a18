use axum::extract::Extension;
use axum::routing::get;
use axum::Router;
use distributed_cache::error::CacheError;
use distributed_cache::group::{new_group, Group, LoaderFn};
use distributed_cache::registry::{EtcdRegistry, MemoryRegistry, Registry};
use distributed_cache::server::handlers::handle_api_get;
use distributed_cache::server::protocol::ENDPOINT_API;
use distributed_cache::server::Server;
use std::collections::HashMap;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut port: u16 = 8001;
    let mut api = false;
    let mut api_addr = "127.0.0.1:9999".to_string();
    let mut registry_endpoint = "127.0.0.1:2379".to_string();
    let mut mem_registry = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--port" => {
                port = args[i + 1].parse()?;
                i += 2;
            }
            "--api" => {
                api = true;
                i += 1;
            }
            "--api-addr" => {
                api_addr = args[i + 1].clone();
                i += 2;
            }
            "--registry" => {
                registry_endpoint = args[i + 1].clone();
                i += 2;
            }
            "--mem-registry" => {
                mem_registry = true;
                i += 1;
            }
            _ => {
                i += 1;
            }
        }
    }

    let addr = format!("127.0.0.1:{}", port);
    tracing::info!("Starting cache node on {}", addr);

    let group = create_group();

    let registry: Arc<dyn Registry> = if mem_registry {
        tracing::info!("Using in-process registry (single-node mode)");
        Arc::new(MemoryRegistry::new())
    } else {
        tracing::info!("Using registry at {}", registry_endpoint);
        Arc::new(EtcdRegistry::new(vec![registry_endpoint]))
    };

    let server = Server::with_registry(&addr, registry)?;
    group.register_peers(server.clone());

    if api {
        let group = group.clone();
        let api_addr = api_addr.clone();
        tokio::spawn(async move {
            if let Err(e) = serve_api(&api_addr, group).await {
                tracing::error!("front-end api failed: {}", e);
            }
        });
    }

    server.start().await
}

/// The demo group: a 2 KiB cache over a mock slow source of student scores.
fn create_group() -> Arc<Group> {
    let db: HashMap<String, String> = [("Tom", "630"), ("Jack", "589"), ("Sam", "567")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    new_group(
        "scores",
        2 << 10,
        Arc::new(LoaderFn::new(move |key: String| {
            let value = db.get(&key).cloned();
            async move {
                tracing::info!("[source] search key {}", key);
                value
                    .map(String::into_bytes)
                    .ok_or(CacheError::NotFound(key))
            }
        })),
    )
}

/// Public read endpoint: `GET /api?key=<k>` returns the raw value bytes.
async fn serve_api(addr: &str, group: Arc<Group>) -> anyhow::Result<()> {
    let app = Router::new()
        .route(ENDPOINT_API, get(handle_api_get))
        .layer(Extension(group));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("front-end api listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
