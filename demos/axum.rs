/* demos/axum.rs */

use axum::{Router, extract::ConnectInfo, http::HeaderMap, response::Json, routing::get};
use client_info::{ClientInfo, ClientInfoLayer, Enricher, IpExtractor, IpSource};
use serde_json::json;
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .init();

    let app = create_app();
    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();

    println!("Server starting on http://localhost:3000");
    println!("Test endpoints:");
    println!("  • GET /              - Client info as JSON (default layer)");
    println!("  • GET /direct        - Client info using only the socket address");
    println!("  • GET /debug         - Client info next to the raw connection details");
    println!();
    println!("Test with headers:");
    println!("  curl -H 'X-Client-IP: 203.0.113.42' http://localhost:3000/");
    println!("  curl -H 'X-Forwarded-For: unknown, 198.51.100.1:8080' http://localhost:3000/");
    println!("  curl -H 'CF-Connecting-IP: 192.0.2.100' http://localhost:3000/direct");
    println!();

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}

fn create_app() -> Router {
    let default_router = Router::new()
        .route("/", get(info_handler))
        .route("/debug", get(debug_handler))
        .layer(ServiceBuilder::new().layer(ClientInfoLayer::default()));

    let direct_enricher = Enricher::default()
        .with_extractor(IpExtractor::new().with_sources(vec![IpSource::ConnectionRemote]));
    let direct_router = Router::new()
        .route("/", get(info_handler))
        .layer(ClientInfoLayer::with_enricher(direct_enricher));

    default_router.nest("/direct", direct_router)
}

/// Returns the attached client info unchanged
async fn info_handler(info: ClientInfo) -> Json<ClientInfo> {
    Json(info)
}

/// Debug handler showing the client info next to what the socket saw
async fn debug_handler(
    info: ClientInfo,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Json<serde_json::Value> {
    let ip_headers: std::collections::HashMap<&str, String> = IpSource::DEFAULT_PRIORITY
        .iter()
        .filter_map(|source| source.header_name())
        .filter_map(|name| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(|value| (name, value.to_string()))
        })
        .collect();
    let ip_matches_connection = info.ip.as_deref() == Some(addr.ip().to_string().as_str());

    Json(json!({
        "client_info": info,
        "connection_info": {
            "remote_addr": addr.to_string(),
            "remote_ip": addr.ip().to_string(),
            "remote_port": addr.port(),
        },
        "ip_related_headers": ip_headers,
        "analysis": {
            "ip_source": if ip_headers.is_empty() {
                "connection_fallback"
            } else {
                "header_extraction"
            },
            "ip_matches_connection": ip_matches_connection,
        }
    }))
}
