/* src/middleware.rs */

use axum::{
    extract::{ConnectInfo, Request},
    http::{HeaderMap, request::Parts},
    response::Response,
};
use futures_util::future::BoxFuture;
use std::{
    convert::Infallible,
    net::SocketAddr,
    task::{Context, Poll},
};
use tower::{Layer, Service};
use tracing::debug;

use crate::enricher::{ClientInfo, Enricher};
use crate::extractor::{self, ConnectionInfo};

/// Headers where only the first line counts when a request repeats them.
const SINGLE_VALUE_HEADERS: &[&str] = &["user-agent"];

/// Layer that attaches [`ClientInfo`] to every request.
///
/// The client IP is resolved from proxy headers, then from connection
/// info: a [`ConnectionInfo`] extension if one was inserted by an earlier
/// layer, otherwise axum's `ConnectInfo<SocketAddr>`. The inner service is
/// always called, whatever the outcome.
///
/// # Examples
///
/// ```rust,no_run
/// use axum::{Router, routing::get};
/// use client_info::{ClientInfo, ClientInfoLayer};
/// use tower::ServiceBuilder;
///
/// async fn handler(info: ClientInfo) -> String {
///     format!("{:?}", info.ip)
/// }
///
/// let app: Router = Router::new()
///     .route("/", get(handler))
///     .layer(ServiceBuilder::new().layer(ClientInfoLayer::default()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ClientInfoLayer {
    enricher: Enricher,
}

impl ClientInfoLayer {
    /// Create a layer with the default extractor and the woothee classifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a layer around a configured enricher.
    pub fn with_enricher(enricher: Enricher) -> Self {
        Self { enricher }
    }
}

impl<S> Layer<S> for ClientInfoLayer {
    type Service = ClientInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ClientInfoService {
            inner,
            enricher: self.enricher.clone(),
        }
    }
}

/// Service that enriches requests with [`ClientInfo`].
#[derive(Debug, Clone)]
pub struct ClientInfoService<S> {
    inner: S,
    enricher: Enricher,
}

impl<S> Service<Request> for ClientInfoService<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let header_map = headers_to_map(req.headers());
        let connection = connection_info(req.extensions());

        let info = self.enricher.enrich(&header_map, connection.as_ref());
        debug!(uri = %req.uri(), ip = ?info.ip, "attached client info");
        req.extensions_mut().insert(info);

        let future = self.inner.call(req);
        Box::pin(async move { future.await })
    }
}

/// Connection addresses for the request, if the server exposed any.
fn connection_info(extensions: &axum::http::Extensions) -> Option<ConnectionInfo> {
    if let Some(connection) = extensions.get::<ConnectionInfo>() {
        return Some(connection.clone());
    }

    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| ConnectionInfo::from(*addr))
}

/// Convert Axum headers to our internal header map format.
///
/// Repeated headers are joined with `", "` in arrival order, which keeps
/// multi-line `X-Forwarded-For` chains intact, except for
/// [`SINGLE_VALUE_HEADERS`] where the first line wins. Values that are not
/// visible ASCII are dropped.
fn headers_to_map(headers: &HeaderMap) -> extractor::HeaderMap {
    let mut map = extractor::HeaderMap::new();

    for (name, value) in headers.iter() {
        let Ok(value) = value.to_str() else {
            continue;
        };

        let name = name.as_str().to_lowercase();
        let single = SINGLE_VALUE_HEADERS.contains(&name.as_str());

        map.entry(name)
            .and_modify(|existing: &mut String| {
                if !single {
                    existing.push_str(", ");
                    existing.push_str(value);
                }
            })
            .or_insert_with(|| value.to_string());
    }

    map
}

/// Axum extractor for the client info attached by [`ClientInfoLayer`].
///
/// Without the layer, the request parts are enriched on the spot with the
/// default extractor and the woothee classifier.
///
/// # Examples
///
/// ```rust,no_run
/// use axum::{response::Json, routing::get, Router};
/// use client_info::{ClientInfo, ClientInfoLayer};
///
/// async fn handler(info: ClientInfo) -> Json<ClientInfo> {
///     Json(info)
/// }
///
/// let app: Router = Router::new()
///     .route("/", get(handler))
///     .layer(ClientInfoLayer::default());
/// ```
impl<S> axum::extract::FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(info) = parts.extensions.get::<ClientInfo>() {
            return Ok(info.clone());
        }

        let header_map = headers_to_map(&parts.headers);
        let connection = connection_info(&parts.extensions);

        Ok(Enricher::default().enrich(&header_map, connection.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, body::Body, routing::get};
    use tower::ServiceExt;

    async fn echo(info: ClientInfo) -> Json<ClientInfo> {
        Json(info)
    }

    fn app() -> Router {
        Router::new()
            .route("/", get(echo))
            .layer(ClientInfoLayer::default())
    }

    async fn send(router: Router, req: axum::http::Request<Body>) -> serde_json::Value {
        let res = router.oneshot(req).await.unwrap();
        assert_eq!(res.status(), axum::http::StatusCode::OK);
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_layer_attaches_client_info() {
        let req = axum::http::Request::builder()
            .uri("/")
            .header("X-Forwarded-For", "unknown, 203.0.113.1:8080, 10.0.0.1")
            .header(
                "User-Agent",
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
            )
            .body(Body::empty())
            .unwrap();

        let json = send(app(), req).await;
        assert_eq!(json["ip"], "203.0.113.1");
        assert_eq!(json["agent"]["browser"]["name"], "Chrome");
        assert_eq!(json["agent"]["os"]["name"], "Windows 10");
    }

    #[tokio::test]
    async fn test_layer_falls_back_to_connect_info() {
        let mut req = axum::http::Request::builder()
            .uri("/")
            .body(Body::empty())
            .unwrap();
        let addr: SocketAddr = "[::ffff:192.168.1.1]:5000".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));

        let json = send(app(), req).await;
        assert_eq!(json["ip"], "192.168.1.1");
        assert_eq!(json["agent"]["browser"]["name"], "UNKNOWN");
    }

    #[tokio::test]
    async fn test_layer_prefers_connection_info_extension() {
        let mut req = axum::http::Request::builder()
            .uri("/")
            .body(Body::empty())
            .unwrap();
        let addr: SocketAddr = "10.9.9.9:5000".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        req.extensions_mut().insert(
            ConnectionInfo::new()
                .with_remote_address("unknown")
                .with_info_remote_address("2001:db8::7"),
        );

        let json = send(app(), req).await;
        assert_eq!(json["ip"], "2001:db8::7");
    }

    #[tokio::test]
    async fn test_layer_reports_missing_ip_and_still_calls_handler() {
        let req = axum::http::Request::builder()
            .uri("/")
            .header("x-real-ip", "definitely not an ip")
            .body(Body::empty())
            .unwrap();

        let json = send(app(), req).await;
        assert!(json["ip"].is_null());
    }

    #[tokio::test]
    async fn test_repeated_forwarded_for_lines_form_one_chain() {
        let req = axum::http::Request::builder()
            .uri("/")
            .header("x-forwarded-for", "unknown")
            .header("x-forwarded-for", "198.51.100.23")
            .body(Body::empty())
            .unwrap();

        let json = send(app(), req).await;
        assert_eq!(json["ip"], "198.51.100.23");
    }

    #[tokio::test]
    async fn test_extractor_without_layer() {
        let router = Router::new().route("/", get(echo));
        let req = axum::http::Request::builder()
            .uri("/")
            .header("x-client-ip", "198.51.100.7")
            .header(
                "user-agent",
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
            )
            .body(Body::empty())
            .unwrap();

        let json = send(router, req).await;
        assert_eq!(json["ip"], "198.51.100.7");
        assert_eq!(json["agent"]["browser"]["name"], "Firefox");
        assert_eq!(json["agent"]["os"]["name"], "Windows 10");
    }

    #[tokio::test]
    async fn test_extractor_without_layer_or_user_agent() {
        let router = Router::new().route("/", get(echo));
        let req = axum::http::Request::builder()
            .uri("/")
            .body(Body::empty())
            .unwrap();

        let json = send(router, req).await;
        assert!(json["ip"].is_null());
        assert_eq!(json["agent"]["browser"]["name"], "UNKNOWN");
    }

    #[tokio::test]
    async fn test_repeated_user_agent_keeps_first_line() {
        let req = axum::http::Request::builder()
            .uri("/")
            .header(
                "user-agent",
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
            )
            .header(
                "user-agent",
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
            )
            .body(Body::empty())
            .unwrap();

        let json = send(app(), req).await;
        assert_eq!(json["agent"]["browser"]["name"], "Firefox");
        assert_eq!(json["agent"]["browser"]["version"], "121.0.");
    }

    #[test]
    fn test_headers_to_map_lowercases_and_joins() {
        let mut headers = HeaderMap::new();
        headers.append("x-forwarded-for", "192.0.2.1".parse().unwrap());
        headers.append("x-forwarded-for", "192.0.2.2".parse().unwrap());
        headers.insert("x-real-ip", "192.0.2.3".parse().unwrap());

        let map = headers_to_map(&headers);
        assert_eq!(map["x-forwarded-for"], "192.0.2.1, 192.0.2.2");
        assert_eq!(map["x-real-ip"], "192.0.2.3");
    }

    #[test]
    fn test_headers_to_map_keeps_first_user_agent() {
        let mut headers = HeaderMap::new();
        headers.append("user-agent", "first/1.0".parse().unwrap());
        headers.append("user-agent", "second/2.0".parse().unwrap());

        let map = headers_to_map(&headers);
        assert_eq!(map["user-agent"], "first/1.0");
    }
}
