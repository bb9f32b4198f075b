use axum::{
    extract::{ConnectInfo, Request},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::net::{IpAddr, SocketAddr};
use tracing::{field, info_span, Instrument};
use uuid::Uuid;

pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Tracing identity for one request.
///
/// `correlation_id` may arrive from the caller and is propagated across
/// service boundaries; `request_id` is always minted here and identifies this
/// hop alone.
#[derive(Debug, Clone)]
pub struct CorrelationContext {
    pub correlation_id: String,
    pub request_id: String,
    pub client_ip: Option<IpAddr>,
}

/// Resolve the client IP address.
///
/// Proxy headers are consulted first (`X-Forwarded-For` first entry, then
/// `X-Real-IP`) but only when `trust_proxy_headers` is set; otherwise, and as
/// the final fallback, the socket-level remote address is used. Trusting
/// proxy headers is only sound behind a trusted reverse proxy.
pub fn client_ip(request: &Request, trust_proxy_headers: bool) -> Option<IpAddr> {
    if trust_proxy_headers {
        if let Some(ip) = forwarded_ip(request.headers()) {
            return Some(ip);
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Ok(forwarded_str) = forwarded.to_str() {
            // First entry is the originating client.
            if let Some(first) = forwarded_str.split(',').next() {
                if let Ok(ip) = first.trim().parse::<IpAddr>() {
                    return Some(ip);
                }
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            if let Ok(ip) = ip_str.parse::<IpAddr>() {
                return Some(ip);
            }
        }
    }

    None
}

/// Correlation middleware.
///
/// Honors an inbound non-blank `X-Correlation-ID`, always mints a fresh
/// `X-Request-ID`, and runs the rest of the pipeline inside a tracing span
/// carrying both plus the client IP. The span is scoped to the request
/// future, so its fields can never leak into another request on a reused
/// worker; there is no thread-local to clear. Both identifiers are echoed as
/// response headers.
pub fn correlation_middleware(
    trust_proxy_headers: bool,
) -> impl Fn(Request, Next) -> std::pin::Pin<Box<dyn std::future::Future<Output = Response> + Send>>
       + Clone {
    move |request: Request, next: Next| {
        Box::pin(async move {
            let correlation_id = request
                .headers()
                .get(CORRELATION_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map_or_else(|| Uuid::new_v4().to_string(), String::from);

            // Never taken from the client.
            let request_id = Uuid::new_v4().to_string();
            let ip = client_ip(&request, trust_proxy_headers);

            let client_ip_str = ip.map(|i| i.to_string()).unwrap_or_default();
            let span = info_span!(
                "request",
                correlation_id = %correlation_id,
                request_id = %request_id,
                client_ip = %client_ip_str,
                user_id = field::Empty,
            );

            let mut request = request;
            request.extensions_mut().insert(CorrelationContext {
                correlation_id: correlation_id.clone(),
                request_id: request_id.clone(),
                client_ip: ip,
            });

            let mut response = next.run(request).instrument(span).await;

            let headers = response.headers_mut();
            headers.insert(
                CORRELATION_ID_HEADER,
                HeaderValue::from_str(&correlation_id)
                    .unwrap_or_else(|_| HeaderValue::from_static("invalid")),
            );
            headers.insert(
                REQUEST_ID_HEADER,
                HeaderValue::from_str(&request_id)
                    .unwrap_or_else(|_| HeaderValue::from_static("invalid")),
            );

            response
        })
    }
}
