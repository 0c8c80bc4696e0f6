//! Custom Axum extractors.
//!
//! - `CorrelationId`: the request's correlation id
//! - `ClientIp`: client IP address, through trusted proxies only
//! - `UserAgent`: the `User-Agent` header
//! - `FormInput`: a URL-encoded or JSON body as a JSON object
//! - `CurrentSession`, `CurrentUser`, `OptionalUser`: session and login state
//!
//! # Examples
//!
//! ```ignore
//! async fn handler(
//!     client_ip: ClientIp,
//!     CurrentUser(user): CurrentUser,
//!     FormInput(input): FormInput,
//! ) -> Result<Json<Response>, AppError> {
//!     tracing::info!(client_ip = %client_ip.0, user_id = %user.id, "Processing request");
//!     Ok(Json(response))
//! }
//! ```

use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::middleware::correlation::CORRELATION_ID_HEADER;
use crate::middleware::session::SessionHandle;
use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Request, connect_info::ConnectInfo},
    http::{HeaderMap, header::CONTENT_TYPE, request::Parts},
};
use dreamstart_auth::User;
use serde_json::{Map, Value};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use uuid::Uuid;

/// Correlation ID for request tracing.
///
/// Taken from the correlation middleware if installed, else from the
/// `X-Correlation-ID` header, else freshly generated.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(id) = parts.extensions.get::<Uuid>() {
            return Ok(Self(*id));
        }

        let correlation_id = parts
            .headers
            .get(CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);

        Ok(Self(correlation_id))
    }
}

/// Peers whose forwarding headers are believed.
///
/// Loopback addresses are always trusted. Install with
/// `Extension(TrustedProxies)`; without it only loopback is trusted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustedProxies(Vec<IpAddr>);

impl TrustedProxies {
    /// Trust loopback plus `addrs`.
    #[must_use]
    pub fn new(addrs: impl IntoIterator<Item = IpAddr>) -> Self {
        Self(addrs.into_iter().map(|ip| ip.to_canonical()).collect())
    }

    /// Whether `ip` is a trusted proxy.
    #[must_use]
    pub fn trusts(&self, ip: IpAddr) -> bool {
        let ip = ip.to_canonical();
        ip.is_loopback() || self.0.contains(&ip)
    }
}

/// Client IP address.
///
/// The connection peer (requires `into_make_service_with_connect_info`),
/// unless it is a [`TrustedProxies`] member. Then `X-Forwarded-For` is
/// walked from the right, skipping trusted hops, and `X-Real-IP` is used
/// when there is no `X-Forwarded-For`. Without connection info the
/// headers are ignored and the address is `127.0.0.1`.
#[derive(Debug, Clone, Copy)]
pub struct ClientIp(pub IpAddr);

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        let ip = match parts.extensions.get::<TrustedProxies>() {
            Some(trusted) => extract_client_ip(&parts.headers, peer, trusted),
            None => extract_client_ip(&parts.headers, peer, &TrustedProxies::default()),
        };

        Ok(Self(ip))
    }
}

fn extract_client_ip(headers: &HeaderMap, peer: Option<IpAddr>, trusted: &TrustedProxies) -> IpAddr {
    let Some(peer) = peer else {
        return IpAddr::V4(Ipv4Addr::LOCALHOST);
    };
    if !trusted.trusts(peer) {
        return peer;
    }

    let forwarded: Vec<IpAddr> = headers
        .get_all("X-Forwarded-For")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|ip| ip.trim().parse::<IpAddr>().ok())
        .collect();

    if forwarded.is_empty() {
        return headers
            .get("X-Real-IP")
            .and_then(|v| v.to_str().ok())
            .and_then(|ip| ip.trim().parse::<IpAddr>().ok())
            .unwrap_or(peer);
    }

    let mut client = peer;
    for hop in forwarded.into_iter().rev() {
        client = hop;
        if !trusted.trusts(hop) {
            break;
        }
    }
    client
}

/// `User-Agent` header, if sent.
#[derive(Debug, Clone)]
pub struct UserAgent(pub Option<String>);

#[async_trait]
impl<S> FromRequestParts<S> for UserAgent
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_agent = parts
            .headers
            .get("User-Agent")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok(Self(user_agent))
    }
}

/// A submitted form as a JSON object.
///
/// `application/json` bodies must be objects; anything else is decoded as
/// `application/x-www-form-urlencoded`, where a repeated key keeps its last
/// value.
#[derive(Debug, Clone)]
pub struct FormInput(pub Map<String, Value>);

#[async_trait]
impl<S> FromRequest<S> for FormInput
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::bad_request(e.body_text()))?;

        if is_json {
            return match serde_json::from_slice::<Value>(&bytes) {
                Ok(Value::Object(map)) => Ok(Self(map)),
                Ok(_) => Err(AppError::bad_request("Expected a JSON object")),
                Err(e) => Err(AppError::bad_request(format!("Invalid JSON body: {e}"))),
            };
        }

        let text = std::str::from_utf8(&bytes)
            .map_err(|_| AppError::bad_request("Form body is not valid UTF-8"))?;
        dreamstart_forms::input::from_urlencoded(text)
            .map(Self)
            .map_err(|e| AppError::bad_request(format!("Invalid form body: {e}")))
    }
}

/// The current session.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub SessionHandle);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionHandle>()
            .cloned()
            .map(Self)
            .ok_or_else(|| AppError::internal("Session middleware not installed"))
    }
}

/// The logged-in user; rejects with 401 otherwise.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .map(|AuthUser(user)| Self(user.clone()))
            .ok_or_else(|| AppError::unauthorized("Authentication required"))
    }
}

/// The logged-in user, if any.
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<User>);

#[async_trait]
impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .extensions
                .get::<AuthUser>()
                .map(|AuthUser(user)| user.clone()),
        ))
    }
}
