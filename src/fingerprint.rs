// src/fingerprint.rs
use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use http::request::Parts;
use http::HeaderMap;

const FORWARDED_FOR: &str = "x-forwarded-for";
const UNKNOWN: &str = "unknown";

/// Weak voter identity used only to deduplicate votes: the caller's network address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoterFingerprint(pub String);

impl VoterFingerprint {
    /// First proxy-reported address, else the peer address, else `"unknown"`.
    pub fn resolve(headers: &HeaderMap, peer: Option<SocketAddr>) -> Self {
        let forwarded = headers
            .get(FORWARDED_FOR)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|first| !first.is_empty());

        let fingerprint = match (forwarded, peer) {
            (Some(first), _) => first.to_string(),
            (None, Some(addr)) => addr.ip().to_string(),
            (None, None) => UNKNOWN.to_string(),
        };

        Self(fingerprint)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for VoterFingerprint
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Ok(Self::resolve(&parts.headers, peer))
    }
}
