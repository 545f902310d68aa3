//! Request forwarding to a single origin.
//!
//! # Responsibilities
//! - Bind a forwarding handle to one origin URL at construction
//! - Rewrite inbound requests onto that origin, preserving path and query
//! - Stream the origin's response back without buffering
//!
//! # Design Decisions
//! - All handles share one pooled hyper client; the handle only fixes the
//!   scheme and authority
//! - Transport failures surface as `ForwardError` so the dispatcher can
//!   run its retry policy

use std::fmt;

use axum::body::{Body, Bytes};
use axum::http::request::Parts;
use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{Request, Response, Uri};
use hyper::body::Incoming;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use thiserror::Error;
use url::Url;

/// Errors produced while forwarding a request to an origin.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("failed to build upstream request: {0}")]
    Request(#[from] axum::http::Error),

    #[error("upstream transport error: {0}")]
    Transport(#[from] hyper_util::client::legacy::Error),
}

/// Forwarding capability bound to a single origin.
///
/// Cheap to clone; the underlying client connection pool is shared.
#[derive(Clone)]
pub struct ProxyHandle {
    origin: Url,
    scheme: Scheme,
    authority: Authority,
    client: Client<HttpConnector, Body>,
}

impl ProxyHandle {
    /// Bind a handle to `origin`. Fails if the URL cannot be expressed as
    /// HTTP URI components.
    pub fn new(origin: Url, client: Client<HttpConnector, Body>) -> Result<Self, ForwardError> {
        let scheme = Scheme::try_from(origin.scheme()).map_err(axum::http::Error::from)?;
        let authority =
            Authority::try_from(origin.authority()).map_err(axum::http::Error::from)?;
        Ok(Self {
            origin,
            scheme,
            authority,
            client,
        })
    }

    /// The origin this handle is bound to.
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Forward a buffered inbound request to the bound origin.
    ///
    /// The response body is left streaming; the caller hands it straight
    /// back to the client.
    pub async fn forward(
        &self,
        parts: &Parts,
        body: Bytes,
    ) -> Result<Response<Incoming>, ForwardError> {
        let mut uri_parts = parts.uri.clone().into_parts();
        uri_parts.scheme = Some(self.scheme.clone());
        uri_parts.authority = Some(self.authority.clone());
        if uri_parts.path_and_query.is_none() {
            uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
        }
        let uri = Uri::from_parts(uri_parts).map_err(axum::http::Error::from)?;

        let mut builder = Request::builder()
            .method(parts.method.clone())
            .uri(uri)
            .version(parts.version);
        if let Some(headers) = builder.headers_mut() {
            for (name, value) in parts.headers.iter() {
                headers.insert(name.clone(), value.clone());
            }
        }
        let request = builder.body(Body::from(body))?;

        Ok(self.client.request(request).await?)
    }
}

impl fmt::Debug for ProxyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyHandle")
            .field("origin", &self.origin.as_str())
            .finish_non_exhaustive()
    }
}
