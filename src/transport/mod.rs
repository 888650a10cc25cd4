//! Transport seam between the polling client and the wire.
//!
//! The client only ever issues GETs; the request/response pair here is the
//! full surface a substitute transport has to honor. Swap in a fixture
//! transport through [`crate::JenkinsPollerBuilder::transport`] for
//! deterministic tests.

pub mod blocking_transport;

pub use blocking_transport::{BlockingTransport, DynBlockingTransport, UreqBlocking};

use http::{HeaderMap, Method, StatusCode};
use std::time::Duration;
use url::Url;

#[derive(Clone, Debug)]
pub struct TransportRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub timeout: Duration,
}

#[derive(Clone, Debug, Default)]
pub struct ResponseMeta {
    pub elapsed: Option<Duration>,
}

#[derive(Clone, Debug)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    pub meta: ResponseMeta,
}
