use super::{ResponseMeta, TransportRequest, TransportResponse};
use crate::error::{Error, TransportErrorKind};
use http::Method;
use std::{sync::Arc, time::Duration, time::Instant};
use ureq::Agent;

/// Trait implemented by any blocking HTTP layer.
///
/// Implementations must be safe to call from concurrent call sites; the
/// client shares one transport across every poll.
pub trait BlockingTransport: Send + Sync + 'static {
    fn send(&self, req: TransportRequest) -> Result<TransportResponse, Error>;
}

pub type DynBlockingTransport = Arc<dyn BlockingTransport>;

impl<T: BlockingTransport + ?Sized> BlockingTransport for Arc<T> {
    fn send(&self, req: TransportRequest) -> Result<TransportResponse, Error> {
        (**self).send(req)
    }
}

/// Default blocking transport built on `ureq`.
#[derive(Clone)]
pub struct UreqBlocking {
    agent: Agent,
}

impl UreqBlocking {
    /// Construct a new transport.
    ///
    /// * `insecure` – accept invalid TLS certificates.
    /// * `ua` – User-Agent header.
    /// * `timeout` / `connect_timeout` / `read_timeout` – global, connect
    ///   and body-read deadlines.
    /// * `no_proxy` – ignore system proxy environment variables.
    pub fn try_new(
        insecure: bool,
        ua: &str,
        timeout: Duration,
        connect_timeout: Duration,
        read_timeout: Duration,
        no_proxy: bool,
    ) -> Result<Self, Error> {
        let mut builder = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .timeout_connect(Some(connect_timeout))
            .timeout_recv_body(Some(read_timeout))
            .user_agent(ua);

        if no_proxy {
            builder = builder.proxy(None);
        }

        if insecure {
            builder = builder.tls_config(
                ureq::tls::TlsConfig::builder()
                    .disable_verification(true)
                    .build(),
            );
        }

        Ok(Self {
            agent: Agent::new_with_config(builder.build()),
        })
    }
}

impl BlockingTransport for UreqBlocking {
    fn send(&self, req: TransportRequest) -> Result<TransportResponse, Error> {
        let TransportRequest {
            method,
            url,
            headers,
            timeout,
        } = req;
        let path = url.path().to_string().into_boxed_str();
        let method_for_error = method.clone();

        let map_err = move |err: ureq::Error| {
            let kind = match &err {
                ureq::Error::Timeout(_) => TransportErrorKind::Timeout,
                ureq::Error::HostNotFound | ureq::Error::ConnectionFailed => {
                    TransportErrorKind::Connect
                }
                ureq::Error::Io(io) if io.kind() == std::io::ErrorKind::TimedOut => {
                    TransportErrorKind::Timeout
                }
                ureq::Error::Io(io)
                    if matches!(
                        io.kind(),
                        std::io::ErrorKind::ConnectionRefused
                            | std::io::ErrorKind::ConnectionReset
                            | std::io::ErrorKind::ConnectionAborted
                            | std::io::ErrorKind::NotConnected
                    ) =>
                {
                    TransportErrorKind::Connect
                }
                _ => TransportErrorKind::Other,
            };

            Error::Transport {
                method: method_for_error.clone(),
                path: path.clone(),
                kind,
                source: Box::new(err),
            }
        };

        // Everything the CI server exposes to this client is a read.
        if method != Method::GET {
            return Err(Error::InvalidConfig {
                message: format!("unsupported HTTP method for polling transport: {method}")
                    .into_boxed_str(),
                source: None,
            });
        }

        let started = Instant::now();
        let mut request = self.agent.get(url.as_str());
        for (name, value) in headers.iter() {
            request = request.header(name, value);
        }
        let mut response = request
            .config()
            .timeout_global(Some(timeout))
            .build()
            .call()
            .map_err(&map_err)?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()
            .map_err(&map_err)?;

        Ok(TransportResponse {
            status,
            headers,
            body,
            meta: ResponseMeta {
                elapsed: Some(started.elapsed()),
            },
        })
    }
}
