//! High-level blocking polling client.

use crate::{
    Auth, Error,
    error::Result,
    mapper,
    model::{BuildInformation, JobNames, ProjectStatus},
    transport::{
        TransportRequest,
        blocking_transport::{DynBlockingTransport, UreqBlocking},
    },
    util::url::{api_xml_url, endpoint_url, normalize_base_url, sanitize_url_for_error},
};
use http::{HeaderMap, Method};
use std::{sync::Arc, time::Duration};
use tracing::field;
use url::Url;
use xmltree::Element;

const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

const BODY_SNIPPET_MAX: usize = 4096;

/// Configures and constructs [`JenkinsPoller`].
pub struct JenkinsPollerBuilder {
    base_url: Url,
    auth: Option<Auth>,
    insecure: bool,
    user_agent: String,
    timeout: Duration,
    connect_timeout: Duration,
    read_timeout: Duration,
    no_proxy: bool,
    default_headers: HeaderMap,
    transport: Option<DynBlockingTransport>,
}

impl JenkinsPollerBuilder {
    fn try_new(base: impl AsRef<str>) -> Result<Self> {
        let base_url = normalize_base_url(base.as_ref())?;
        Ok(Self {
            base_url,
            auth: None,
            insecure: false,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(30),
            no_proxy: false,
            default_headers: HeaderMap::new(),
            transport: None,
        })
    }

    pub fn auth(mut self, auth: Auth) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn auth_basic(mut self, user: impl Into<String>, token: impl Into<String>) -> Self {
        self.auth = Some(Auth::basic(user, token));
        self
    }

    pub fn no_system_proxy(mut self) -> Self {
        self.no_proxy = true;
        self
    }

    pub fn danger_accept_invalid_certs(mut self, yes: bool) -> Self {
        self.insecure = yes;
        self
    }

    /// Override the default `User-Agent` header.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = ua.into();
        self
    }

    pub fn timeout(mut self, value: Duration) -> Self {
        self.timeout = value;
        self
    }

    pub fn connect_timeout(mut self, value: Duration) -> Self {
        self.connect_timeout = value;
        self
    }

    pub fn read_timeout(mut self, value: Duration) -> Self {
        self.read_timeout = value;
        self
    }

    pub fn default_header(
        mut self,
        name: http::header::HeaderName,
        value: http::HeaderValue,
    ) -> Self {
        self.default_headers.insert(name, value);
        self
    }

    pub fn default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers.extend(headers);
        self
    }

    /// Swap out the underlying transport; the fixture seam for tests.
    pub fn transport(mut self, transport: DynBlockingTransport) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<JenkinsPoller> {
        let transport: DynBlockingTransport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(UreqBlocking::try_new(
                self.insecure,
                &self.user_agent,
                self.timeout,
                self.connect_timeout,
                self.read_timeout,
                self.no_proxy,
            )?),
        };

        Ok(JenkinsPoller {
            inner: Arc::new(Inner {
                base: self.base_url,
                auth: self.auth,
                timeout: self.timeout,
                default_headers: self.default_headers,
                transport,
            }),
        })
    }
}

/// Blocking polling client for the Jenkins XML API.
///
/// Cloning is cheap and every operation takes `&self`; no state is shared
/// between calls beyond the transport, so concurrent polls from independent
/// call sites are safe. Scheduling, retries, and rate limiting belong to
/// the calling host.
#[derive(Clone)]
pub struct JenkinsPoller {
    inner: Arc<Inner>,
}

struct Inner {
    base: Url,
    auth: Option<Auth>,
    timeout: Duration,
    default_headers: HeaderMap,
    transport: DynBlockingTransport,
}

impl JenkinsPoller {
    pub fn builder(base: impl AsRef<str>) -> Result<JenkinsPollerBuilder> {
        JenkinsPollerBuilder::try_new(base)
    }

    pub fn new(base: impl AsRef<str>) -> Result<Self> {
        Self::builder(base)?.build()
    }

    /// Enumerate every job the server lists under `<base>/api/xml`.
    ///
    /// The result is a set: duplicated names in the listing collapse to one
    /// entry, and an empty listing yields an empty set. Entries missing a
    /// name are skipped.
    pub fn all_jobs(&self) -> Result<JobNames> {
        let url = endpoint_url(&self.inner.base, ["api", "xml"])?;
        let doc = self.fetch_document(&url)?;
        Ok(mapper::job_names(&doc, &url))
    }

    /// Poll one job's normalized status.
    ///
    /// `job_url` is either the job page URL or its `api/xml` endpoint. When
    /// the status document names a last build, a secondary fetch of its
    /// detail document fills in `last_build_label` / `last_build_time`; if
    /// that enrichment fails for any reason the primary status is still
    /// returned, carrying over the timing fields of `previous` when one is
    /// supplied.
    pub fn project_status(
        &self,
        job_url: &str,
        previous: Option<&ProjectStatus>,
    ) -> Result<ProjectStatus> {
        let url = api_xml_url(job_url)?;
        let doc = self.fetch_document(&url)?;
        let mut status = mapper::project_status(&doc, &url)?;

        let enriched = mapper::last_build_url(&doc).and_then(|build_url| {
            match self.build_information(&build_url) {
                Ok(info) => Some(info),
                Err(err) => {
                    tracing::warn!(
                        job = %status.name,
                        build_url = %build_url,
                        error = %err,
                        "build detail fetch failed, returning status without fresh timing"
                    );
                    None
                }
            }
        });

        match enriched {
            Some(info) => {
                status.last_build_label = Some(info.number);
                status.last_build_time = Some(info.timestamp);
            }
            None => {
                if let Some(previous) = previous {
                    status.last_build_label = previous.last_build_label.clone();
                    status.last_build_time = previous.last_build_time;
                }
            }
        }

        Ok(status)
    }

    /// Fetch and map one build's detail document.
    pub fn build_information(&self, build_url: &str) -> Result<BuildInformation> {
        let url = api_xml_url(build_url)?;
        let doc = self.fetch_document(&url)?;
        mapper::build_information(&doc, &url)
    }

    /// One GET, one parse: the raw element tree behind an endpoint.
    ///
    /// Exposed so hosts can capture sample documents; the higher-level
    /// operations consume the tree without retaining it.
    pub fn fetch_document(&self, url: &Url) -> Result<Element> {
        let resp = self.execute_get(url)?;
        Element::parse(resp.body.as_slice()).map_err(|source| Error::Parse {
            status: resp.status,
            method: Method::GET,
            path: url.path().to_string().into_boxed_str(),
            source: Box::new(source),
        })
    }

    fn execute_get(&self, url: &Url) -> Result<crate::transport::TransportResponse> {
        let mut headers = self.inner.default_headers.clone();
        if let Some(auth) = &self.inner.auth {
            auth.apply(&mut headers)?;
        }

        let span = tracing::info_span!(
            "jenkins.poll",
            http.method = %Method::GET,
            http.host = %url.host_str().unwrap_or_default(),
            http.path = %url.path(),
            http.status = field::Empty,
            latency_ms = field::Empty,
            error_kind = field::Empty,
        );
        let _enter = span.enter();

        let resp = match self.inner.transport.send(TransportRequest {
            method: Method::GET,
            url: url.clone(),
            headers,
            timeout: self.inner.timeout,
        }) {
            Ok(resp) => resp,
            Err(err) => {
                span.record("error_kind", field::debug(err.kind()));
                return Err(err);
            }
        };

        span.record("http.status", resp.status.as_u16() as i64);
        if let Some(elapsed) = resp.meta.elapsed {
            span.record("latency_ms", elapsed.as_millis() as i64);
        }

        if resp.status.is_client_error() || resp.status.is_server_error() {
            let err = Error::from_http(crate::HttpError {
                status: resp.status,
                method: Method::GET,
                url: Box::new(sanitize_url_for_error(url)),
                body_snippet: body_snippet(&resp.body),
            });
            span.record("error_kind", field::debug(err.kind()));
            return Err(err);
        }

        Ok(resp)
    }
}

fn body_snippet(body: &[u8]) -> Option<Box<str>> {
    if body.is_empty() {
        return None;
    }
    let text = String::from_utf8_lossy(body);
    let mut end = text.len().min(BODY_SNIPPET_MAX);
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    Some(text[..end].into())
}
