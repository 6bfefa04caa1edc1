//! HTTP fetch probe for archive and API crawling.
use super::{Probe, ProbeContext, Verdict};
use crate::error::{ConfigError, ProbeError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::form_urlencoded;

/// Placeholder replaced by the unit. Inside the query string the unit is
/// percent-encoded.
pub const UNIT_PLACEHOLDER: &str = "{unit}";
/// Placeholder replaced by the scan host.
pub const HOST_PLACEHOLDER: &str = "{host}";
/// Bodies are read up to this many bytes.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// What a 2xx body must look like to count as reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentCheck {
    #[default]
    NonEmpty,
    Json,
}

/// Reachable when the templated URL answers 2xx with acceptable content.
///
/// ```rust
/// use probekit::probes::HttpFetchProbe;
///
/// let probe = HttpFetchProbe::new("http://{host}/wayback/available?url={unit}").unwrap();
/// assert!(HttpFetchProbe::new("https://example.com/").is_err());
/// # drop(probe);
/// ```
pub struct HttpFetchProbe {
    client: Client,
    template: String,
    check: ContentCheck,
    max_body_bytes: usize,
}

impl HttpFetchProbe {
    pub fn new(template: impl Into<String>) -> Result<Self, ProbeError> {
        let client = Client::builder()
            .user_agent(concat!("probekit/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Self::with_client(template, client)
    }

    /// Uses a caller-configured client (proxies, TLS roots, headers).
    pub fn with_client(template: impl Into<String>, client: Client) -> Result<Self, ProbeError> {
        let template = template.into();
        if !template.contains(UNIT_PLACEHOLDER) {
            return Err(ConfigError::InvalidTemplate(template).into());
        }

        Ok(Self {
            client,
            template,
            check: ContentCheck::default(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        })
    }

    pub fn with_check(mut self, check: ContentCheck) -> Self {
        self.check = check;
        self
    }

    /// Caps how much of a response body is read.
    pub fn with_body_limit(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    /// Expands the template for one unit.
    pub fn url_for(&self, ctx: &ProbeContext<'_>) -> String {
        let unit = ctx.unit.to_string();
        let template = self.template.replace(HOST_PLACEHOLDER, ctx.host);

        match template.split_once('?') {
            Some((head, query)) => {
                let encoded: String = form_urlencoded::byte_serialize(unit.as_bytes()).collect();
                format!(
                    "{}?{}",
                    head.replace(UNIT_PLACEHOLDER, &unit),
                    query.replace(UNIT_PLACEHOLDER, &encoded)
                )
            }
            None => template.replace(UNIT_PLACEHOLDER, &unit),
        }
    }
}

/// Body bytes read so far and whether the limit cut the read short.
struct Body {
    bytes: Vec<u8>,
    truncated: bool,
}

async fn read_body(mut response: reqwest::Response, limit: usize) -> Result<Body, reqwest::Error> {
    if response.content_length().is_some_and(|len| len > limit as u64) {
        return Ok(Body {
            bytes: Vec::new(),
            truncated: true,
        });
    }

    let mut bytes = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        let room = limit - bytes.len();
        if chunk.len() > room {
            bytes.extend_from_slice(&chunk[..room]);
            return Ok(Body {
                bytes,
                truncated: true,
            });
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(Body {
        bytes,
        truncated: false,
    })
}

#[async_trait]
impl Probe for HttpFetchProbe {
    fn name(&self) -> &'static str {
        "http-fetch"
    }

    async fn probe(&self, ctx: &ProbeContext<'_>, limit: Duration) -> Result<Verdict, ProbeError> {
        let url = self.url_for(ctx);

        let response = match self.client.get(&url).timeout(limit).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => return Ok(Verdict::inconclusive("request timed out")),
            Err(e) if e.is_connect() => {
                return Ok(Verdict::not_found(format!("connection failed: {e}")));
            }
            Err(e) => return Err(e.into()),
        };

        let status = response.status();
        if !status.is_success() {
            return Ok(Verdict::not_found(format!("HTTP {status}")));
        }

        let body = match read_body(response, self.max_body_bytes).await {
            Ok(body) => body,
            Err(e) if e.is_timeout() => return Ok(Verdict::inconclusive("body read timed out")),
            Err(e) => return Err(e.into()),
        };

        debug!(
            url = %url,
            status = status.as_u16(),
            bytes = body.bytes.len(),
            truncated = body.truncated,
            "fetched"
        );
        Ok(check_content(self.check, status.as_u16(), &body, self.max_body_bytes))
    }
}

fn check_content(check: ContentCheck, status: u16, body: &Body, limit: usize) -> Verdict {
    if body.truncated {
        return match check {
            ContentCheck::NonEmpty => {
                Verdict::reachable(Some(format!("HTTP {status}, more than {limit} bytes")))
            }
            ContentCheck::Json => Verdict::not_found(format!("body exceeds {limit} bytes")),
        };
    }

    let blank = body.bytes.iter().all(u8::is_ascii_whitespace);
    let accepted = match check {
        ContentCheck::NonEmpty => !blank,
        ContentCheck::Json => serde_json::from_slice::<serde_json::Value>(&body.bytes).is_ok(),
    };

    if accepted {
        Verdict::reachable(Some(format!("HTTP {status}, {} bytes", body.bytes.len())))
    } else if blank {
        Verdict::not_found("empty body")
    } else {
        Verdict::not_found("unparseable content")
    }
}
