//! TCP connect probe with optional banner grabbing.
use super::{Probe, ProbeContext, Verdict, buffer_pool::BufferPool};
use crate::error::ProbeError;
use async_trait::async_trait;
use std::{io, sync::Arc, time::Duration};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    time::{Instant, timeout},
};
use tracing::trace;

/// Ports that usually wait for the client to speak first.
const HTTP_PORTS: [u16; 4] = [80, 443, 8080, 8443];

/// Bounds for the best-effort banner read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BannerOptions {
    pub max_bytes: usize,
    pub read_timeout: Duration,
}

impl Default for BannerOptions {
    fn default() -> Self {
        Self {
            max_bytes: 512,
            read_timeout: Duration::from_secs(1),
        }
    }
}

/// Reachable when a TCP handshake with `(host, port)` completes.
///
/// With [`with_banner`](Self::with_banner) the probe also reads whatever the
/// service sends first and puts it in the outcome's detail. A silent HTTP
/// port gets one `GET /` to provoke a status line. The banner phase only
/// gets whatever is left of the probe's time limit after the handshake, and
/// banner failures never change the verdict.
pub struct TcpConnectProbe {
    banner: Option<BannerOptions>,
    buffers: Arc<BufferPool>,
}

impl Default for TcpConnectProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl TcpConnectProbe {
    pub fn new() -> Self {
        Self {
            banner: None,
            buffers: Arc::new(BufferPool::new()),
        }
    }

    pub fn with_banner(mut self, options: BannerOptions) -> Self {
        self.banner = Some(options);
        self
    }

    async fn grab_banner(
        &self,
        mut stream: TcpStream,
        host: &str,
        port: u16,
        options: BannerOptions,
    ) -> Option<String> {
        let mut buf = self.buffers.get(options.max_bytes);
        let mut len = read_some(&mut stream, &mut buf, options.read_timeout).await;

        if len == 0 && HTTP_PORTS.contains(&port) {
            let request = format!("GET / HTTP/1.1\r\nHost: {host}\r\n\r\n");
            if let Ok(Ok(())) = timeout(options.read_timeout, stream.write_all(request.as_bytes())).await {
                len = read_some(&mut stream, &mut buf, options.read_timeout).await;
            }
        }

        let banner = decode_banner(&buf[..len]);
        self.buffers.put(buf);
        banner
    }
}

#[async_trait]
impl Probe for TcpConnectProbe {
    fn name(&self) -> &'static str {
        "tcp-connect"
    }

    async fn probe(&self, ctx: &ProbeContext<'_>, limit: Duration) -> Result<Verdict, ProbeError> {
        let Some(port) = ctx.unit.as_port() else {
            return Err(ProbeError::UnsupportedUnit(ctx.unit.to_string()));
        };

        let started = Instant::now();
        match timeout(limit, TcpStream::connect((ctx.host, port))).await {
            Ok(Ok(stream)) => {
                let Some(options) = self.banner else {
                    return Ok(Verdict::reachable(None));
                };
                let remaining = limit.saturating_sub(started.elapsed());
                let banner = timeout(remaining, self.grab_banner(stream, ctx.host, port, options))
                    .await
                    .unwrap_or_else(|_| {
                        trace!(host = ctx.host, port, "banner read cut off at the probe limit");
                        None
                    });
                Ok(Verdict::reachable(banner))
            }
            Ok(Err(e)) => {
                trace!(host = ctx.host, port, error = %e, "connect failed");
                Ok(classify_connect_error(&e))
            }
            Err(_) => Ok(Verdict::inconclusive("connection timed out")),
        }
    }
}

/// Refusals and resets are definite; everything else leaves the port's
/// state unknown.
fn classify_connect_error(e: &io::Error) -> Verdict {
    match e.kind() {
        io::ErrorKind::ConnectionRefused | io::ErrorKind::ConnectionReset => {
            Verdict::not_found(format!("connection refused: {e}"))
        }
        io::ErrorKind::TimedOut => Verdict::inconclusive(format!("connection timed out: {e}")),
        _ => Verdict::inconclusive(format!("connection error: {e}")),
    }
}

async fn read_some(stream: &mut TcpStream, buf: &mut [u8], limit: Duration) -> usize {
    match timeout(limit, stream.read(buf)).await {
        Ok(Ok(n)) => n,
        _ => 0,
    }
}

fn decode_banner(raw: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(raw);
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{probes::ProbeStatus, targets::Unit};
    use tokio::net::TcpListener;

    async fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        port
    }

    #[tokio::test]
    async fn test_tcp_open_port_is_reachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let unit = Unit::Port(port);
        let ctx = ProbeContext {
            host: "127.0.0.1",
            unit: &unit,
        };

        let verdict = TcpConnectProbe::new()
            .probe(&ctx, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(verdict, Verdict::reachable(None));
    }

    #[tokio::test]
    async fn test_tcp_closed_port_is_not_found() {
        let unit = Unit::Port(closed_port().await);
        let ctx = ProbeContext {
            host: "127.0.0.1",
            unit: &unit,
        };

        let verdict = TcpConnectProbe::new()
            .probe(&ctx, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(verdict.status, ProbeStatus::NotFound);
        assert!(verdict.detail.unwrap().starts_with("connection refused"));
    }

    #[tokio::test]
    async fn test_tcp_banner_is_captured() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket.write_all(b"SSH-2.0-OpenSSH_9.6\r\n").await.unwrap();
        });

        let unit = Unit::Port(port);
        let ctx = ProbeContext {
            host: "127.0.0.1",
            unit: &unit,
        };
        let verdict = TcpConnectProbe::new()
            .with_banner(BannerOptions::default())
            .probe(&ctx, Duration::from_secs(1))
            .await
            .unwrap();

        assert!(verdict.is_reachable());
        assert_eq!(verdict.detail.as_deref(), Some("SSH-2.0-OpenSSH_9.6"));
    }

    #[tokio::test]
    async fn test_tcp_silent_service_stays_reachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(2)).await;
        });

        let unit = Unit::Port(port);
        let ctx = ProbeContext {
            host: "127.0.0.1",
            unit: &unit,
        };
        let verdict = TcpConnectProbe::new()
            .with_banner(BannerOptions {
                max_bytes: 64,
                read_timeout: Duration::from_millis(100),
            })
            .probe(&ctx, Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(verdict, Verdict::reachable(None));
    }

    #[tokio::test]
    async fn test_tcp_banner_phase_stays_within_the_limit() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let unit = Unit::Port(port);
        let ctx = ProbeContext {
            host: "127.0.0.1",
            unit: &unit,
        };
        let started = std::time::Instant::now();
        let verdict = TcpConnectProbe::new()
            .with_banner(BannerOptions::default())
            .probe(&ctx, Duration::from_millis(300))
            .await
            .unwrap();

        assert_eq!(verdict, Verdict::reachable(None));
        assert!(started.elapsed() < Duration::from_millis(900));
    }

    #[tokio::test]
    async fn test_tcp_rejects_name_units() {
        let unit = Unit::Name("www.example.com".to_string());
        let ctx = ProbeContext {
            host: "127.0.0.1",
            unit: &unit,
        };
        let err = TcpConnectProbe::new()
            .probe(&ctx, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::UnsupportedUnit(_)));
    }

    #[test]
    fn test_tcp_decode_banner() {
        assert_eq!(decode_banner(b"  \r\n"), None);
        assert_eq!(decode_banner(b"220 ftp ready\r\n").as_deref(), Some("220 ftp ready"));
        assert_eq!(
            decode_banner(&[0x48, 0x69, 0xff]).as_deref(),
            Some("Hi\u{fffd}")
        );
    }
}
