//! Mailbox reachability probing over SMTP
//!
//! A probe resolves the domain's mail exchangers, opens an SMTP session with
//! the preferred one and asks whether it would accept a recipient. The session
//! ends with `QUIT` right after `RCPT TO`; no message is ever sent.

use crate::config::MailConfig;
use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::ResolveErrorKind;
use hickory_resolver::TokioAsyncResolver;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Errors that leave a probe's outcome unknown
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("DNS lookup failed for {domain}: {reason}")]
    Dns { domain: String, reason: String },

    #[error("No mail server found for {0}")]
    NoMailServer(String),

    #[error("Failed to connect to {host}: {reason}")]
    Connect { host: String, reason: String },

    #[error("Timed out waiting for {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed SMTP reply: {0}")]
    Protocol(String),

    #[error("Server rejected {stage} with {code}: {message}")]
    Rejected {
        stage: String,
        code: u16,
        message: String,
    },
}

/// Checks whether a mail server would accept a recipient
///
/// `Ok(true)` means reachable, `Ok(false)` means the server refused the
/// recipient, and `Err` means the outcome is unknown.
#[async_trait]
pub trait MailboxProber: Send + Sync {
    async fn probe(&self, address: &str) -> Result<bool, ProbeError>;
}

/// Prober that talks SMTP to the domain's preferred mail exchanger
pub struct SmtpProber {
    resolver: TokioAsyncResolver,
    config: MailConfig,
}

impl SmtpProber {
    /// Creates a prober using the system resolver configuration
    ///
    /// Falls back to the default public resolver when the system
    /// configuration cannot be read.
    pub fn new(config: MailConfig) -> Self {
        let resolver = TokioAsyncResolver::tokio_from_system_conf().unwrap_or_else(|e| {
            tracing::warn!("System DNS configuration unavailable ({}), using defaults", e);
            TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
        });
        Self { resolver, config }
    }

    /// Looks up mail exchangers for a domain, most preferred first
    pub async fn mail_exchangers(&self, domain: &str) -> Result<Vec<String>, ProbeError> {
        let lookup = self.resolver.mx_lookup(domain).await.map_err(|e| {
            if matches!(e.kind(), ResolveErrorKind::NoRecordsFound { .. }) {
                ProbeError::NoMailServer(domain.to_string())
            } else {
                ProbeError::Dns {
                    domain: domain.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        let mut records: Vec<(u16, String)> = lookup
            .iter()
            .map(|mx| {
                let host = mx.exchange().to_utf8();
                (mx.preference(), host.trim_end_matches('.').to_string())
            })
            .filter(|(_, host)| !host.is_empty())
            .collect();
        records.sort_by_key(|(preference, _)| *preference);

        if records.is_empty() {
            return Err(ProbeError::NoMailServer(domain.to_string()));
        }
        Ok(records.into_iter().map(|(_, host)| host).collect())
    }

    /// Runs the SMTP recipient check against one exchanger
    pub async fn probe_exchanger(&self, exchanger: &str, address: &str) -> Result<bool, ProbeError> {
        let target = format!("{}:{}", exchanger, self.config.smtp_port);
        let stream = timeout(self.config.connect_timeout(), TcpStream::connect(&target))
            .await
            .map_err(|_| ProbeError::Timeout(format!("connection to {}", target)))?
            .map_err(|e| ProbeError::Connect {
                host: target.clone(),
                reason: e.to_string(),
            })?;

        check_recipient(
            stream,
            &self.config.helo_host,
            &self.config.from_address,
            address,
            self.config.command_timeout(),
        )
        .await
    }
}

#[async_trait]
impl MailboxProber for SmtpProber {
    async fn probe(&self, address: &str) -> Result<bool, ProbeError> {
        let domain = address
            .rsplit_once('@')
            .map(|(_, domain)| domain)
            .filter(|domain| !domain.is_empty())
            .ok_or_else(|| ProbeError::InvalidAddress(address.to_string()))?;

        let exchangers = self.mail_exchangers(domain).await?;
        // Sorted and non-empty
        let exchanger = &exchangers[0];

        tracing::debug!("Probing {} via {}", address, exchanger);
        let reachable = self.probe_exchanger(exchanger, address).await?;
        tracing::debug!("Probe {}: reachable={}", address, reachable);
        Ok(reachable)
    }
}

/// One parsed SMTP reply; multi-line replies are joined
#[derive(Debug)]
struct Reply {
    code: u16,
    message: String,
}

impl Reply {
    fn is_positive(&self) -> bool {
        (200..400).contains(&self.code)
    }
}

/// Drives the SMTP dialogue up to `RCPT TO` and reports the verdict
async fn check_recipient<S>(
    stream: S,
    helo_host: &str,
    from: &str,
    address: &str,
    command_timeout: Duration,
) -> Result<bool, ProbeError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut conn = BufReader::new(stream);

    let greeting = read_reply(&mut conn, command_timeout, "greeting").await?;
    expect_positive(&greeting, "greeting")?;

    let ehlo = command(&mut conn, &format!("EHLO {}", helo_host), command_timeout).await?;
    if !ehlo.is_positive() {
        let helo = command(&mut conn, &format!("HELO {}", helo_host), command_timeout).await?;
        expect_positive(&helo, "HELO")?;
    }

    let mail = command(&mut conn, &format!("MAIL FROM:<{}>", from), command_timeout).await?;
    expect_positive(&mail, "MAIL FROM")?;

    let rcpt = command(&mut conn, &format!("RCPT TO:<{}>", address), command_timeout).await?;
    let reachable = (200..300).contains(&rcpt.code);
    if !reachable && rcpt.code < 400 {
        return Err(ProbeError::Protocol(format!(
            "unexpected RCPT reply {} {}",
            rcpt.code, rcpt.message
        )));
    }

    // The verdict is already known; a failed QUIT does not change it
    if let Err(e) = command(&mut conn, "QUIT", command_timeout).await {
        tracing::debug!("QUIT failed after probing {}: {}", address, e);
    }

    Ok(reachable)
}

fn expect_positive(reply: &Reply, stage: &str) -> Result<(), ProbeError> {
    if reply.is_positive() {
        Ok(())
    } else {
        Err(ProbeError::Rejected {
            stage: stage.to_string(),
            code: reply.code,
            message: reply.message.clone(),
        })
    }
}

async fn command<S>(conn: &mut BufReader<S>, line: &str, limit: Duration) -> Result<Reply, ProbeError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let stage = line.split_whitespace().next().unwrap_or(line).to_string();
    let payload = format!("{}\r\n", line);
    timeout(limit, write_line(conn.get_mut(), &payload))
        .await
        .map_err(|_| ProbeError::Timeout(stage.clone()))??;

    read_reply(conn, limit, &stage).await
}

async fn write_line<S>(stream: &mut S, payload: &str) -> std::io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    stream.write_all(payload.as_bytes()).await?;
    stream.flush().await
}

async fn read_reply<S>(conn: &mut BufReader<S>, limit: Duration, stage: &str) -> Result<Reply, ProbeError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    timeout(limit, read_reply_lines(conn))
        .await
        .map_err(|_| ProbeError::Timeout(stage.to_string()))?
}

async fn read_reply_lines<S>(conn: &mut BufReader<S>) -> Result<Reply, ProbeError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut lines = Vec::new();
    loop {
        let mut line = String::new();
        if conn.read_line(&mut line).await? == 0 {
            return Err(ProbeError::Protocol("connection closed".to_string()));
        }
        let line = line.trim_end().to_string();
        let code: u16 = line
            .get(..3)
            .and_then(|code| code.parse().ok())
            .ok_or_else(|| ProbeError::Protocol(line.clone()))?;

        // "250-" continues a multi-line reply, "250 " or "250" ends it
        let last = line.as_bytes().get(3) != Some(&b'-');
        lines.push(line.get(4..).unwrap_or("").to_string());
        if last {
            return Ok(Reply {
                code,
                message: lines.join(" "),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    /// Plays the server side of a dialogue: sends each reply after reading one
    /// client line (the first reply is the greeting)
    async fn scripted_server(
        server: tokio::io::DuplexStream,
        replies: Vec<&'static str>,
    ) -> Vec<String> {
        let mut conn = BufReader::new(server);
        let mut received = Vec::new();
        let mut replies = replies.into_iter();

        if let Some(greeting) = replies.next() {
            conn.get_mut().write_all(greeting.as_bytes()).await.unwrap();
        }
        for reply in replies {
            let mut line = String::new();
            if conn.read_line(&mut line).await.unwrap() == 0 {
                break;
            }
            received.push(line.trim_end().to_string());
            conn.get_mut().write_all(reply.as_bytes()).await.unwrap();
        }
        received
    }

    async fn run_dialogue(replies: Vec<&'static str>) -> (Result<bool, ProbeError>, Vec<String>) {
        let (client, server) = duplex(4096);
        let server = tokio::spawn(scripted_server(server, replies));
        let result = check_recipient(
            client,
            "probe.local",
            "probe@example.org",
            "jane@example.com",
            Duration::from_secs(2),
        )
        .await;
        let received = server.await.unwrap();
        (result, received)
    }

    #[tokio::test]
    async fn test_accepted_recipient_is_reachable() {
        let (result, received) = run_dialogue(vec![
            "220 mx.example.com ESMTP\r\n",
            "250-mx.example.com\r\n250-SIZE 1000\r\n250 OK\r\n",
            "250 OK\r\n",
            "250 Accepted\r\n",
            "221 Bye\r\n",
        ])
        .await;

        assert!(result.unwrap());
        assert_eq!(
            received,
            vec![
                "EHLO probe.local",
                "MAIL FROM:<probe@example.org>",
                "RCPT TO:<jane@example.com>",
                "QUIT",
            ]
        );
    }

    #[tokio::test]
    async fn test_rejected_recipient_is_not_reachable() {
        let (result, _) = run_dialogue(vec![
            "220 mx.example.com ESMTP\r\n",
            "250 mx.example.com\r\n",
            "250 OK\r\n",
            "550 5.1.1 No such user\r\n",
            "221 Bye\r\n",
        ])
        .await;

        assert!(!result.unwrap());
    }

    #[tokio::test]
    async fn test_helo_fallback() {
        let (result, received) = run_dialogue(vec![
            "220 old.example.com\r\n",
            "502 Command not implemented\r\n",
            "250 old.example.com\r\n",
            "250 OK\r\n",
            "251 User not local; will forward\r\n",
            "221 Bye\r\n",
        ])
        .await;

        assert!(result.unwrap());
        assert_eq!(received[1], "HELO probe.local");
    }

    #[tokio::test]
    async fn test_negative_greeting_is_an_error() {
        let (result, _) = run_dialogue(vec!["554 No SMTP service here\r\n"]).await;
        assert!(matches!(
            result,
            Err(ProbeError::Rejected { code: 554, .. })
        ));
    }

    #[tokio::test]
    async fn test_rejected_sender_is_an_error() {
        let (result, _) = run_dialogue(vec![
            "220 mx.example.com\r\n",
            "250 mx.example.com\r\n",
            "553 Sender rejected\r\n",
        ])
        .await;
        assert!(matches!(result, Err(ProbeError::Rejected { .. })));
    }

    #[tokio::test]
    async fn test_garbage_reply_is_a_protocol_error() {
        let (result, _) = run_dialogue(vec!["hello there\r\n"]).await;
        assert!(matches!(result, Err(ProbeError::Protocol(_))));
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let (client, _server) = duplex(64);
        let result = check_recipient(
            client,
            "probe.local",
            "probe@example.org",
            "jane@example.com",
            Duration::from_millis(50),
        )
        .await;
        assert!(matches!(result, Err(ProbeError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_probe_rejects_address_without_domain() {
        let prober = SmtpProber::new(MailConfig::default());
        let result = prober.probe("not-an-address").await;
        assert!(matches!(result, Err(ProbeError::InvalidAddress(_))));
    }
}
