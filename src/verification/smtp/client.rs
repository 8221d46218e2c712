//! Lettre-backed SMTP prober.
//!
//! The session is a transient plaintext connection on port 25: greet, declare
//! the envelope sender, ask for the recipient, quit. `SmtpConnection` is
//! blocking, so the whole session runs on the blocking thread pool and never
//! stalls the scheduler.

use std::net::ToSocketAddrs;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use lettre::transport::smtp::client::SmtpConnection;
use lettre::transport::smtp::commands::{Ehlo, Mail, Rcpt};
use lettre::transport::smtp::extension::ClientId;
use lettre::Address;

use crate::core::config::Config;
use crate::verification::identity::ProbeIdentity;
use crate::verification::smtp::{ProbeVerdict, SmtpProbe};

const SMTP_PORT: u16 = 25;

/// Production prober speaking SMTP through lettre.
pub struct LettreProber {
    timeout: Duration,
}

impl LettreProber {
    pub fn new(config: &Config) -> Self {
        Self {
            timeout: config.smtp_timeout,
        }
    }
}

#[async_trait]
impl SmtpProbe for LettreProber {
    async fn probe(&self, address: &str, mx_host: &str, identity: &ProbeIdentity) -> ProbeVerdict {
        let address = address.to_string();
        let mx_host = mx_host.to_string();
        let identity = identity.clone();
        let timeout = self.timeout;

        let session = tokio::task::spawn_blocking(move || {
            run_session(&address, &mx_host, &identity, timeout)
        })
        .await;

        match session {
            Ok(verdict) => verdict,
            Err(e) => ProbeVerdict::ProtocolError {
                message: format!("Probe task failed: {e}"),
            },
        }
    }
}

fn run_session(
    address: &str,
    mx_host: &str,
    identity: &ProbeIdentity,
    timeout: Duration,
) -> ProbeVerdict {
    let recipient = match Address::from_str(address) {
        Ok(addr) => addr,
        Err(e) => {
            return ProbeVerdict::ProtocolError {
                message: format!("Recipient not expressible in SMTP: {e}"),
            }
        }
    };
    let sender = match Address::from_str(&identity.sender) {
        Ok(addr) => addr,
        Err(e) => {
            return ProbeVerdict::ProtocolError {
                message: format!("Configured sender '{}' invalid: {e}", identity.sender),
            }
        }
    };

    let socket_addr = match (mx_host, SMTP_PORT).to_socket_addrs() {
        Ok(mut addrs) => match addrs.next() {
            Some(addr) => addr,
            None => {
                return ProbeVerdict::ConnectionFailed {
                    message: format!("No reachable address for mail server {mx_host}"),
                }
            }
        },
        Err(e) => {
            return ProbeVerdict::ConnectionFailed {
                message: format!("Could not resolve mail server {mx_host}: {e}"),
            }
        }
    };

    let helo = ClientId::Domain(identity.helo_host.clone());
    tracing::debug!(target: "smtp_task",
        "Connecting to {} at {} (HELO {}, sender {})",
        mx_host, socket_addr, identity.helo_host, identity.sender);

    let mut conn = match SmtpConnection::connect(socket_addr, Some(timeout), &helo, None, None) {
        Ok(conn) => conn,
        Err(e) => {
            tracing::debug!(target: "smtp_task", "Connection to {} failed: {}", mx_host, e);
            return classify_session_error(&e);
        }
    };

    match conn.command(Ehlo::new(helo.clone())) {
        Ok(response) if response.is_positive() => {}
        Ok(response) => {
            let message = join_reply(&response);
            tracing::debug!(target: "smtp_task",
                "EHLO rejected by {}: {} {}", mx_host, response.code(), message);
            conn.quit().ok();
            return ProbeVerdict::ProtocolError {
                message: format!("EHLO rejected: {} {}", response.code(), message),
            };
        }
        Err(e) => {
            conn.quit().ok();
            return classify_session_error(&e);
        }
    }

    match conn.command(Mail::new(Some(sender), vec![])) {
        Ok(response) if response.is_positive() => {}
        Ok(response) => {
            let message = join_reply(&response);
            tracing::debug!(target: "smtp_task",
                "MAIL FROM:<{}> rejected by {}: {} {}",
                identity.sender, mx_host, response.code(), message);
            conn.quit().ok();
            return ProbeVerdict::ProtocolError {
                message: format!("MAIL FROM rejected: {} {}", response.code(), message),
            };
        }
        Err(e) => {
            conn.quit().ok();
            return classify_session_error(&e);
        }
    }

    tracing::debug!(target: "smtp_task", "RCPT TO:<{}> via {}", address, mx_host);
    let verdict = match conn.command(Rcpt::new(recipient, vec![])) {
        Ok(response) => {
            let code = response.code().to_string().parse::<u16>().unwrap_or(0);
            let message = join_reply(&response);
            if code == 250 {
                ProbeVerdict::Accepted {
                    message: format!("{code} {message}"),
                }
            } else {
                ProbeVerdict::Rejected {
                    code,
                    message: format!("{code} {message}"),
                }
            }
        }
        Err(e) => {
            // Lettre folds negative replies into errors; recover the reply
            // code so a refusal is not mistaken for a transport failure.
            let text = e.to_string();
            match reply_code(&text) {
                Some(code) => ProbeVerdict::Rejected {
                    code,
                    message: text,
                },
                None => classify_session_error(&e),
            }
        }
    };

    conn.quit().ok();
    tracing::debug!(target: "smtp_task", "Verdict for <{}> via {}: {:?}", address, mx_host, verdict);
    verdict
}

fn join_reply(response: &lettre::transport::smtp::response::Response) -> String {
    response.message().collect::<Vec<&str>>().join(" ")
}

/// Finds the first SMTP reply code (4xx/5xx) embedded in error text.
fn reply_code(text: &str) -> Option<u16> {
    text.split(|c: char| !c.is_ascii_digit())
        .filter(|chunk| chunk.len() == 3)
        .filter_map(|chunk| chunk.parse::<u16>().ok())
        .find(|code| (400..600).contains(code))
}

fn classify_session_error(err: &lettre::transport::smtp::Error) -> ProbeVerdict {
    classify_error_text(err.to_string())
}

fn classify_error_text(text: String) -> ProbeVerdict {
    let lowered = text.to_lowercase();
    let is_connection = lowered.contains("timed out")
        || lowered.contains("timeout")
        || lowered.contains("connection refused")
        || lowered.contains("connection reset")
        || lowered.contains("connection closed")
        || lowered.contains("broken pipe")
        || lowered.contains("network is unreachable")
        || lowered.contains("incomplete response");
    if is_connection {
        ProbeVerdict::ConnectionFailed { message: text }
    } else {
        ProbeVerdict::ProtocolError { message: text }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_code_extraction() {
        assert_eq!(
            reply_code("permanent error (550): 5.1.1 user unknown"),
            Some(550)
        );
        assert_eq!(reply_code("transient error (451): greylisted"), Some(451));
        assert_eq!(reply_code("connection timed out"), None);
        // Enhanced status digits must not be mistaken for a reply code.
        assert_eq!(reply_code("5.1.1 no code here"), None);
    }

    #[test]
    fn connection_errors_are_distinguished() {
        let connection_cases = [
            "connection timed out",
            "Connection refused (os error 111)",
            "Connection reset by peer",
            "incomplete response",
        ];
        for text in connection_cases {
            assert!(
                matches!(
                    classify_error_text(text.to_string()),
                    ProbeVerdict::ConnectionFailed { .. }
                ),
                "{text}"
            );
        }
        assert!(matches!(
            classify_error_text("invalid response from server".to_string()),
            ProbeVerdict::ProtocolError { .. }
        ));
    }
}
