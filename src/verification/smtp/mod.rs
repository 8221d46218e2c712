//! SMTP probing: asks a mail exchanger whether it would accept a recipient,
//! without ever transmitting a message body.

pub(crate) mod client;

pub use client::LettreProber;

use async_trait::async_trait;

use crate::verification::identity::ProbeIdentity;

/// Outcome of a single SMTP probe against one mail exchanger.
#[derive(Debug, Clone)]
pub enum ProbeVerdict {
    /// RCPT TO answered with reply code 250.
    Accepted { message: String },
    /// The server answered with any other reply code.
    Rejected { code: u16, message: String },
    /// Connect failure, unexpected disconnect, or timeout.
    ConnectionFailed { message: String },
    /// Any other library-level failure during the session.
    ProtocolError { message: String },
}

impl ProbeVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    /// Server message or error text carried by the verdict.
    pub fn message(&self) -> &str {
        match self {
            Self::Accepted { message }
            | Self::ConnectionFailed { message }
            | Self::ProtocolError { message } => message,
            Self::Rejected { message, .. } => message,
        }
    }
}

/// Narrow SMTP collaborator contract consumed by the validation engine.
#[async_trait]
pub trait SmtpProbe: Send + Sync {
    /// Probes `address` against `mx_host`, greeting as `identity.helo_host`
    /// and declaring `identity.sender` as envelope sender.
    async fn probe(&self, address: &str, mx_host: &str, identity: &ProbeIdentity) -> ProbeVerdict;
}
