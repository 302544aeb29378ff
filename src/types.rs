//! Type definitions and aliases

use serde::{Deserialize, Serialize};
use std::fmt;

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// One of the two mail systems under test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// The mail system operated by us
    Internal,
    /// An independent third-party mail system
    External,
}

impl Side {
    /// The opposite side of the round trip
    pub fn peer(self) -> Self {
        match self {
            Side::Internal => Side::External,
            Side::External => Side::Internal,
        }
    }

    /// Lowercase name, as used in metric names and environment prefixes
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Internal => "internal",
            Side::External => "external",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a test message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Internal sender, external mailbox
    InternalToExternal,
    /// External sender, internal mailbox
    ExternalToInternal,
}

impl Direction {
    /// Both directions in round-trip order
    pub const ALL: [Direction; 2] = [Direction::InternalToExternal, Direction::ExternalToInternal];

    /// Side that submits the message
    pub fn sender(self) -> Side {
        match self {
            Direction::InternalToExternal => Side::Internal,
            Direction::ExternalToInternal => Side::External,
        }
    }

    /// Side whose mailbox receives the message
    pub fn recipient(self) -> Side {
        self.sender().peer()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::InternalToExternal => "internal_to_external",
            Direction::ExternalToInternal => "external_to_internal",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.sender(), self.recipient())
    }
}

/// Transport security mode for a mail connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportSecurity {
    /// TLS from the first byte (SMTPS on 465, IMAPS on 993)
    ImplicitTls,
    /// Plaintext connection upgraded with STARTTLS
    StartTls,
    /// No encryption at all
    Plaintext,
}

impl TransportSecurity {
    /// Submission security: implicit TLS only on the conventional secure port
    pub fn for_submission(use_tls: bool, port: u16) -> Self {
        match (use_tls, port) {
            (true, 465) => Self::ImplicitTls,
            (true, _) => Self::StartTls,
            (false, _) => Self::Plaintext,
        }
    }

    /// Mailbox security: either implicit TLS or nothing
    pub fn for_mailbox(use_ssl: bool) -> Self {
        if use_ssl {
            Self::ImplicitTls
        } else {
            Self::Plaintext
        }
    }

    pub fn is_encrypted(self) -> bool {
        !matches!(self, Self::Plaintext)
    }
}

impl fmt::Display for TransportSecurity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ImplicitTls => "implicit TLS",
            Self::StartTls => "STARTTLS",
            Self::Plaintext => "plaintext",
        };
        f.write_str(name)
    }
}

/// Result of a mailbox poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PollOutcome {
    /// The message arrived and was deleted
    Found,
    /// The deadline passed without a match
    NotFound,
}

impl PollOutcome {
    /// Whether the probe arrived in time
    pub fn is_found(self) -> bool {
        matches!(self, PollOutcome::Found)
    }
}

/// Lifecycle signal broadcast to long-running tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_roles() {
        assert_eq!(Direction::InternalToExternal.sender(), Side::Internal);
        assert_eq!(Direction::InternalToExternal.recipient(), Side::External);
        assert_eq!(Direction::ExternalToInternal.sender(), Side::External);
        assert_eq!(Direction::ExternalToInternal.recipient(), Side::Internal);
        assert_eq!(Direction::ALL[0], Direction::InternalToExternal);
    }

    #[test]
    fn test_submission_security_selection() {
        assert_eq!(TransportSecurity::for_submission(true, 465), TransportSecurity::ImplicitTls);
        assert_eq!(TransportSecurity::for_submission(true, 587), TransportSecurity::StartTls);
        assert_eq!(TransportSecurity::for_submission(false, 465), TransportSecurity::Plaintext);
        assert_eq!(TransportSecurity::for_submission(false, 25), TransportSecurity::Plaintext);
    }

    #[test]
    fn test_mailbox_security_selection() {
        assert_eq!(TransportSecurity::for_mailbox(true), TransportSecurity::ImplicitTls);
        assert_eq!(TransportSecurity::for_mailbox(false), TransportSecurity::Plaintext);
        assert!(!TransportSecurity::Plaintext.is_encrypted());
    }
}
