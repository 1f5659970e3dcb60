//! Write-path stage contract shared with the host pipeline.
//!
//! A stage sees each outgoing packet before it is encoded and answers with
//! one of the host's control signals. Stages are chained by the host; this
//! crate only provides the vocabulary and one stage (the dispatcher).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::packet::Packet;

/// Control signal returned by a write stage.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome<P> {
    /// Hand the (possibly annotated) packet to the next stage.
    Continue(P),
    /// Drop this packet; the link stays up.
    Stop,
    /// Drop this packet and tear the link down.
    ///
    /// Part of the host vocabulary; the gate never emits it.
    Disconnect,
}

impl<P> DispatchOutcome<P> {
    /// Returns `true` if the packet continues down the pipeline.
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue(_))
    }

    /// Returns `true` if the packet was halted.
    pub fn is_stop(&self) -> bool {
        matches!(self, Self::Stop)
    }

    /// Returns `true` if the link should be torn down.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Self::Disconnect)
    }

    /// The continuing packet, if any.
    pub fn into_packet(self) -> Option<P> {
        match self {
            Self::Continue(p) => Some(p),
            Self::Stop | Self::Disconnect => None,
        }
    }
}

/// Tri-state empty-data policy handed through to the host stage base.
///
/// The gate never interprets it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum AllowEmptyData {
    /// Host default applies.
    #[default]
    Unset,
    Allow,
    Deny,
}

impl AllowEmptyData {
    /// Parse an interface parameter: `nil`/`none`/empty, `true` or `false`.
    ///
    /// # Errors
    ///
    /// `ConfigError::InvalidEmptyDataPolicy` for anything else.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "nil" | "none" | "null" => Ok(Self::Unset),
            "true" => Ok(Self::Allow),
            "false" => Ok(Self::Deny),
            _ => Err(ConfigError::InvalidEmptyDataPolicy {
                value: raw.to_string(),
            }),
        }
    }

    pub fn as_option(self) -> Option<bool> {
        self.into()
    }
}

impl From<Option<bool>> for AllowEmptyData {
    fn from(value: Option<bool>) -> Self {
        match value {
            None => Self::Unset,
            Some(true) => Self::Allow,
            Some(false) => Self::Deny,
        }
    }
}

impl From<AllowEmptyData> for Option<bool> {
    fn from(value: AllowEmptyData) -> Self {
        match value {
            AllowEmptyData::Unset => None,
            AllowEmptyData::Allow => Some(true),
            AllowEmptyData::Deny => Some(false),
        }
    }
}

/// A stage in the host's command write path.
///
/// # Errors
///
/// `write_packet` only fails for configuration problems (e.g. the packet
/// schema lacks a field the stage needs). Per-packet failures are reported as
/// [`DispatchOutcome::Stop`].
#[async_trait]
pub trait WriteProtocol<P: Packet + 'static>: Send + Sync {
    /// Stage name for logs.
    fn name(&self) -> &'static str;

    /// Empty-data policy for the host's stage base.
    fn allow_empty_data(&self) -> AllowEmptyData;

    /// Inspect a packet before encoding and decide its fate.
    async fn write_packet(&self, packet: P) -> Result<DispatchOutcome<P>, ConfigError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_helpers() {
        let cont: DispatchOutcome<u8> = DispatchOutcome::Continue(7);
        assert!(cont.is_continue());
        assert!(!cont.is_stop());
        assert_eq!(cont.into_packet(), Some(7));

        let stop: DispatchOutcome<u8> = DispatchOutcome::Stop;
        assert!(stop.is_stop());
        assert_eq!(stop.into_packet(), None);

        let disconnect: DispatchOutcome<u8> = DispatchOutcome::Disconnect;
        assert!(disconnect.is_disconnect());
        assert_eq!(disconnect.into_packet(), None);
    }

    #[test]
    fn test_allow_empty_data_parse() {
        assert_eq!(AllowEmptyData::parse("nil").unwrap(), AllowEmptyData::Unset);
        assert_eq!(AllowEmptyData::parse("").unwrap(), AllowEmptyData::Unset);
        assert_eq!(AllowEmptyData::parse("TRUE").unwrap(), AllowEmptyData::Allow);
        assert_eq!(AllowEmptyData::parse("false").unwrap(), AllowEmptyData::Deny);
        assert!(matches!(
            AllowEmptyData::parse("maybe"),
            Err(ConfigError::InvalidEmptyDataPolicy { .. })
        ));
    }
}
