//! The narrow view of a command packet that the gate depends on.
//!
//! The host pipeline owns packets and their encoding. The gate only needs to
//! resolve a field by name, read a converted header value, and write raw bytes
//! into one designated field before the packet is encoded.
//!
//! ## Module Organization
//!
//! - `mod.rs` - `Packet` trait, item descriptors, designated field names
//! - `memory.rs` - `MemoryPacket`, an in-memory implementation

pub mod memory;

pub use memory::MemoryPacket;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;

/// Default name of the stream id header field.
pub const DEFAULT_STREAM_ID_FIELD: &str = "CCSDS_STREAMID";
/// Default name of the function code header field.
pub const DEFAULT_FUNCTION_CODE_FIELD: &str = "CCSDS_FC";
/// Default name of the field that carries the gate's response bytes.
pub const DEFAULT_RESPONSE_FIELD: &str = "SER_CMD";

// ============================================================================
// Items
// ============================================================================

/// Storage class of a packet item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// Fixed-width integer.
    Integer { bits: u8, signed: bool },
    /// Raw byte block, optionally bounded.
    Block { max_len: Option<usize> },
}

/// Handle to a named packet item, returned by [`Packet::item`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDescriptor {
    pub name: String,
    pub kind: ItemKind,
}

impl ItemDescriptor {
    pub fn new(name: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Converted value of a packet item.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl FieldValue {
    /// Integer view of the value.
    ///
    /// Floats with no fractional part count as integers, since converted
    /// header values may come back as floating point from conversion tables.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            Self::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            _ => None,
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
        }
    }
}

/// Errors raised by a packet when reading or writing an item.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PacketError {
    /// The descriptor does not belong to this packet.
    #[error("unknown item '{item}'")]
    UnknownItem { item: String },

    /// The item cannot hold a value of this type.
    #[error("item '{item}' cannot hold {got}")]
    TypeMismatch { item: String, got: &'static str },

    /// The bytes do not fit in the item.
    #[error("item '{item}' holds at most {max} bytes, got {len}")]
    TooLarge { item: String, len: usize, max: usize },
}

/// An outgoing command packet as seen by a write-path stage.
pub trait Packet: Send {
    /// Target (device) the command is addressed to.
    fn target_name(&self) -> &str;

    /// Command name within the target.
    fn packet_name(&self) -> &str;

    /// Look up a field descriptor by name.
    fn item(&self, name: &str) -> Option<ItemDescriptor>;

    /// Read the converted value of an item.
    fn read_item(&self, item: &ItemDescriptor) -> Result<FieldValue, PacketError>;

    /// Write raw bytes into an item.
    fn write_item(&mut self, item: &ItemDescriptor, bytes: &[u8]) -> Result<(), PacketError>;
}

// ============================================================================
// Designated fields
// ============================================================================

/// Names of the three fields the gate reads or writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldNames {
    pub stream_id: String,
    pub function_code: String,
    pub response: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            stream_id: DEFAULT_STREAM_ID_FIELD.to_string(),
            function_code: DEFAULT_FUNCTION_CODE_FIELD.to_string(),
            response: DEFAULT_RESPONSE_FIELD.to_string(),
        }
    }
}

impl FieldNames {
    /// Check names are non-empty and distinct.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let roles = [
            ("stream_id", &self.stream_id),
            ("function_code", &self.function_code),
            ("response", &self.response),
        ];
        for (role, name) in roles {
            if name.trim().is_empty() {
                return Err(ConfigError::EmptyFieldName { role });
            }
        }
        for (i, (_, a)) in roles.iter().enumerate() {
            if roles[i + 1..].iter().any(|(_, b)| a == b) {
                return Err(ConfigError::DuplicateFieldName {
                    name: (*a).clone(),
                });
            }
        }
        Ok(())
    }

    /// Resolve the two header fields against a packet's definition.
    ///
    /// The response field is looked up separately so that packets passing
    /// without dispatch never need one.
    ///
    /// # Errors
    ///
    /// `ConfigError::MissingField` if the packet does not define either of them.
    pub fn resolve_header<P: Packet + ?Sized>(
        &self,
        packet: &P,
    ) -> Result<HeaderItems, ConfigError> {
        Ok(HeaderItems {
            stream_id: lookup(packet, &self.stream_id)?,
            function_code: lookup(packet, &self.function_code)?,
        })
    }

    /// Resolve the field that receives the gate's response body.
    ///
    /// # Errors
    ///
    /// `ConfigError::MissingField` if the packet does not define it.
    pub fn resolve_response<P: Packet + ?Sized>(
        &self,
        packet: &P,
    ) -> Result<ItemDescriptor, ConfigError> {
        lookup(packet, &self.response)
    }
}

fn lookup<P: Packet + ?Sized>(packet: &P, name: &str) -> Result<ItemDescriptor, ConfigError> {
    packet.item(name).ok_or_else(|| ConfigError::MissingField {
        target: packet.target_name().to_string(),
        packet: packet.packet_name().to_string(),
        field: name.to_string(),
    })
}

/// The two header values the gate inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderFields {
    pub stream_id: i64,
    pub function_code: i64,
}

/// Header field descriptors resolved against one packet.
#[derive(Debug, Clone)]
pub struct HeaderItems {
    pub stream_id: ItemDescriptor,
    pub function_code: ItemDescriptor,
}

impl HeaderItems {
    /// Read both header values in converted form.
    ///
    /// # Errors
    ///
    /// `ConfigError::NonNumericField` if either value is not an integer.
    pub fn read<P: Packet + ?Sized>(&self, packet: &P) -> Result<HeaderFields, ConfigError> {
        Ok(HeaderFields {
            stream_id: read_integer(packet, &self.stream_id)?,
            function_code: read_integer(packet, &self.function_code)?,
        })
    }
}

fn read_integer<P: Packet + ?Sized>(packet: &P, item: &ItemDescriptor) -> Result<i64, ConfigError> {
    let non_numeric = |reason: String| ConfigError::NonNumericField {
        target: packet.target_name().to_string(),
        packet: packet.packet_name().to_string(),
        field: item.name.clone(),
        reason,
    };
    let value = packet
        .read_item(item)
        .map_err(|e| non_numeric(e.to_string()))?;
    value
        .as_integer()
        .ok_or_else(|| non_numeric(format!("holds {}", value.kind_name())))
}
