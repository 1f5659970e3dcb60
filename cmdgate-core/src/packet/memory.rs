//! In-memory command packet.
//!
//! Used by hosts without their own packet model, by the CLI, and in tests.

use super::{
    DEFAULT_FUNCTION_CODE_FIELD, DEFAULT_RESPONSE_FIELD, DEFAULT_STREAM_ID_FIELD, FieldValue,
    ItemDescriptor, ItemKind, Packet, PacketError,
};

#[derive(Debug, Clone, PartialEq)]
struct MemoryItem {
    descriptor: ItemDescriptor,
    value: FieldValue,
}

/// A command packet holding named items in definition order.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryPacket {
    target: String,
    packet: String,
    items: Vec<MemoryItem>,
}

impl MemoryPacket {
    /// Create an empty packet definition.
    #[must_use]
    pub fn new(target: impl Into<String>, packet: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            packet: packet.into(),
            items: Vec::new(),
        }
    }

    /// A command with the default CCSDS header fields and an unbounded
    /// response block.
    #[must_use]
    pub fn command(
        target: impl Into<String>,
        packet: impl Into<String>,
        stream_id: i64,
        function_code: i64,
    ) -> Self {
        Self::new(target, packet)
            .with_integer(DEFAULT_STREAM_ID_FIELD, 16, false, stream_id)
            .with_integer(DEFAULT_FUNCTION_CODE_FIELD, 7, false, function_code)
            .with_block(DEFAULT_RESPONSE_FIELD, None)
    }

    /// Add an integer item holding `value`.
    #[must_use]
    pub fn with_integer(mut self, name: &str, bits: u8, signed: bool, value: i64) -> Self {
        self.items.push(MemoryItem {
            descriptor: ItemDescriptor::new(name, ItemKind::Integer { bits, signed }),
            value: FieldValue::Integer(value),
        });
        self
    }

    /// Add an empty byte block, optionally bounded to `max_len` bytes.
    #[must_use]
    pub fn with_block(mut self, name: &str, max_len: Option<usize>) -> Self {
        self.items.push(MemoryItem {
            descriptor: ItemDescriptor::new(name, ItemKind::Block { max_len }),
            value: FieldValue::Bytes(Vec::new()),
        });
        self
    }

    /// Current value of an item.
    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.find(name).map(|item| &item.value)
    }

    /// Current bytes of a block item.
    pub fn bytes(&self, name: &str) -> Option<&[u8]> {
        match self.value(name)? {
            FieldValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    fn find(&self, name: &str) -> Option<&MemoryItem> {
        self.items.iter().find(|i| i.descriptor.name == name)
    }
}

impl Packet for MemoryPacket {
    fn target_name(&self) -> &str {
        &self.target
    }

    fn packet_name(&self) -> &str {
        &self.packet
    }

    fn item(&self, name: &str) -> Option<ItemDescriptor> {
        self.find(name).map(|i| i.descriptor.clone())
    }

    fn read_item(&self, item: &ItemDescriptor) -> Result<FieldValue, PacketError> {
        self.find(&item.name)
            .map(|i| i.value.clone())
            .ok_or_else(|| PacketError::UnknownItem {
                item: item.name.clone(),
            })
    }

    fn write_item(&mut self, item: &ItemDescriptor, bytes: &[u8]) -> Result<(), PacketError> {
        let slot = self
            .items
            .iter_mut()
            .find(|i| i.descriptor.name == item.name)
            .ok_or_else(|| PacketError::UnknownItem {
                item: item.name.clone(),
            })?;

        match slot.descriptor.kind {
            ItemKind::Block { max_len } => {
                if let Some(max) = max_len {
                    if bytes.len() > max {
                        return Err(PacketError::TooLarge {
                            item: item.name.clone(),
                            len: bytes.len(),
                            max,
                        });
                    }
                }
                slot.value = FieldValue::Bytes(bytes.to_vec());
                Ok(())
            }
            ItemKind::Integer { .. } => Err(PacketError::TypeMismatch {
                item: item.name.clone(),
                got: "bytes",
            }),
        }
    }
}
