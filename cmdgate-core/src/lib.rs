//! CmdGate Core: remote authorization for outgoing commands.
//!
//! Sits in a host pipeline's command write path. Each outgoing command is
//! summarized, POSTed once to a remote HTTP gate, and either halted or
//! annotated with the gate's response bytes before it is encoded.
//!
//! The library is host-agnostic: packets are seen through the [`Packet`]
//! trait and outcomes are reported as [`DispatchOutcome`]. The `cmdgate`
//! CLI crate builds on it.

pub mod client;
pub mod config;
pub mod dispatcher;
pub mod endpoint;
pub mod error;
pub mod packet;
pub mod preview;
pub mod protocol;
pub mod summary;

pub use client::{GateClient, GateClientConfig, GateResponse, HttpGateClient};
pub use config::ConfigError;
pub use dispatcher::{Dispatcher, DispatcherConfig};
pub use endpoint::GateEndpoint;
pub use error::{GateError, UnreachableKind};
pub use packet::{FieldNames, MemoryPacket, Packet, PacketError};
pub use protocol::{AllowEmptyData, DispatchOutcome, WriteProtocol};
pub use summary::DispatchSummary;
