//! CmdGate CLI: configuration checks, one-shot command dispatch and a UDP
//! target simulator for exercising a gated command path end to end.

pub mod check;
pub mod cli;
pub mod error;
pub mod send;
pub mod target;
