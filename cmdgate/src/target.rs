//! `cmdgate target`: UDP target simulator.
//!
//! Stands in for a commanded device. Every datagram received on the command
//! port is logged with its length and first byte (the command id); no command
//! has side effects. Telemetry goes out on a fixed interval as
//! `[0x01][UTC timestamp, RFC 3339][0x00]`, optionally duplicated to a second
//! destination.

use std::net::SocketAddr;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use cmdgate_core::ConfigError;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::TargetArgs;
use crate::error::CliError;

/// Telemetry packet id.
pub const TELEMETRY_ID: u8 = 0x01;

/// Largest command datagram read.
const MAX_COMMAND_LEN: usize = 4096;

/// Encode one telemetry frame.
pub fn telemetry_frame(now: DateTime<Utc>) -> Vec<u8> {
    let ts = now.to_rfc3339_opts(SecondsFormat::Micros, true);
    let mut frame = Vec::with_capacity(ts.len() + 2);
    frame.push(TELEMETRY_ID);
    frame.extend_from_slice(ts.as_bytes());
    frame.push(0x00);
    frame
}

/// Command id of a datagram: its first byte.
pub fn command_id(datagram: &[u8]) -> Option<u8> {
    datagram.first().copied()
}

/// Counters reported when the simulator stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TargetStats {
    pub commands_received: u64,
    pub telemetry_sent: u64,
}

/// A bound simulator, ready to run.
pub struct TargetSimulator {
    command_socket: UdpSocket,
    telemetry_socket: UdpSocket,
    destination: (String, u16),
    forward: Option<(String, u16)>,
    interval: Duration,
}

impl TargetSimulator {
    /// Bind the command port and the telemetry sender.
    pub async fn bind(args: &TargetArgs) -> Result<Self, CliError> {
        if args.interval.is_zero() {
            return Err(ConfigError::ZeroTimeout { field: "interval" }.into());
        }

        let command_socket = UdpSocket::bind(("0.0.0.0", args.listen_port)).await?;
        let telemetry_socket = UdpSocket::bind(("0.0.0.0", 0)).await?;

        info!(
            port = command_socket.local_addr()?.port(),
            "Listening for commands on UDP"
        );

        Ok(Self {
            command_socket,
            telemetry_socket,
            destination: (args.tlm_host.clone(), args.tlm_port),
            forward: args.forward_destination(),
            interval: args.interval,
        })
    }

    /// Address the command socket is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, CliError> {
        Ok(self.command_socket.local_addr()?)
    }

    /// Serve until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) -> TargetStats {
        let mut stats = TargetStats::default();
        let mut ticker = tokio::time::interval(self.interval);
        let mut buf = vec![0u8; MAX_COMMAND_LEN];

        if let Some((host, port)) = &self.forward {
            info!(host = %host, port, "Forwarding telemetry");
        }
        info!(
            host = %self.destination.0,
            port = self.destination.1,
            interval_ms = self.interval.as_millis() as u64,
            "Sending telemetry"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                received = self.command_socket.recv_from(&mut buf) => match received {
                    Ok((len, from)) => {
                        stats.commands_received += 1;
                        info!(
                            from = %from,
                            len,
                            id = ?command_id(&buf[..len]),
                            "Command received"
                        );
                    }
                    Err(e) => warn!(error = %e, "Command receive failed"),
                },
                _ = ticker.tick() => {
                    if self.send_telemetry().await {
                        stats.telemetry_sent += 1;
                    }
                }
            }
        }

        info!(
            commands = stats.commands_received,
            telemetry = stats.telemetry_sent,
            "Target simulator stopped"
        );
        stats
    }

    /// Send one frame to the destination (and forward, if set).
    ///
    /// Returns whether the main destination accepted it. Send failures are
    /// logged and never end the loop.
    async fn send_telemetry(&self) -> bool {
        let frame = telemetry_frame(Utc::now());
        let (host, port) = (&self.destination.0, self.destination.1);

        let sent = match self.telemetry_socket.send_to(&frame, (host.as_str(), port)).await {
            Ok(_) => true,
            Err(e) => {
                warn!(host = %host, port, error = %e, "Telemetry send failed");
                false
            }
        };

        if let Some((fwd_host, fwd_port)) = &self.forward {
            if let Err(e) = self
                .telemetry_socket
                .send_to(&frame, (fwd_host.as_str(), *fwd_port))
                .await
            {
                warn!(host = %fwd_host, port = *fwd_port, error = %e, "Telemetry forward failed");
            }
        }

        if sent {
            info!(len = frame.len(), "Telemetry sent");
        }
        sent
    }
}

/// Bind and serve until `cancel` fires.
pub async fn run_target(args: &TargetArgs, cancel: CancellationToken) -> Result<TargetStats, CliError> {
    let simulator = TargetSimulator::bind(args).await?;
    Ok(simulator.run(cancel).await)
}
