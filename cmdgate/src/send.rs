//! `cmdgate send`: run one command through the gate.

use cmdgate_core::config::{find_config_file, load_and_validate};
use cmdgate_core::{DispatchOutcome, Dispatcher, DispatcherConfig, MemoryPacket};
use tracing::debug;

use crate::cli::SendArgs;
use crate::error::CliError;

/// Resolve gate settings for `send`.
///
/// Precedence: `--endpoint`, `--config`, `CMDGATE_ENDPOINT`, default config
/// paths. `--identity` and `--timeout` override whichever source wins.
pub fn resolve_config(args: &SendArgs) -> Result<DispatcherConfig, CliError> {
    let mut config = if let Some(endpoint) = &args.endpoint {
        DispatcherConfig::new(endpoint.clone())
    } else if args.config.is_none() && std::env::var_os("CMDGATE_ENDPOINT").is_some() {
        debug!("Using gate settings from environment");
        DispatcherConfig::from_env()?
    } else {
        let path = find_config_file(args.config.as_deref())?;
        load_and_validate(&path)?.dispatcher_config()
    };

    if let Some(identity) = &args.identity {
        config.identity = Some(identity.clone());
    }
    if let Some(timeout) = args.timeout {
        config.client.timeout = timeout;
    }
    Ok(config)
}

/// Build the command packet described by the arguments.
///
/// Uses the configured field names so a custom `fields:` section still lines
/// up with the packet.
pub fn build_packet(args: &SendArgs, config: &DispatcherConfig) -> MemoryPacket {
    MemoryPacket::new(&args.target, &args.packet)
        .with_integer(&config.fields.stream_id, 16, false, args.stream_id)
        .with_integer(&config.fields.function_code, 7, false, args.function_code)
        .with_block(&config.fields.response, None)
}

/// Result of `cmdgate send`.
#[derive(Debug)]
pub struct SendReport {
    pub outcome: DispatchOutcome<MemoryPacket>,
    /// Field the gate's response is written into.
    pub response_field: String,
}

impl SendReport {
    /// Bytes the gate wrote into the packet, when it continued.
    pub fn annotation(&self) -> Option<&[u8]> {
        match &self.outcome {
            DispatchOutcome::Continue(packet) => packet.bytes(&self.response_field),
            DispatchOutcome::Stop | DispatchOutcome::Disconnect => None,
        }
    }
}

/// Dispatch one command.
pub async fn run_send(args: &SendArgs) -> Result<SendReport, CliError> {
    let config = resolve_config(args)?;
    let packet = build_packet(args, &config);
    let response_field = config.fields.response.clone();
    let dispatcher = Dispatcher::new(config)?;
    let outcome = dispatcher.on_write(packet).await?;
    Ok(SendReport {
        outcome,
        response_field,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{LogArgs, LogFormat};
    use std::io::Write;
    use std::time::Duration;

    fn send_args() -> SendArgs {
        SendArgs {
            config: None,
            endpoint: None,
            identity: None,
            timeout: None,
            target: "INST".to_string(),
            packet: "COLLECT".to_string(),
            stream_id: 0x1801,
            function_code: 5,
            log: LogArgs {
                verbose: false,
                log_format: LogFormat::Text,
            },
        }
    }

    #[test]
    fn test_endpoint_flag_wins() {
        let args = SendArgs {
            endpoint: Some("gate:9000".to_string()),
            identity: Some("op-3".to_string()),
            timeout: Some(Duration::from_secs(2)),
            ..send_args()
        };

        let config = resolve_config(&args).unwrap();

        assert_eq!(config.endpoint, "gate:9000");
        assert_eq!(config.identity.as_deref(), Some("op-3"));
        assert_eq!(config.client.timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_config_file_fields_shape_packet() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "schema: 1\ngate:\n  endpoint: gate\nfields:\n  stream_id: SID\n  function_code: FC\n  response: SIG"
        )
        .unwrap();
        let args = SendArgs {
            config: Some(file.path().to_path_buf()),
            ..send_args()
        };

        let config = resolve_config(&args).unwrap();
        let packet = build_packet(&args, &config);

        assert_eq!(
            packet.value("SID"),
            Some(&cmdgate_core::packet::FieldValue::Integer(0x1801))
        );
        assert_eq!(packet.bytes("SIG"), Some(&b""[..]));
    }

    #[tokio::test]
    async fn test_noop_send_needs_no_gate() {
        // Nothing listens on the endpoint; the no-op bypass never connects.
        let args = SendArgs {
            endpoint: Some("127.0.0.1:9".to_string()),
            function_code: 1,
            ..send_args()
        };

        let report = run_send(&args).await.unwrap();

        assert!(report.outcome.is_continue());
        assert_eq!(report.annotation(), Some(&b""[..]));
    }

    #[tokio::test]
    async fn test_unreachable_gate_stops() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let args = SendArgs {
            endpoint: Some(format!("127.0.0.1:{port}/authorize")),
            ..send_args()
        };

        let report = run_send(&args).await.unwrap();

        assert!(report.outcome.is_stop());
        assert_eq!(report.annotation(), None);
    }
}
