//! CmdGate CLI entry point.
//!
//! Dispatches to `check` (validate configuration), `send` (run one command
//! through the gate) or `target` (UDP target simulator).

use clap::{Parser, Subcommand};
use cmdgate_core::preview::{PREVIEW_LIMIT, body_preview};
use tokio_util::sync::CancellationToken;

use cmdgate::check::run_check;
use cmdgate::cli::{CheckArgs, LogArgs, LogFormat, SendArgs, TargetArgs};
use cmdgate::error::{EXIT_FAILURE, EXIT_OK, EXIT_STOPPED};
use cmdgate::send::run_send;
use cmdgate::target::run_target;

// ─────────────────────────────────────────────────────────────────────────────
// CLI Definitions
// ─────────────────────────────────────────────────────────────────────────────

/// CmdGate: remote authorization for outgoing commands.
#[derive(Parser)]
#[command(name = "cmdgate", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate configuration, print the normalized endpoint.
    Check(CheckArgs),
    /// Run one command through the gate.
    Send(SendArgs),
    /// Run the UDP target simulator.
    Target(TargetArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Entry Point
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let code = match cli.command {
        Commands::Check(args) => {
            init_tracing(&args.log);
            match run_check(&args) {
                Ok(report) => {
                    println!("{report}");
                    EXIT_OK
                }
                Err(e) => {
                    tracing::error!(error = %e, "check failed");
                    eprintln!("cmdgate check: {e}");
                    EXIT_FAILURE
                }
            }
        }
        Commands::Send(args) => {
            init_tracing(&args.log);
            match run_send(&args).await {
                Ok(report) => match report.annotation() {
                    Some(annotation) => {
                        println!("{}", body_preview(annotation, PREVIEW_LIMIT));
                        EXIT_OK
                    }
                    None => {
                        eprintln!("cmdgate send: command stopped by gate");
                        EXIT_STOPPED
                    }
                },
                Err(e) => {
                    tracing::error!(error = %e, "send failed");
                    eprintln!("cmdgate send: {e}");
                    EXIT_FAILURE
                }
            }
        }
        Commands::Target(args) => {
            init_tracing(&args.log);
            let cancel = CancellationToken::new();
            spawn_ctrl_c(cancel.clone());
            match run_target(&args, cancel).await {
                Ok(_) => EXIT_OK,
                Err(e) => {
                    tracing::error!(error = %e, "target failed");
                    eprintln!("cmdgate target: {e}");
                    EXIT_FAILURE
                }
            }
        }
    };

    std::process::exit(code);
}

/// Cancel `token` on Ctrl-C.
fn spawn_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl-C");
            return;
        }
        tracing::info!("Ctrl-C received, shutting down");
        token.cancel();
    });
}

// ─────────────────────────────────────────────────────────────────────────────
// Tracing Init
// ─────────────────────────────────────────────────────────────────────────────

/// Initialise tracing subscriber with stderr output.
///
/// When `verbose` is true, sets filter to `debug`. Otherwise, respects
/// `RUST_LOG` (defaulting to `info`).
fn init_tracing(log: &LogArgs) {
    use tracing_subscriber::EnvFilter;

    let filter = if log.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match log.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}
