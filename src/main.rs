mod console;

use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use canvaslink_graph::GraphEditor;
use canvaslink_session::{Session, SessionConfig, WsTransport};
use canvaslink_telemetry::{init_telemetry, TelemetryConfig};

use crate::console::Command;

/// Line-oriented graph editor bound to a remote endpoint.
#[derive(Debug, Parser)]
#[command(name = "canvaslink", version)]
struct Args {
    /// WebSocket endpoint to connect to. Empty stays offline.
    #[arg(long, env = "CANVASLINK_ENDPOINT", default_value = "")]
    endpoint: String,

    /// Default log level (RUST_LOG takes precedence).
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let telemetry = init_telemetry(TelemetryConfig {
        log_level: args.log_level,
        json: args.json_logs,
        ..Default::default()
    });

    tracing::info!(endpoint = %args.endpoint, "Starting canvaslink");

    let session = Session::new(Arc::new(WsTransport::new()), SessionConfig::default());
    session.start(args.endpoint.clone(), console::callbacks());

    let mut editor = GraphEditor::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        match console::parse(&line) {
            Ok(Some(Command::Quit)) => break,
            Ok(Some(command)) => {
                for out in console::apply(command, &mut editor, &session, &telemetry) {
                    println!("{out}");
                }
            }
            Ok(None) => {}
            Err(e) => eprintln!("{e}"),
        }
    }

    session.stop();
    tracing::info!("Shutting down");
    Ok(())
}
