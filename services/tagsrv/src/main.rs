//! Tag service entry point
//!
//! Loads configuration and the CSV point table, wires the supervisor and
//! runtime together and runs the cooperative loop until ctrl-c. The binary
//! ships with the in-memory simulator as its memory-service backend; a real
//! S7 session implementation plugs in through `RemoteMemoryService` and
//! `TcpProbe` without touching the engine.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tagsrv::config::TagServiceConfig;
use tagsrv::csv_loader::load_point_table;
use tagsrv::remote::StaticProbe;
use tagsrv::simulator::SimulatedMemoryService;
use tagsrv::supervisor::{ConnectionSupervisor, ProcessRestart};
use tagsrv::{BatchReader, TagRuntime};

#[derive(Parser, Debug)]
#[command(name = "tagsrv", about = "S7 block-tag polling service")]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/tagsrv.yaml")]
    config: PathBuf,

    /// Log filter, e.g. "info" or "tagsrv=debug"
    #[arg(long, default_value = "info", env = "TAGSRV_LOG")]
    log: String,

    /// Validate configuration and point table, then exit
    #[arg(long)]
    validate: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&args.log)?)
        .init();

    let config = TagServiceConfig::load(&args.config)?;
    let catalog = Arc::new(load_point_table(&config.point_table)?);
    info!(
        tags = catalog.len(),
        endpoint = %config.endpoint(),
        "configuration loaded"
    );

    if args.validate {
        info!("validation completed successfully");
        return Ok(());
    }

    // Simulator backend: one block sized to the configured read span. A real
    // transport implements RemoteMemoryService and replaces StaticProbe below
    // with remote::TcpProbe so the preflight actually handshakes the port.
    let service = SimulatedMemoryService::new();
    if let Some((db_number, span)) = BatchReader::new(catalog.clone()).read_span() {
        service.create_block(db_number, span as usize);
    }

    let supervisor = ConnectionSupervisor::new(
        Box::new(service),
        Box::new(StaticProbe::up()),
        Box::new(ProcessRestart),
        config.connect_target(),
        config.reconnect_policy(),
    );

    let (runtime, _handle) = TagRuntime::new(catalog, supervisor, config.poll_interval());

    let cancel = CancellationToken::new();
    let cancel_on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            cancel_on_signal.cancel();
        }
    });

    runtime.run(cancel).await;
    Ok(())
}
