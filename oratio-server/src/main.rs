//! `oratio` — streaming transcription TCP server.
//!
//! Reads raw 16-bit little-endian PCM from each client connection and writes
//! newline-terminated `PARTIAL:`/`RESULT:` lines back on the same socket.
//! One blocking worker thread per configured worker; a connection that
//! arrives while all workers are busy is closed immediately.

mod settings;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use oratio_core::recognizer::StubRecognizerFactory;
use oratio_core::Server;
use tracing::info;

use settings::{load_settings, ServerSettings};

#[derive(Debug, Parser)]
#[command(name = "oratio", about = "Streaming speech transcription server")]
struct Cli {
    /// Path to a JSON settings file; missing or malformed files fall back
    /// to built-in defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// TCP port to listen on.
    #[arg(long)]
    port: Option<u16>,

    /// Number of concurrent decoding workers.
    #[arg(long)]
    workers: Option<usize>,

    /// Seconds of audio per decode step; 0 decodes the stream in one chunk.
    #[arg(long)]
    chunk_secs: Option<f32>,

    /// Bytes read from the socket per recv call.
    #[arg(long)]
    packet_bytes: Option<usize>,

    /// Expected sample rate of the incoming PCM, in Hz.
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Frame subsampling factor of the acoustic model; scales the 10 ms
    /// base frame when word times are reported.
    #[arg(long)]
    frame_subsampling_factor: Option<u32>,

    /// Serve exactly this many connections, drain the pool, and exit.
    /// For soak testing; unset means serve forever.
    #[arg(long)]
    max_conns: Option<usize>,
}

impl Cli {
    fn into_settings(self) -> (ServerSettings, Option<usize>) {
        let mut settings = match &self.config {
            Some(path) => load_settings(path),
            None => ServerSettings::default(),
        };
        if let Some(port) = self.port {
            settings.port = port;
        }
        if let Some(workers) = self.workers {
            settings.workers = workers;
        }
        if let Some(chunk_secs) = self.chunk_secs {
            settings.chunk_secs = chunk_secs;
        }
        if let Some(packet_bytes) = self.packet_bytes {
            settings.packet_bytes = packet_bytes;
        }
        if let Some(sample_rate) = self.sample_rate {
            settings.sample_rate = sample_rate;
        }
        if let Some(factor) = self.frame_subsampling_factor {
            settings.frame_subsampling_factor = factor;
        }
        settings.normalize();
        (settings, self.max_conns)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "oratio=info".parse().expect("valid default filter")),
        )
        .init();

    let (settings, max_conns) = Cli::parse().into_settings();
    info!(?settings, "starting");

    let factory = Arc::new(StubRecognizerFactory);
    let server = Server::start(
        &settings.host,
        settings.port,
        settings.workers,
        factory,
        settings.session_config(),
    )
    .context("server startup failed")?;

    match max_conns {
        None => server.run(),
        Some(limit) => {
            for _ in 0..limit {
                server.accept_one();
            }
            info!(connections = limit, "connection limit reached, draining");
            server.pool().drain(Duration::from_millis(100));
            Ok(())
        }
    }
}
