//! Accept/dispatch glue: one listener feeding one worker pool.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::Result;
use crate::listener::Listener;
use crate::pool::WorkerPool;
use crate::recognizer::RecognizerFactory;
use crate::session::SessionConfig;

pub struct Server {
    listener: Listener,
    pool: WorkerPool,
}

impl Server {
    /// Bind the port and start the worker pool. Either failure is fatal.
    pub fn start(
        host: &str,
        port: u16,
        workers: usize,
        factory: Arc<dyn RecognizerFactory>,
        config: SessionConfig,
    ) -> Result<Self> {
        let listener = Listener::bind(host, port)?;
        let pool = WorkerPool::start(workers, factory, config)?;
        Ok(Self { listener, pool })
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    pub fn local_addr(&self) -> Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept one connection and hand it to the pool. Returns whether a
    /// worker took it; a `false` means the pool was full and the connection
    /// was closed without any protocol interaction.
    pub fn accept_one(&self) -> bool {
        let (conn, peer) = self.listener.accept();
        debug!(%peer, "accepted");
        let dispatched = self.pool.dispatch(conn);
        if !dispatched {
            info!(%peer, "pool full, connection closed");
        }
        dispatched
    }

    /// Serve until the process is killed.
    pub fn run(&self) -> ! {
        loop {
            self.accept_one();
        }
    }
}
