//! TCP accept loop.
//!
//! Binding is the one fatal step: a taken port aborts startup with
//! [`OratioError::Bind`]. Once bound, the listener never gives up — accept
//! errors (fd exhaustion, transient network failures) are logged and retried,
//! because a dropped accept only costs one client, while an exited loop costs
//! the whole service.
//!
//! Note on `SIGPIPE`: the runtime ignores it before `main` runs, so a write
//! to a disconnected peer surfaces as `ErrorKind::BrokenPipe` instead of
//! killing the process. Sessions already treat failed writes as terminal.

use std::net::{SocketAddr, TcpListener, TcpStream};

use tracing::{info, warn};

use crate::error::{OratioError, Result};

pub struct Listener {
    inner: TcpListener,
}

impl Listener {
    /// Bind the serving socket. Fails fast if the address is unavailable.
    pub fn bind(host: &str, port: u16) -> Result<Self> {
        let inner = TcpListener::bind((host, port))
            .map_err(|source| OratioError::Bind { port, source })?;
        info!(host, port, "listening");
        Ok(Self { inner })
    }

    /// Accept the next connection, retrying on transient failures.
    pub fn accept(&self) -> (TcpStream, SocketAddr) {
        loop {
            match self.inner.accept() {
                Ok(pair) => return pair,
                Err(e) => warn!(error = %e, "accept failed, retrying"),
            }
        }
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.inner.local_addr()?)
    }
}
