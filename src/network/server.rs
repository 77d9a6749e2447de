//! TCP Server
//!
//! Accepts connections and dispatches each to a handler thread.

use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel::{bounded, Receiver, Sender};

use crate::config::Config;
use crate::error::Result;
use crate::network::Connection;
use crate::store::Store;

/// How long the acceptor waits on the shutdown channel between polls
const ACCEPT_POLL: Duration = Duration::from_millis(50);

/// TCP server for vaultkv
pub struct Server {
    config: Config,
    store: Arc<Store>,
    shutdown_tx: Sender<()>,
    shutdown_rx: Receiver<()>,
}

impl Server {
    /// Create a new server with the given config and store
    pub fn new(config: Config, store: Arc<Store>) -> Self {
        let (shutdown_tx, shutdown_rx) = bounded(1);
        Self {
            config,
            store,
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// A handle that stops the server when sent to
    pub fn shutdown_handle(&self) -> Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Run the accept loop (blocking)
    ///
    /// Returns after a successful BYE: in-flight sessions are joined, the
    /// log is flushed and closed, and the terminated message is logged.
    pub fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(&self.config.listen_addr)?;
        // Non-blocking accept so the shutdown channel is polled between
        // connections.
        listener.set_nonblocking(true)?;
        tracing::info!("listening on {}", self.config.listen_addr);

        let active = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::new();

        loop {
            match listener.accept() {
                Ok((stream, _)) => {
                    if active.load(Ordering::Relaxed) >= self.config.max_connections {
                        tracing::warn!("connection limit reached, refusing client");
                        continue;
                    }
                    stream.set_nonblocking(false)?;

                    let store = Arc::clone(&self.store);
                    let shutdown = self.shutdown_tx.clone();
                    let active = Arc::clone(&active);
                    let read_ms = self.config.read_timeout_ms;
                    let write_ms = self.config.write_timeout_ms;

                    active.fetch_add(1, Ordering::Relaxed);
                    handles.push(thread::spawn(move || {
                        match Connection::new(stream, store, shutdown) {
                            Ok(mut conn) => {
                                let result = conn
                                    .set_timeouts(read_ms, write_ms)
                                    .and_then(|_| conn.handle());
                                if let Err(e) = result {
                                    tracing::warn!("session {} ended with error: {}", conn.peer_addr(), e);
                                }
                            }
                            Err(e) => tracing::warn!("failed to set up connection: {}", e),
                        }
                        active.fetch_sub(1, Ordering::Relaxed);
                    }));
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    if self.shutdown_rx.recv_timeout(ACCEPT_POLL).is_ok() {
                        break;
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::info!("draining {} active sessions", active.load(Ordering::Relaxed));
        for handle in handles {
            let _ = handle.join();
        }

        self.store.close()?;
        tracing::info!("server terminated");
        Ok(())
    }
}
