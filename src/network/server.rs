//! TCP Server
//!
//! Accepts connections and dispatches to worker threads.

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{bounded, Receiver, Sender};

use crate::config::Config;
use crate::engine::Engine;
use crate::error::{KvError, Result};

use super::Connection;

/// Message sent to worker threads
enum WorkerMessage {
    /// New client connection to handle
    NewConnection(TcpStream),
    /// Signal to shutdown
    Shutdown,
}

/// TCP server for RangeKV
///
/// ## Architecture
/// - Main thread accepts connections
/// - Worker thread pool handles client I/O
/// - Shared Engine reference for all workers
pub struct Server {
    /// Server configuration
    config: Config,

    /// Shared storage engine
    engine: Arc<Engine>,

    /// TCP listener (created on bind)
    listener: Option<TcpListener>,

    /// Channel to send work to workers
    work_sender: Option<Sender<WorkerMessage>>,

    /// Worker thread handles
    workers: Vec<JoinHandle<()>>,

    /// Shutdown flag
    shutdown: Arc<AtomicBool>,

    /// Active connection count
    active_connections: Arc<AtomicUsize>,
}

impl Server {
    /// Create a new server with the given config and engine
    pub fn new(config: Config, engine: Arc<Engine>) -> Self {
        Self {
            config,
            engine,
            listener: None,
            work_sender: None,
            workers: Vec::new(),
            shutdown: Arc::new(AtomicBool::new(false)),
            active_connections: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Bind the listener and return the bound address
    ///
    /// Split from `run` so callers using port 0 can learn the actual port
    /// before the accept loop starts.
    pub fn bind(&mut self) -> Result<SocketAddr> {
        let listener = TcpListener::bind(&self.config.listen_addr).map_err(|e| {
            KvError::Network(format!(
                "failed to bind to {}: {e}",
                self.config.listen_addr
            ))
        })?;

        // Non-blocking so the accept loop can check the shutdown flag
        listener.set_nonblocking(true)?;
        let addr = listener.local_addr()?;

        tracing::info!(%addr, "server listening");
        self.listener = Some(listener);
        Ok(addr)
    }

    /// Start the server (blocking)
    ///
    /// Binds if `bind` has not been called, spawns the worker pool, then
    /// accepts connections until shutdown is signaled.
    pub fn run(&mut self) -> Result<()> {
        if self.listener.is_none() {
            self.bind()?;
        }

        let num_workers = worker_count();
        let (sender, receiver) = bounded::<WorkerMessage>(self.config.max_connections);
        self.work_sender = Some(sender);

        tracing::info!(num_workers, "starting worker threads");

        for worker_id in 0..num_workers {
            let worker = Worker {
                id: worker_id,
                receiver: receiver.clone(),
                engine: Arc::clone(&self.engine),
                active_connections: Arc::clone(&self.active_connections),
                read_timeout_ms: self.config.read_timeout_ms,
                write_timeout_ms: self.config.write_timeout_ms,
            };
            let handle = thread::Builder::new()
                .name(format!("rangekv-worker-{worker_id}"))
                .spawn(move || worker.run())
                .map_err(|e| KvError::Network(format!("failed to spawn worker: {e}")))?;

            self.workers.push(handle);
        }

        self.accept_loop()?;
        self.cleanup();

        Ok(())
    }

    /// Main accept loop
    fn accept_loop(&mut self) -> Result<()> {
        let listener = self.listener.as_ref().expect("bound in run");
        let sender = self.work_sender.as_ref().expect("created in run");

        while !self.shutdown.load(Ordering::Relaxed) {
            match listener.accept() {
                Ok((stream, addr)) => {
                    let current = self.active_connections.load(Ordering::Relaxed);
                    if current >= self.config.max_connections {
                        tracing::warn!(
                            current,
                            limit = self.config.max_connections,
                            %addr,
                            "connection limit reached, rejecting"
                        );
                        drop(stream);
                        continue;
                    }

                    tracing::debug!(%addr, "accepted connection");

                    if let Err(e) = sender.send(WorkerMessage::NewConnection(stream)) {
                        tracing::error!("failed to dispatch connection: {e}");
                    }
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    // No pending connections
                    thread::sleep(Duration::from_millis(10));
                }
                Err(e) => {
                    if !self.shutdown.load(Ordering::Relaxed) {
                        tracing::error!("accept error: {e}");
                    }
                }
            }
        }

        Ok(())
    }

    /// Cleanup workers and resources
    fn cleanup(&mut self) {
        tracing::info!("shutting down server");

        if let Some(sender) = &self.work_sender {
            for _ in 0..self.workers.len() {
                let _ = sender.send(WorkerMessage::Shutdown);
            }
        }

        for handle in self.workers.drain(..) {
            if let Err(e) = handle.join() {
                tracing::error!("worker thread panicked: {e:?}");
            }
        }

        tracing::info!("server shutdown complete");
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        tracing::info!("shutdown signal received");
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Handle that can signal shutdown after `run` has taken the server
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            flag: Arc::clone(&self.shutdown),
        }
    }

    /// Check if the server is running
    pub fn is_running(&self) -> bool {
        !self.shutdown.load(Ordering::Relaxed)
    }

    /// Get the number of active connections
    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::Relaxed)
    }

    /// Get the bound address (if bound)
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().and_then(|l| l.local_addr().ok())
    }
}

/// Cloneable shutdown signal for a running server
#[derive(Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Ask the accept loop to stop and the workers to drain
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }
}

/// Worker thread that handles client connections
struct Worker {
    /// Worker ID for logging
    id: usize,

    /// Channel to receive work
    receiver: Receiver<WorkerMessage>,

    /// Shared engine reference
    engine: Arc<Engine>,

    /// Active connection counter
    active_connections: Arc<AtomicUsize>,

    /// Read timeout in milliseconds
    read_timeout_ms: u64,

    /// Write timeout in milliseconds
    write_timeout_ms: u64,
}

impl Worker {
    fn run(self) {
        tracing::debug!(worker = self.id, "worker started");

        loop {
            match self.receiver.recv() {
                Ok(WorkerMessage::NewConnection(stream)) => {
                    self.handle_connection(stream);
                }
                Ok(WorkerMessage::Shutdown) => {
                    tracing::debug!(worker = self.id, "worker received shutdown signal");
                    break;
                }
                Err(_) => {
                    // Channel closed
                    tracing::debug!(worker = self.id, "worker channel closed");
                    break;
                }
            }
        }

        tracing::debug!(worker = self.id, "worker stopped");
    }

    fn handle_connection(&self, stream: TcpStream) {
        self.active_connections.fetch_add(1, Ordering::Relaxed);

        let mut conn = match Connection::new(stream, Arc::clone(&self.engine)) {
            Ok(conn) => conn,
            Err(e) => {
                tracing::error!("failed to create connection: {e}");
                self.active_connections.fetch_sub(1, Ordering::Relaxed);
                return;
            }
        };

        if let Err(e) = conn.set_timeouts(self.read_timeout_ms, self.write_timeout_ms) {
            tracing::warn!("failed to set connection timeouts: {e}");
        }

        if let Err(e) = conn.handle() {
            tracing::debug!(peer = conn.peer_addr(), "connection ended with error: {e}");
        }

        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Worker pool size
fn worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(4)
}
