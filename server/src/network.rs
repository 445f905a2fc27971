//! Server network layer: the accept loop and session spawning

use crate::client_manager::ClientManager;
use crate::config::ServerConfig;
use crate::dispatcher::Dispatcher;
use crate::error::ServerError;
use crate::handler::SessionHandler;
use crate::session::Session;
use log::{debug, error, info, warn};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{watch, Mutex, RwLock};

/// Accepts connections and runs one session handler per connection
pub struct Server {
    listener: Mutex<Option<TcpListener>>,
    local_addr: SocketAddr,
    config: ServerConfig,
    dispatcher: Arc<Dispatcher>,
    clients: Arc<RwLock<ClientManager>>,
    shutdown_tx: watch::Sender<bool>,
}

impl Server {
    /// Binds the listening socket with the default validation rules
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        Self::with_dispatcher(config, Arc::new(Dispatcher::default())).await
    }

    pub async fn with_dispatcher(
        config: ServerConfig,
        dispatcher: Arc<Dispatcher>,
    ) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(&config.addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: config.addr.clone(),
                source,
            })?;
        let local_addr = listener.local_addr()?;
        info!("Server listening on {}", local_addr);

        let (shutdown_tx, _) = watch::channel(false);

        Ok(Server {
            listener: Mutex::new(Some(listener)),
            local_addr,
            clients: Arc::new(RwLock::new(ClientManager::new(config.max_clients))),
            config,
            dispatcher,
            shutdown_tx,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    pub fn clients(&self) -> Arc<RwLock<ClientManager>> {
        Arc::clone(&self.clients)
    }

    /// Runs the accept loop until [`Server::shutdown`] is called
    ///
    /// The listening socket is closed when this returns. An accept failure
    /// other than a single aborted handshake ends the loop with an error;
    /// sessions already running are not affected.
    pub async fn run(&self) -> Result<(), ServerError> {
        let listener = self
            .listener
            .lock()
            .await
            .take()
            .ok_or(ServerError::AlreadyRunning)?;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        info!("Server started successfully");

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            tokio::select! {
                _ = shutdown_rx.changed() => {}
                accepted = listener.accept() => match accepted {
                    Ok((stream, addr)) => self.spawn_session(stream, addr).await,
                    Err(e) if is_transient(&e) => {
                        warn!("Connection aborted during accept: {}", e);
                    }
                    Err(e) => {
                        error!("Accept failed, stopping listener: {}", e);
                        return Err(e.into());
                    }
                },
            }
        }

        drop(listener);
        info!("Listener on {} closed", self.local_addr);
        Ok(())
    }

    /// Stops accepting connections and force-closes every live session
    pub async fn shutdown(&self) {
        info!("Stopping server");
        self.shutdown_tx.send_replace(true);

        let stopped = self.clients.read().await.stop_all();
        info!("Stopped {} running clients", stopped);
    }

    async fn spawn_session(&self, stream: TcpStream, addr: SocketAddr) {
        let registration = self.clients.write().await.add_client(addr);
        let Some((client_id, stop_rx)) = registration else {
            info!("Rejecting connection from {}: server full", addr);
            return;
        };

        // A connection registered after shutdown began missed stop_all
        if *self.shutdown_tx.borrow() {
            self.clients.read().await.stop_client(client_id);
        }

        if let Err(e) = stream.set_nodelay(true) {
            debug!("Client {}: could not set TCP_NODELAY: {}", client_id, e);
        }

        let handler = SessionHandler::new(
            stream,
            Session::new(client_id),
            Arc::clone(&self.dispatcher),
            Arc::clone(&self.clients),
            stop_rx,
            self.config.max_line_bytes,
        );
        let clients = Arc::clone(&self.clients);

        tokio::spawn(async move {
            if let Err(e) = handler.run().await {
                debug!("Client {} ended with error: {}", client_id, e);
            }

            let remaining = {
                let mut clients = clients.write().await;
                clients.remove_client(&client_id);
                clients.len()
            };
            info!("{} clients connected", remaining);
        });
    }
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionAborted | io::ErrorKind::ConnectionReset
    )
}
