//! Live-client registry for the to-do server
//!
//! This module tracks every connection that is currently open, including:
//! - Registration when a connection is accepted and ID assignment
//! - Deregistration when the session handler finishes, exactly once
//! - Per-client stop signals used to force-close connections on shutdown
//! - Capacity enforcement and diagnostics about who is connected
//!
//! The registry never owns account data. Removing a client drops only the
//! connection bookkeeping; the account it was logged into stays in the store.

use log::info;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Registry-assigned identifier of a connection
pub type ClientId = u32;

/// Represents a connected client and the handle used to stop it
///
/// Each client maintains:
/// - Connection metadata (ID, peer address, connect time)
/// - The username its session is bound to, if logged in
/// - A stop signal observed by its session handler
#[derive(Debug)]
pub struct ConnectedClient {
    /// Unique client identifier assigned by the registry
    pub id: ClientId,
    /// Peer address of the connection
    pub addr: SocketAddr,
    /// When the connection was accepted
    pub connected_at: Instant,
    /// Account the session is currently logged into
    pub username: Option<String>,
    stop_tx: watch::Sender<bool>,
}

impl ConnectedClient {
    /// Creates a client entry and the receiving end of its stop signal
    pub fn new(id: ClientId, addr: SocketAddr) -> (Self, watch::Receiver<bool>) {
        let (stop_tx, stop_rx) = watch::channel(false);
        let client = Self {
            id,
            addr,
            connected_at: Instant::now(),
            username: None,
            stop_tx,
        };
        (client, stop_rx)
    }

    /// Asks the session handler to close its connection
    ///
    /// The handler observes the signal even while blocked on a read.
    pub fn stop(&self) {
        self.stop_tx.send_replace(true);
    }

    /// Returns true once `stop` has been called
    pub fn is_stopping(&self) -> bool {
        *self.stop_tx.borrow()
    }
}

/// Point-in-time view of one registered client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    pub id: ClientId,
    pub addr: SocketAddr,
    pub username: Option<String>,
    pub connected_for: Duration,
}

/// Manages all connected clients
///
/// The ClientManager is the only shared record of live connections. The
/// acceptor adds entries, each session handler removes its own entry when it
/// ends, and shutdown walks the registry to stop every handler.
pub struct ClientManager {
    /// Connected clients indexed by their unique ID
    clients: HashMap<ClientId, ConnectedClient>,
    /// Next available client ID for new connections
    next_client_id: ClientId,
    /// Maximum number of concurrent clients allowed
    max_clients: usize,
}

impl ClientManager {
    /// Creates a new client manager with the specified capacity limit
    ///
    /// Client IDs start from 1 and increment for each new connection. IDs are
    /// never reused while the process runs.
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: HashMap::new(),
            next_client_id: 1,
            max_clients,
        }
    }

    /// Attempts to register a new connection
    ///
    /// Returns the client ID and its stop receiver, or None if the server is at
    /// capacity.
    pub fn add_client(&mut self, addr: SocketAddr) -> Option<(ClientId, watch::Receiver<bool>)> {
        if self.clients.len() >= self.max_clients {
            return None;
        }

        let client_id = self.next_client_id;
        self.next_client_id += 1;

        let (client, stop_rx) = ConnectedClient::new(client_id, addr);
        info!("Client {} connected from {}", client_id, addr);
        self.clients.insert(client_id, client);

        Some((client_id, stop_rx))
    }

    /// Removes a client from the registry
    ///
    /// Returns true if the client was found and removed, false if it was
    /// already gone. A second removal of the same ID is a no-op.
    pub fn remove_client(&mut self, client_id: &ClientId) -> bool {
        if let Some(client) = self.clients.remove(client_id) {
            info!(
                "Client {} disconnected after {:?}",
                client.id,
                client.connected_at.elapsed()
            );
            true
        } else {
            false
        }
    }

    /// Records which account a client's session is bound to
    pub fn set_username(&mut self, client_id: ClientId, username: Option<String>) -> bool {
        if let Some(client) = self.clients.get_mut(&client_id) {
            client.username = username;
            true
        } else {
            false
        }
    }

    /// Signals a single client to close its connection
    pub fn stop_client(&self, client_id: ClientId) -> bool {
        if let Some(client) = self.clients.get(&client_id) {
            client.stop();
            true
        } else {
            false
        }
    }

    /// Signals every registered client to close its connection
    ///
    /// Entries stay registered until their handlers exit and remove them.
    /// Returns the number of clients signalled.
    pub fn stop_all(&self) -> usize {
        for client in self.clients.values() {
            client.stop();
        }
        self.clients.len()
    }

    /// Lists all registered clients ordered by ID
    pub fn snapshot(&self) -> Vec<ClientInfo> {
        let mut infos: Vec<ClientInfo> = self
            .clients
            .values()
            .map(|client| ClientInfo {
                id: client.id,
                addr: client.addr,
                username: client.username.clone(),
                connected_for: client.connected_at.elapsed(),
            })
            .collect();
        infos.sort_by_key(|info| info.id);
        infos
    }

    /// Returns true if the client is still registered
    pub fn contains(&self, client_id: &ClientId) -> bool {
        self.clients.contains_key(client_id)
    }

    /// Returns the number of currently connected clients
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Returns true if no clients are currently connected
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
