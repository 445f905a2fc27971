//! # To-Do Server Library
//!
//! This library provides the server side of the to-do list service. Clients
//! hold a persistent TCP connection, authenticate with a username and
//! password, and then manage their personal to-do items with the session
//! token they were issued.
//!
//! ## Core Responsibilities
//!
//! ### Connection Handling
//! Handles the complete lifecycle of client connections including:
//! - Accepting connections and registering them in the live-client registry
//! - Running one independent session handler per connection
//! - Deregistering each connection exactly once when it closes
//! - Force-closing every connection on shutdown
//!
//! ### Authentication and Authorization
//! Each connection carries its own session state. A successful login binds the
//! session to one account under a fresh random token; every later request must
//! present exactly that token. Any failure is answered with the same generic
//! `RESULT|false`, so clients cannot probe which accounts exist.
//!
//! ### Shared State
//! Accounts and their to-do items live in one in-memory store guarded by a
//! single lock. Each store operation is atomic: two concurrent registrations
//! of the same username cannot both succeed, and a listing never observes a
//! half-applied delete. No lock is held while a response is written.
//!
//! ## Module Organization
//!
//! ### Client Manager Module (`client_manager`)
//! The live-client registry: IDs, peer addresses, bound usernames and the
//! stop signal of every connection.
//!
//! ### Dispatcher Module (`dispatcher`)
//! The request dispatcher. Enforces the token rule, consults the validator and
//! performs store operations, producing exactly one response per request.
//!
//! ### Handler Module (`handler`)
//! The per-connection read loop: decode a line, dispatch it, write the reply,
//! repeat. Malformed lines close the connection.
//!
//! ### Network Module (`network`)
//! The accept loop, session spawning and server shutdown.
//!
//! ### Store, Session and Validation Modules
//! The account repository, the per-connection session state machine with token
//! issuance, and the pluggable field validation rules.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Arc::new(Server::bind(ServerConfig::new("127.0.0.1", 8080)).await?);
//!
//!     let running = {
//!         let server = Arc::clone(&server);
//!         tokio::spawn(async move { server.run().await })
//!     };
//!
//!     tokio::signal::ctrl_c().await?;
//!     server.shutdown().await;
//!     running.await??;
//!     Ok(())
//! }
//! ```
//!
//! ## Limitations
//!
//! Requests have no read timeout: a client that connects and never sends a
//! line keeps its session open until it disconnects or the server shuts down.
//! Data is kept in memory only.

pub mod client_manager;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod network;
pub mod session;
pub mod store;
pub mod validation;

pub use error::ServerError;
