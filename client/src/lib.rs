//! # To-Do Client Library
//!
//! A small client for the to-do server's line protocol. [`network::Connection`]
//! wraps one TCP connection and offers one method per request kind; each call
//! sends a request line and waits for the single response line the server
//! returns for it.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::Connection;
//! use shared::Priority;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut conn = Connection::connect("127.0.0.1:8080").await?;
//!     conn.create_account("alice", "Secret1").await?;
//!
//!     let token = conn.login("alice", "Secret1").await?.ok_or("login refused")?;
//!     let id = conn
//!         .create_todo(&token, "Buy milk", Priority::Low, "2% milk", None)
//!         .await?;
//!     println!("created todo {:?}", id);
//!     Ok(())
//! }
//! ```

pub mod network;

pub use network::{ClientError, Connection};
