//! # Shared protocol crate
//!
//! Types and framing shared by the to-do server and its clients.
//!
//! ## Wire format
//! One record per line. Fields are separated by `|`; the first field names the
//! message kind. Field contents are backslash-escaped (see [`fields`]) so any
//! title or description can be carried without breaking framing.
//!
//! ```text
//! CREATE_ACCOUNT|alice|Secret1        -> RESULT|true
//! LOGIN|alice|Secret1                 -> RESULT|true|<token>
//! CREATE_TODO|<token>|Buy milk|LOW|2% milk|
//!                                     -> RESULT|true|1
//! GET_TODO|<token>|1                  -> RESULT|true|[id=1,title=Buy milk,...]
//! PING                                -> RESULT|true
//! ```
//!
//! ## Module Organization
//! - [`fields`]: escaping, joining and splitting of record fields
//! - [`model`]: priorities, to-do records and their text forms
//! - [`protocol`]: request and response records with encode/decode

pub mod fields;
pub mod model;
pub mod protocol;

pub use model::{format_listing, Priority, ToDo, ToDoId, DATE_FORMAT};
pub use protocol::{ProtocolError, Request, Response};
