//! `edbconnect` is a blocking client for the binary wire protocol of the
//! EdgeDB relational-graph database.
//!
//! The crate covers the protocol core: connecting and authenticating,
//! executing EdgeQL scripts, running typed queries whose arguments and
//! results are encoded through the server-described codec tree, and
//! explicit transactions.
//!
//! # Connecting
//!
//! ```rust,no_run
//! use edbconnect::{Connection, EdbResult};
//!
//! fn main() -> EdbResult<()> {
//!     let mut connection = Connection::connect("edgedb://edgedb@localhost:5656/edgedb")?;
//!     connection.execute_script("INSERT User { name := 'dent' };")?;
//!     Ok(())
//! }
//! ```
//!
//! # Queries
//!
//! Typed queries go through [`Connection::query`], which encodes the given
//! [`QueryArgs`] with the server-supplied argument codec and decodes each
//! result row into a caller-provided [`RowSink`]:
//!
//! ```rust,no_run
//! use edbconnect::{Cardinality, Connection, EdbResult, OutputFormat, QueryArgs, Rows};
//!
//! fn main() -> EdbResult<()> {
//!     let mut connection = Connection::connect("edgedb://edgedb@localhost:5656/edgedb")?;
//!     let mut rows = Rows::default();
//!     connection.query(
//!         "SELECT User.name FILTER User.name = <str>$0",
//!         &QueryArgs::positional(vec!["dent".into()]),
//!         &mut rows,
//!         Cardinality::Many,
//!         OutputFormat::Binary,
//!     )?;
//!     Ok(())
//! }
//! ```

#![deny(missing_debug_implementations)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde;

mod conn;
mod edb_error;
mod protocol;
mod rows;
mod transaction;
mod types_impl;

pub use crate::conn::{
    Authenticator, CancelHandle, ConnectParams, ConnectParamsBuilder, ConnectionState,
    IntoConnectParams, Tls, TlsSecurity,
};

pub use crate::conn::Connection;
pub use crate::edb_error::{EdbError, EdbResult};
pub use crate::protocol::server_error::{ServerError, Severity};
pub use crate::protocol::value::{EdbValue, QueryArgs};
pub use crate::protocol::{Cardinality, OutputFormat};
pub use crate::rows::{RowSink, Rows};
pub use crate::transaction::Transaction;

/// Non-standard types that can occur within the [`EdbValue`]s produced by a
/// query.
pub mod types {
    pub use crate::types_impl::{memory::Memory, range::Range, relative_duration::RelativeDuration};
}

/// The protocol version this client implements.
pub const PROTOCOL_VERSION: (u16, u16) = (0, 13);

/// The default port of the database server.
pub const DEFAULT_PORT: u16 = 5656;
