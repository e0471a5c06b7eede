//! Redcall - typed, non-blocking command calls for Redis-compatible stores
//!
//! # Example
//!
//! ```no_run
//! use redcall::{ClientConfig, Commands, Connection, SetOptions};
//! use std::time::Duration;
//!
//! # async fn run() -> redcall::Result<()> {
//! let conn = Connection::connect(&ClientConfig::from_env()).await?;
//!
//! // SET/GET
//! conn.set("key", "value", SetOptions::new().expire(Duration::from_secs(60))).await?;
//! let value = conn.get("key").await?;
//! assert_eq!(value, Some("value".to_string()));
//!
//! // callback style
//! conn.incr("hits").on_complete(|hits| println!("hits: {:?}", hits));
//! # Ok(())
//! # }
//! ```

pub mod call;
pub mod commands;
pub mod config;
pub mod connection;
pub mod error;
pub mod extract;
pub mod resp;
pub mod scan;
pub mod target;
pub mod types;

#[cfg(test)]
mod testing;

pub use call::{CommandCall, Completion, Deferred, ExecutionContext};
pub use commands::Commands;
pub use config::ClientConfig;
pub use connection::Connection;
pub use error::{CallError, Result};
pub use extract::{FromResp, Ttl};
pub use resp::{RespReader, RespValue, ToArg};
pub use scan::{ScanIterator, ScanState};
pub use target::CommandTarget;
pub use types::{Expiry, SetMode, SetOptions};
