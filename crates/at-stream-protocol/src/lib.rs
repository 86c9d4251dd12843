//! AT Command Stream Protocol
//!
//! This crate drives AT-style command/response exchanges with modems and radio
//! modules over a byte-oriented serial link. It sends one command at a time,
//! reassembles the peer's reply line by line, and reports the outcome once a
//! terminal status line arrives.
//!
//! # Protocol Overview
//!
//! - **Commands** (host → device): `AT+<NAME>\r\n`, or `AT+<NAME>=<args>\r\n`
//!   with comma-separated arguments (`"text"`, `42`, or an empty field for null)
//! - **Responses** (device → host): any number of lines, ended by a line that
//!   is exactly `OK`, `ERROR` or `FAIL`
//! - **Line endings**: `\r` is ignored, `\n` ends a line
//!
//! The session is half-duplex and poll-driven: [`AtSession::execute`] writes a
//! command, then [`AtSession::poll`] / [`AtSession::is_ready`] feed incoming
//! bytes through the [`LineAssembler`] until the exchange completes.
//!
//! # Known limitation
//!
//! The protocol has no framing beyond lines and three status tokens. An
//! unsolicited line from the peer is indistinguishable from a response line
//! while a command is in flight, and a peer that never sends a status line
//! leaves the session waiting forever.
//!
//! # Example
//!
//! ```rust,ignore
//! use at_stream_protocol::{Argument, AtSession, Outcome};
//!
//! let mut session = AtSession::new(&mut transport);
//!
//! // Sends: AT+SETVER="version",2\r\n
//! session.execute("SETVER", &[Argument::string("version"), Argument::Integer(2)])?;
//! session.wait_until_ready()?;
//!
//! if session.outcome() == Some(Outcome::Ok) {
//!     println!("{}", session.response().unwrap_or_default());
//! }
//! ```

mod argument;
mod assembler;
mod buffer;
mod config;
mod error;
mod mock;
mod session;
mod transport;

pub use argument::*;
pub use assembler::*;
pub use buffer::*;
pub use config::*;
pub use error::*;
pub use mock::*;
pub use session::*;
pub use transport::*;
