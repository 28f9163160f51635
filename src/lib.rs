//! Crystal is a terminal chat client for an assistant backend that keeps
//! messages flowing whether or not its live connection is up.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the connection state machine, the per-message choice
//!   between live and fallback delivery, and the display message lifecycle,
//!   tied together by [`core::session::ChatSession`].
//! - [`transport`] provides the concrete WebSocket and HTTP transports behind
//!   the traits the core depends on.
//! - [`api`] defines the payloads exchanged with the backend.
//! - [`ui`] renders session updates and runs the interactive input loop.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod transport;
pub mod ui;
pub mod utils;
