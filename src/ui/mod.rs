//! Terminal front end for chat sessions.
//!
//! - [`chat_loop`]: reads input lines, handles local `/` commands and feeds
//!   everything else to a [`crate::core::session::SessionHandle`].
//! - [`renderer`]: formats session updates as transcript lines.
//!
//! This layer only presents state. [`crate::core`] owns the connection,
//! dispatch and message lifecycle.

pub mod chat_loop;
pub mod renderer;
