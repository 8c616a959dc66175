//! LSP Protocol Implementation
//!
//! The session dispatcher plus the tower-lsp backend that feeds it.

pub mod backend;
pub mod handlers;
pub mod server;
pub mod session;

pub use backend::Backend;
pub use session::{Incoming, Message, Outgoing, Response, Session, SessionState};
