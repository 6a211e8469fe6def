//! Message boundary between the beatmap library core and a front end.
//!
//! Requests and replies are plain serde types so any ordered transport
//! (IPC channel, socket, in-process queue) can carry them.

pub mod backend;
pub mod config;
pub mod handlers;
pub mod messages;
pub mod picker;

pub use backend::{Backend, Session};
pub use config::AppConfig;
pub use messages::{Reply, Request};
pub use picker::{FolderPicker, FolderPurpose};
