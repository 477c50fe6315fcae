//! Core types shared across the codebase.

mod content;
mod module;
mod state;

pub use content::{Content, ContentType};
pub use module::{Module, to_slash};
pub use state::{
    begin_update, end_update, is_busy, is_healthy, is_shutdown, register_server, set_healthy,
    setup_shutdown_handler,
};
