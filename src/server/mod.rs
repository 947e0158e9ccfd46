pub mod config;
mod http_layers;
pub mod server;
pub mod session;
mod sse;
pub mod state;
pub mod stdio;

pub use config::ServerConfig;
pub use http_layers::*;
#[allow(unused_imports)] // Used by main.rs
pub use server::{make_app, run_server};
pub use stdio::run_stdio;
