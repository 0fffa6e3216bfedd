pub mod artifacts;
pub mod cleanup;
pub mod config;
pub mod errors;
pub mod gates;
pub mod init;
pub mod logging;
pub mod pipeline;
pub mod session;
pub mod settings;
pub mod stage;
pub mod ui;
