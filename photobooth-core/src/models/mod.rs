pub mod capture_session;
pub mod config;
pub mod error;
pub mod overlay;
pub mod state;
pub mod touch;
