pub mod api;
pub mod clock;
pub mod config;
pub mod notify;
pub mod session;
pub mod task;
