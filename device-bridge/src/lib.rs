pub mod api;
pub mod artifacts;
pub mod config;
pub mod device;
pub mod dispatcher;
pub mod error;
pub mod hierarchy;
pub mod models;
pub mod selector;
