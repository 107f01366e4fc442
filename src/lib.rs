pub mod api;
pub mod codec;
pub mod config;
pub mod handlers;
pub mod observability;
pub mod storage;
