//! HTTP and WebSocket handlers for all routes.

pub mod compute;
pub mod pages;
pub mod session;
pub mod ws;
