pub mod access;
pub mod error;
pub mod ports;
pub mod retry;
pub mod service;
