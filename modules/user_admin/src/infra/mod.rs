pub mod http;
pub mod memory;
