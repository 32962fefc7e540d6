//! Wire protocol and session configuration shared by the session server
//! and its clients.

pub mod config;
pub mod protocol;
