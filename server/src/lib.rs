//! Session register & broadcast server library.
//!
//! This module exposes the server components for use in tests and binaries.

pub mod config;
pub mod player;
pub mod protocol;
pub mod session_loop;
pub mod state;
pub mod ws;
