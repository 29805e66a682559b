//! Process-wide state containers.
//!
//! SYSTEM CONTEXT
//! ==============
//! Each container has a single writer; readers take snapshots or subscribe.

pub mod auth;
