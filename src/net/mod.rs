//! Networking modules for the Learn Sphere REST API.
//!
//! SYSTEM CONTEXT
//! ==============
//! `transport` sends raw requests, `client` layers bearer attachment and the
//! refresh interceptor on top, `api` wraps the auth endpoints, and `types`
//! defines the wire schema.

pub mod api;
pub mod client;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
