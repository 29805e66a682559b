//! Learn Sphere session client.
//!
//! ARCHITECTURE
//! ============
//! Leaves first: `token_store` persists the token pair, `net` sends requests
//! through the one-shot refresh interceptor, `session` validates the stored
//! credentials, `state::auth` owns the process-wide auth state, and `guard`
//! turns that state into render/redirect decisions. `routes` serves the built
//! frontend behind a coarse cookie pre-check.

pub mod config;
pub mod error;
pub mod guard;
pub mod net;
pub mod routes;
pub mod session;
pub mod state;
pub mod token_store;

pub use error::AuthError;
