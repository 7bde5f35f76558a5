//! # colmatch API
//!
//! REST surface for interactive reconciliation. Each session is created from
//! two schema documents and driven through propose, confirm, submit and
//! override calls; see [`RestApi::configure`] for the routes.

pub mod error;
pub mod registry;
pub mod rest;

pub use error::ApiError;
pub use registry::SessionRegistry;
pub use rest::RestApi;
