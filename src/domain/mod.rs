//! Domain primitives shared by the API, services and CLI.

pub mod lifecycle;

pub use lifecycle::{Lifecycle, classify};
