//! Project configuration snapshot consumed by the prompt builders.

pub mod model;

pub use model::*;
