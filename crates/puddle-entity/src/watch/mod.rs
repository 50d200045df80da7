//! Watch entities.

pub mod model;

pub use model::Watch;
