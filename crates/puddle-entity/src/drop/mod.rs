//! Drop entities.

pub mod model;

pub use model::{Drop, NewDrop};
