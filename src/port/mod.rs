//! Traits at the seams of the engine: actors, conditions and directors.

pub mod actor;
pub mod condition;
pub mod director;
