//! Helpers for working with agent content and streamed events.

pub mod accumulator;
pub mod parts;

pub use accumulator::TextAccumulator;
pub use parts::*;
