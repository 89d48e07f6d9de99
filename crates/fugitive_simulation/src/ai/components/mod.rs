//! AI components

pub mod behavior;


// Re-export all components
pub use behavior::*;
