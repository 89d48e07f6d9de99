//! AI systems (behavior FSM, capture handling).

pub mod behavior;
pub mod capture;

pub use behavior::flee_behavior_system;
pub use capture::{capture_agent, handle_capture_requests};
