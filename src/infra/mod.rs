//! Infrastructure adapters and runtime bootstrap.

pub mod error;
pub mod publish;
pub mod telemetry;
