//! Gym Agent CLI: command implementations shared by the `gym-agent` binary
//! and the integration tests.

pub mod commands;
