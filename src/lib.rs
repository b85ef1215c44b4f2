//! Demonstration driver for the container provisioning service.

pub mod scenarios;

pub use scenarios::{run_scenarios, ScenarioOutcome, ScenarioReport};
