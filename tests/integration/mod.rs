//! Shared fixtures for the pipeline integration tests

pub mod fixtures;
