//! Shared fixtures for the hwperf end-to-end tests.
//!
//! Fixture reports live under `tests/fixtures/`; [`FixtureWorkspace`] copies them into a
//! scratch directory so each test owns its reports root.

pub mod test_harness;

pub use test_harness::{fixture_dir, init_tracing, FixtureWorkspace, TestResult};
