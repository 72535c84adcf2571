//! Lifecycle integration tests driving the local engine with real part scripts.

#![cfg(unix)]

mod common;
mod clean_tests;
mod overlay_tests;
mod run_tests;
