//! partcraft-lib: build lifecycle orchestration for part-based projects.
//!
//! A project is a set of named parts, each advancing through the steps
//! `pull -> overlay -> build -> stage -> prime`. This crate provides:
//! - `Lifecycle`: the orchestrator that plans and runs steps through an engine
//! - `ExecutionEngine`: the engine interface, with `LocalEngine` as the engine shipped here
//! - `Project`: the declarative project model loaded from `partcraft.yaml`
//! - step resolution, progress messages and parallelism resolution

pub mod action;
pub mod consts;
pub mod engine;
pub mod lifecycle;
pub mod parallel;
pub mod platform;
pub mod project;
pub mod step;

#[cfg(test)]
mod util;
