//! Scenario tests - full builds through the orchestrator with mock tooling
//!
//! Each scenario wires an `Orchestrator` to an in-process toolchain,
//! server launcher and reload notifier, runs real builds against a
//! fixture project on disk, and asserts on the report, the emitted
//! events and the files that land in the output directory.

mod helpers;

mod failure_handling;
mod html_rewrite;
