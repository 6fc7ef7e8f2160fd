//! Test Module
//!
//! Cross-module test suite for the SymSafe core.
//!
//! ## Test Categories
//! - `triage_tests`: matching properties and knowledge-base scenarios
//! - `pipeline_tests`: turn orchestration against mock generators
//! - `integration_tests`: full sessions against a mock HTTP generator, with logs on disk

mod triage_tests;
