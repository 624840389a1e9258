//! Shared fixtures for the cross-crate tests and benchmarks.

pub mod grammars;
