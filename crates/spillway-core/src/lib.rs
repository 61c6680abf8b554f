//! # spillway-core
//! Commitment scheme and allocation trees for the Spillway distribution engine.

pub mod commitment;
pub mod error;
pub mod tree;
pub mod types;
