//! Integration test suite for the Spillway distribution engine.
//!
//! This crate contains end-to-end lifecycle tests, adversarial
//! property-based tests, and the tests pinning the root acceptance
//! policy. Every payout-critical invariant is verified through the
//! public crate surfaces only, the way an embedding host would drive
//! the engine.

pub mod helpers;
