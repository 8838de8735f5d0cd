//! End-to-End Integration Tests
//!
//! These tests drive the SSO core through the engine with in-memory stores
//! and scripted protocol collaborators.

mod common;
mod logout_flows;
mod negotiation;
mod tgt_lifecycle;
