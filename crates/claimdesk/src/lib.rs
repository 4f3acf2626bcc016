//! Debt claim calculation and scripted claim intake.
//!
//! [`workflows::ledger`] computes accrued interest, total claim amounts, and recovery rates for
//! a bond. [`workflows::intake`] drives the case-type keyed question flow that collects
//! transactions and generates the claim statement text.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
