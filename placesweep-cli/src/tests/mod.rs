//! Shared test harness modules for the placesweep CLI.
#![expect(
    clippy::panic,
    reason = "Tests assert panic branches to surface unexpected CLI outcomes"
)]

use super::*;

mod steps;
mod unit;
