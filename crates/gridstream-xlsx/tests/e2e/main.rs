//! End-to-end tests for gridstream-xlsx.
//!
//! Each test builds the package it needs in memory (see `common`), opens it
//! with `Document`, and checks what comes back. Write tests close the
//! document and open the resulting package again.

mod common;
mod reading;
mod writing;

// Re-export common utilities for submodules
pub use common::*;
