//! CLI command implementations.

pub mod calibrate;
pub mod codes;
pub mod common;
pub mod run;
