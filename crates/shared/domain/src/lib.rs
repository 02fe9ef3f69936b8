//! # Domain Models
//!
//! This crate contains pure domain types with minimal dependencies (`serde`, `bitflags`).
//! Keep it lean: no I/O, networking, or heavy logic, just inventory records, configuration
//! and the names every slice agrees on.

pub mod config;
pub mod constants;
pub mod model;
pub mod privileges;
pub mod registry;
