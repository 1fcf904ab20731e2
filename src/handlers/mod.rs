//! Event Handling Module
//!
//! Sits between raw terminal events and application state changes.
//!
//! # Module Organization
//!
//! - **`keys`**: Keyboard input processing, editing and list navigation
//! - **`run`**: Background snippet runs and their results
//!

pub mod keys;
pub mod run;
