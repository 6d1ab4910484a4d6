//! Utility functions and helpers for sermon-assist.
//!
//! - `logging`: Tracing initialization and credential redaction.

pub mod logging;
