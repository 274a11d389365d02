//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types and operations
//! - Arena key types
//! - Time management
//! - Logging utilities
//! - Structured value merging

pub mod collections;
pub mod logging;
pub mod math;
pub mod merge;
pub mod time;
