//! Core type definitions used across the Hearth workspace.

pub mod id;

pub use id::*;
