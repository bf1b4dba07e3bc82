//! Command implementations

pub mod project;
