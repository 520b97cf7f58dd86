//! Command implementations.

pub mod list;
pub mod payload;
pub mod search;
pub mod show;
pub mod update;
pub mod upload;
