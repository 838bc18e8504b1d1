//! Command handlers

pub mod config;
pub mod draft;
pub mod fetch;
pub mod list;
pub mod preview;
pub mod publish;
