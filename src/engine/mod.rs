//! Core engine modules for casework.

pub mod backend;
pub mod db;
pub mod seed;
pub mod settings;
pub mod status;
pub mod store;
pub mod types;
pub mod workflow;
