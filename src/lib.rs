//! casework: derives case workflow status from recorded task progress.

pub mod engine;
