//! Data models

pub mod deployment;
pub mod secret;
pub mod step;
pub mod template;
