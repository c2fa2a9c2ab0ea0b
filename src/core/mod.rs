//! Core functionality: record model, XML codec, edit session, and configuration

pub mod codec;
pub mod config;
pub mod file_system;
pub mod record;
pub mod session;
pub mod validation;
