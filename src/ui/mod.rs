//! UI components for the metadata editor

pub mod file_list;
pub mod preview;
pub mod table;
