//! CLI command implementations

pub mod fields;
pub mod init;
pub mod run;
pub mod validate;
