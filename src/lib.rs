pub mod archive;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod git;
pub mod prompt;
pub mod vault;
