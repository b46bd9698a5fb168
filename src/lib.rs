//! name-retention - Fill in PEP 541 reply templates from support issues
//!
//! Fetches a `pypi/support` issue, extracts the requested package name and
//! the requesting account from the issue text, looks the package up on
//! PyPI, and renders the reply templates with the resolved values
//! highlighted and the missing ones left visible.

pub mod cli;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod extract;
pub mod fields;
pub mod issue;
pub mod pipeline;
pub mod registry;
pub mod render;
pub mod selector;
pub mod template;
pub mod util;
