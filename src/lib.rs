//! Generates changelogs from conventional commit messages.
//!
//! Commits of the form `type(component): subject` are read from `git log`,
//! grouped into configurable sections and prepended to an existing Markdown
//! changelog as a new release.

pub mod changelog;
pub mod config;
pub mod date;
pub mod error;
pub mod fmt;
pub mod git;
pub mod link_style;
mod sectionmap;

pub use changelog::Changelog;
pub use link_style::LinkStyle;
pub use sectionmap::{ComponentMap, SectionMap};

/// The config file searched for in the project directory and its parents
pub const DEFAULT_CONFIG_FILE: &str = ".ez-changelog.toml";
