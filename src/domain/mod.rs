//! Core domain models for pinbump
//!
//! This module contains the fundamental types used throughout the application:
//! - Source references extracted from infrastructure files
//! - Update records describing planned edits
//! - Category rules and the blacklist supplied by configuration

mod rules;
mod source_ref;
mod update_record;

pub use rules::{Blacklist, CategoryRule, UNCATEGORIZED};
pub use source_ref::{SourceRef, ROOT_MODULE};
pub use update_record::{Replacement, UpdateRecord, LATEST_STRATEGY};
