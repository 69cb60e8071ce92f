//! Branch name rules.
//!
//! Branches are stored one file per branch under `refs/heads/`, so names
//! are a single path component:
//! - non-empty, at most 255 bytes
//! - no whitespace, `/`, `\`, `~`, `^`, `:`, `?`, `*`, `[`
//! - no `..`, no `@{`
//! - must not start or end with `.`, must not end with `.lock`

use crate::error::{StoreError, StoreResult};

/// The branch every repository starts with.
pub const DEFAULT_BRANCH: &str = "main";

const FORBIDDEN_CHARS: &[char] = &['/', '\\', '~', '^', ':', '?', '*', '['];

/// Validate a branch name, returning `Ok(())` if it can be used as a ref.
///
/// ```
/// use marg_store::refs::validate_branch_name;
///
/// assert!(validate_branch_name("main").is_ok());
/// assert!(validate_branch_name("review-2026").is_ok());
/// assert!(validate_branch_name("feature/x").is_err());
/// ```
pub fn validate_branch_name(name: &str) -> StoreResult<()> {
    let reject = |reason: String| {
        Err(StoreError::InvalidBranchName {
            name: name.to_string(),
            reason,
        })
    };

    if name.is_empty() {
        return reject("must not be empty".into());
    }
    if name.len() > 255 {
        return reject("must be at most 255 bytes".into());
    }
    if let Some(ch) = name
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || FORBIDDEN_CHARS.contains(c))
    {
        return reject(format!("contains forbidden character {ch:?}"));
    }
    if name.contains("..") {
        return reject("must not contain '..'".into());
    }
    if name.contains("@{") {
        return reject("must not contain '@{'".into());
    }
    if name.starts_with('.') || name.ends_with('.') {
        return reject("must not start or end with '.'".into());
    }
    if name.ends_with(".lock") {
        return reject("must not end with '.lock'".into());
    }
    Ok(())
}
