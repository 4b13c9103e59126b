#![warn(missing_docs)]
//! # formatter-shell-policy
//!
//! ## Purpose
//! Implements the navigation and permission policy for the `formatter-shell`
//! desktop window.
//!
//! ## Responsibilities
//! - Build the allowed-origins set from runtime configuration.
//! - Judge navigation targets against that set, failing closed.
//! - Deny every renderer permission request.
//!
//! ## Data flow
//! The composition root calls [`build_allowed_origins`] once per window
//! session -> every navigation attempt is checked with
//! [`is_navigation_allowed`] -> blocked http(s) targets are redirected to the
//! system browser when [`should_open_externally`] agrees.
//!
//! ## Ownership and lifetimes
//! [`AllowedOrigins`] is immutable after construction and shared read-only
//! with the navigation handler for the lifetime of the window session.
//!
//! ## Error model
//! Policy decisions are total functions returning booleans; malformed input
//! is treated as a denial, never as an error.
//!
//! ## Security and privacy notes
//! - Unparseable navigation targets are always denied.
//! - The file-scheme sentinel is granted only in packaged mode.
//! - Permission requests are denied unconditionally; any future grant must be
//!   an explicit allow-list entry here.
//!
//! ## Example
//! ```rust
//! use formatter_shell_policy::{build_allowed_origins, is_navigation_allowed};
//!
//! let allowed = build_allowed_origins(false, "http://localhost:3000");
//! assert!(is_navigation_allowed("http://localhost:3000/settings", &allowed));
//! assert!(!is_navigation_allowed("https://example.com", &allowed));
//! ```

use std::collections::BTreeSet;

use url::Url;

/// Set member representing blanket trust of local `file://` URLs.
pub const FILE_SCHEME_SENTINEL: &str = "file://";

/// Immutable set of navigation origins trusted by the desktop window.
///
/// Each member is either a normalized ASCII origin (`scheme://host:port`,
/// default ports elided) or [`FILE_SCHEME_SENTINEL`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedOrigins {
    entries: BTreeSet<String>,
}

impl AllowedOrigins {
    /// Returns `true` when `origin` is an exact member of the set.
    pub fn contains_origin(&self, origin: &str) -> bool {
        self.entries.contains(origin)
    }

    /// Returns `true` when local `file://` URLs are trusted.
    pub fn file_scheme_allowed(&self) -> bool {
        self.entries.contains(FILE_SCHEME_SENTINEL)
    }

    /// Returns the number of set members, sentinel included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing is trusted.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builds the allowed-origins set for one window session.
///
/// The dev server origin is added whenever `dev_server_url` parses; a
/// malformed dev URL is skipped silently rather than treated as fatal. The
/// file-scheme sentinel is present if and only if `packaged` is `true`.
pub fn build_allowed_origins(packaged: bool, dev_server_url: &str) -> AllowedOrigins {
    let mut entries = BTreeSet::new();

    if let Ok(url) = Url::parse(dev_server_url) {
        entries.insert(url.origin().ascii_serialization());
    }

    if packaged {
        entries.insert(FILE_SCHEME_SENTINEL.to_string());
    }

    AllowedOrigins { entries }
}

/// Judges one navigation target against the allowed set.
///
/// Fails closed: any target that does not parse as a URL is denied. A
/// `file:` scheme target is allowed exactly when the sentinel is present,
/// regardless of path. Every other target must match a set member by exact
/// normalized origin.
pub fn is_navigation_allowed(target: &str, allowed: &AllowedOrigins) -> bool {
    let Ok(url) = Url::parse(target) else {
        return false;
    };

    if url.scheme() == "file" {
        return allowed.file_scheme_allowed();
    }

    allowed.contains_origin(&url.origin().ascii_serialization())
}

/// Returns `true` when a blocked target should open in the system browser.
///
/// Only http/https targets leave the shell; every other scheme is dropped.
pub fn should_open_externally(target: &str) -> bool {
    let lower = target.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Decides one renderer permission request.
///
/// Always denies. This is the deny-by-default posture for the embedded
/// renderer; a future grant must be added here as a named allow-list entry,
/// never as an implicit default elsewhere.
pub fn should_grant_permission(_permission: &str) -> bool {
    false
}
