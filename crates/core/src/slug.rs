//! Organization slug derivation.
//!
//! A slug is a pure function of the organization name and the set of slugs
//! that already exist at creation time:
//!
//! 1. lower-case the name,
//! 2. replace each run of characters outside `[a-z0-9]` with one `-`,
//! 3. trim leading and trailing `-`,
//! 4. on collision append `-2`, `-3`, ... until the slug is unused.
//!
//! A name with no ASCII alphanumerics at all yields [`FALLBACK_SLUG`] as the
//! base so the slug is never empty.

use std::sync::LazyLock;

use regex::Regex;

/// Base slug used when a name contains no ASCII letters or digits.
pub const FALLBACK_SLUG: &str = "organization";

static NON_ALPHANUMERIC_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[^a-z0-9]+").expect("valid regex"));

/// Derive the base slug for a name, ignoring collisions.
///
/// ```
/// use taskhub_core::slug::slugify;
///
/// assert_eq!(slugify("Acme Corp"), "acme-corp");
/// assert_eq!(slugify("  R&D -- Labs! "), "r-d-labs");
/// ```
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    let hyphenated = NON_ALPHANUMERIC_RUN.replace_all(&lowered, "-");
    let trimmed = hyphenated.trim_matches('-');
    if trimmed.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Derive a slug for `name` that `is_taken` reports as free.
///
/// The base slug is tried first, then `base-2`, `base-3`, and so on.
pub fn unique_slug(name: &str, is_taken: impl Fn(&str) -> bool) -> String {
    let base = slugify(name);
    if !is_taken(&base) {
        return base;
    }
    (2u64..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !is_taken(candidate))
        .unwrap_or(base)
}

/// `true` if `slug` has the shape [`slugify`] produces.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}
