//! Field length limits shared across the workspace.
//!
//! String fields are clamped (silently truncated) to these limits at the
//! entity mutators; they never produce validation errors on their own.

/// Default length of a generated session code.
pub const SESSION_CODE_DEFAULT_LENGTH: usize = 10;
/// Maximum length of a session code.
pub const SESSION_CODE_MAX_LENGTH: usize = 32;
/// Maximum length of a session name.
pub const SESSION_NAME_MAX_LENGTH: usize = 128;
/// Maximum length of a session description.
pub const SESSION_DESCRIPTION_MAX_LENGTH: usize = 4096;
/// Maximum length of a session's estimate scale specification string.
pub const SESSION_SCALE_MAX_LENGTH: usize = 1024;
/// Maximum length of an item title.
pub const ITEM_TITLE_MAX_LENGTH: usize = 255;
/// Maximum length of an item description.
pub const ITEM_DESCRIPTION_MAX_LENGTH: usize = 4096;
/// Maximum length of a user display name.
pub const USER_NAME_MAX_LENGTH: usize = 128;

/// Truncate `s` to at most `max` characters, respecting char boundaries.
///
/// Returns a borrowed slice when no truncation is needed.
#[must_use]
pub fn clamp(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
