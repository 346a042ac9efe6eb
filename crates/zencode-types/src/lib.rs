//! Shared editor, language, and profile types for zencode.
//!
//! This is the leaf crate of the workspace: it has **no internal zencode
//! dependencies** and carries no I/O. Everything here is plain data that the
//! kernel and the front ends pass around.
//!
//! # Key Types
//!
//! |--------------------|---------------------------------------------------|
//! | Type               | Purpose                                           |
//! |--------------------|---------------------------------------------------|
//! | [`Language`]       | Supported language, default code, icon lookup     |
//! | [`FontSize`]       | Editor font size, always within `[12, 24]`        |
//! | [`Theme`]          | Editor color theme                                |
//! | [`IdentityId`]     | Stable id handed out by the identity provider     |
//! | [`UserProfile`]    | Remote profile record (subscription tier)         |
//! | [`ProfileState`]   | Unknown / Resolved / NotFound gating state        |
//! |--------------------|---------------------------------------------------|

pub mod editor;
pub mod ids;
pub mod language;
pub mod profile;

// Re-export primary types at crate root for convenience.
pub use editor::{FontSize, Theme, UnknownTheme};
pub use ids::IdentityId;
pub use language::{Language, UnknownLanguage};
pub use profile::{ProfileState, UserProfile};

/// Current time as Unix milliseconds.
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
