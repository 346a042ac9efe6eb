//! Kernel configuration constants.
//!
//! Centralizes hardcoded values for easier configuration and documentation.

use std::time::Duration;

/// Storage key prefix for per-language code snapshots.
pub const SNAPSHOT_KEY_PREFIX: &str = "editor-code-";

/// Storage key for the editor font size.
pub const FONT_SIZE_KEY: &str = "editor-font-size";

/// Storage key for the editor theme.
pub const THEME_KEY: &str = "editor-theme";

/// Storage key for the last selected language.
pub const LANGUAGE_KEY: &str = "editor-language";

/// Bounded wait for one assist request.
pub const DEFAULT_ASSIST_TIMEOUT: Duration = Duration::from_secs(60);

/// Bounded wait for one profile lookup.
pub const PROFILE_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Question/answer pairs a chat session keeps after its seed history.
pub const MAX_CHAT_TURNS: usize = 20;

/// Default generative model.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Default generative API endpoint.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Environment variable consulted for the profile service deployment URL.
pub const DEFAULT_PROFILE_URL_ENV: &str = "CONVEX_URL";

/// Query path of the profile lookup function.
pub const PROFILE_QUERY_PATH: &str = "users:getUser";

/// Default checkout link for the paid tier.
pub const DEFAULT_CHECKOUT_URL: &str =
    "https://jcm.lemonsqueezy.com/buy/0fb8d0d8-0ec3-4f48-80b6-78982a4f0e90";

/// Config file location relative to the user config dir.
pub const CONFIG_FILE_REL: &str = "zencode/config.toml";

/// Storage file location relative to the user data dir.
pub const STORAGE_FILE_REL: &str = "zencode/storage.json";
