//! # zencode-kernel
//!
//! Session core for the zencode editor.
//!
//! The kernel coordinates four unreliable collaborators (durable storage, a
//! remote profile service, a generative model, and the editor widget) into
//! one race-free editing session:
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`store`] | Async key-value storage: memory, JSON file, degrading fallback |
//! | [`prefs`] | Language, theme and clamped font size with write-through |
//! | [`snapshot`] | Per-language code snapshots |
//! | [`identity`] | Identity → profile resolution, last identity wins |
//! | [`llm`] | Chat-completion providers and multi-turn chat sessions |
//! | [`assist`] | Single-flight assist requests and HTML sanitation |
//! | [`session`] | The editor session controller tying it all together |
//! | [`config`] | TOML configuration and wiring helpers |

pub mod assist;
pub mod config;
pub mod constants;
pub mod identity;
pub mod llm;
pub mod prefs;
pub mod session;
pub mod snapshot;
pub mod store;

pub use assist::{
    AssistCoordinator, AssistError, AssistResult, AssistTicket, HtmlSanitizer, ScriptStripper,
    TrustedSource,
};
pub use config::{ConfigError, SanitizerKind, ZencodeConfig};
pub use identity::{ConvexProfileService, IdentityResolver, ProfileError, ProfileService};
pub use llm::{
    ChatSession, CompletionRequest, CompletionResponse, GeminiProvider, LlmError, LlmProvider,
    LlmResult, Message as LlmMessage, ProviderConfig, Role as LlmRole,
};
pub use prefs::{PreferenceStore, Preferences};
pub use session::{AssistPanel, EditorSession, EditorSurface, SessionPhase, Surface};
pub use snapshot::SnapshotCache;
pub use store::{
    FallbackStore, FileStore, KvStore, MemoryStore, SharedStore, StoreError, StoreResult,
};
