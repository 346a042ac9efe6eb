//! Editor session controller.
//!
//! `EditorSession` owns the current code and coordinates the preference
//! store, the snapshot cache, the identity resolver and the assist
//! coordinator. All state sits behind one short-lived lock that is never held
//! across an `.await`, so the session can be shared in an `Arc` and driven
//! from several tasks at once.
//!
//! # Phases
//!
//! ```text
//!            mount / select_language / reset
//!   Idle ─────────────▶ Restoring ──load done──▶ Editing ◀──┐
//!                           ▲                     │  │     │ edit
//!                           └─────────────────────┘  │─────┘
//!                                                    │ submit_question
//!                                                    ▼
//!                      Editing ◀──fail── AssistPending ──ok──▶ AssistDisplayed
//! ```
//!
//! Font size and theme changes are allowed in any phase and never change it.
//!
//! # Supersession
//!
//! Every restore takes a generation number. A restore whose generation is no
//! longer the latest (because the language changed again, the session was
//! reset, or the user typed over that same language) discards its result
//! instead of overwriting the editor.
//!
//! Edits are saved under the language the editor is showing, which during a
//! switch is still the old one until the new snapshot arrives.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::Instrument;

use zencode_types::{FontSize, IdentityId, Language, ProfileState, Theme};

use crate::assist::{AssistCoordinator, AssistError, AssistResult};
use crate::constants::DEFAULT_CHECKOUT_URL;
use crate::identity::IdentityResolver;
use crate::prefs::{PreferenceStore, Preferences};
use crate::snapshot::SnapshotCache;
use crate::store::SharedStore;

/// The visual editor widget.
///
/// Calls arrive outside the session lock, so implementations may call back
/// into the session.
pub trait EditorSurface: Send + Sync {
    /// Replace the whole buffer.
    fn set_value(&self, code: &str);

    fn set_font_size(&self, _size: FontSize) {}

    fn set_theme(&self, _theme: Theme) {}
}

/// Primary state of the session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionPhase {
    #[default]
    Idle,
    Restoring,
    Editing,
    AssistPending,
    AssistDisplayed,
}

/// What the front end should render in the editor area.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Surface {
    /// Identity provider still loading.
    Skeleton,
    Editor,
}

/// Transient state of an open assist panel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssistPanel {
    pub question: String,
    pub pending: bool,
    /// Last successful answer, sanitized HTML.
    pub response: Option<String>,
    pub last_error: Option<String>,
}

#[derive(Debug, Default)]
struct SessionState {
    phase: SessionPhase,
    code: String,
    auth_loaded: bool,
    panel: Option<AssistPanel>,
    /// Bumped whenever a panel is opened, so answers for a closed panel
    /// never land in a newer one.
    panel_epoch: u64,
    /// Language whose code the editor holds.
    shown: Option<Language>,
    /// Target of the latest pending restore.
    restoring: Option<Language>,
}

impl SessionState {
    /// Phase once a restore is done or abandoned.
    fn settled_phase(&self) -> SessionPhase {
        if self.panel.as_ref().is_some_and(|p| p.pending) {
            SessionPhase::AssistPending
        } else {
            SessionPhase::Editing
        }
    }
}

/// Editor session controller.
pub struct EditorSession {
    prefs: PreferenceStore,
    snapshots: SnapshotCache,
    identity: IdentityResolver,
    assist: AssistCoordinator,
    surface: Arc<dyn EditorSurface>,
    checkout_url: String,
    restore_gen: AtomicU64,
    state: RwLock<SessionState>,
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("EditorSession")
            .field("phase", &state.phase)
            .field("prefs", &self.prefs.snapshot())
            .field("code_len", &state.code.len())
            .field("panel", &state.panel)
            .finish()
    }
}

impl EditorSession {
    /// Build a session over `store`, restoring persisted preferences.
    ///
    /// The session starts `Idle`; call [`mount`](Self::mount) to load code.
    pub async fn open(
        store: SharedStore,
        identity: IdentityResolver,
        assist: AssistCoordinator,
        surface: Arc<dyn EditorSurface>,
    ) -> Self {
        Self {
            prefs: PreferenceStore::restore(store.clone()).await,
            snapshots: SnapshotCache::new(store),
            identity,
            assist,
            surface,
            checkout_url: DEFAULT_CHECKOUT_URL.to_string(),
            restore_gen: AtomicU64::new(0),
            state: RwLock::new(SessionState::default()),
        }
    }

    pub fn with_checkout_url(mut self, url: impl Into<String>) -> Self {
        self.checkout_url = url.into();
        self
    }

    // ========================================================================
    // Code
    // ========================================================================

    /// Push preferences into the surface and restore the current language.
    pub async fn mount(&self) {
        let prefs = self.prefs.snapshot();
        self.surface.set_font_size(prefs.font_size);
        self.surface.set_theme(prefs.theme);
        tracing::info!(language = %prefs.language, "mounting editor session");
        let generation = self.begin_restore(&mut self.state.write(), prefs.language);
        self.restore(generation, prefs.language).await;
    }

    /// Switch language and restore its snapshot. Selecting the current
    /// language again is a no-op once mounted.
    pub async fn select_language(&self, language: Language) {
        let generation = {
            let mut state = self.state.write();
            if language == self.prefs.language() && state.phase != SessionPhase::Idle {
                return;
            }
            self.prefs.switch_language(language);
            self.begin_restore(&mut state, language)
        };
        self.prefs.persist_language().await;
        if self.restore_gen.load(Ordering::SeqCst) != generation {
            // A later selection took over while this write was out; its
            // value may have landed first.
            self.prefs.persist_language().await;
            tracing::debug!(language = %language, generation, "language selection superseded");
            return;
        }
        self.restore(generation, language).await;
    }

    /// Record an edit: the editor now holds `text` in full.
    pub async fn on_edit(&self, text: impl Into<String>) {
        let text = text.into();
        let language = {
            let mut state = self.state.write();
            let phase = state.phase;
            let Some(language) = state.shown.or(state.restoring) else {
                tracing::debug!("edit before mount ignored");
                return;
            };
            match phase {
                SessionPhase::Restoring if state.restoring == Some(language) => {
                    self.restore_gen.fetch_add(1, Ordering::SeqCst);
                    tracing::debug!(language = %language, "edit supersedes pending restore");
                    state.phase = state.settled_phase();
                    state.shown = Some(language);
                    state.restoring = None;
                }
                SessionPhase::Restoring => {
                    tracing::debug!(
                        language = %language,
                        pending = ?state.restoring,
                        "edit saved while another language loads"
                    );
                }
                SessionPhase::AssistDisplayed => state.phase = SessionPhase::Editing,
                SessionPhase::Idle | SessionPhase::Editing | SessionPhase::AssistPending => {}
            }
            state.code.clone_from(&text);
            language
        };
        self.snapshots.save(language, &text).await;
    }

    /// Drop the current language's snapshot and reload its starter code.
    pub async fn reset(&self) {
        let (generation, language) = {
            let mut state = self.state.write();
            let language = self.prefs.language();
            (self.begin_restore(&mut state, language), language)
        };
        let code = self
            .snapshots
            .reset(language)
            .instrument(tracing::debug_span!("session.reset", language = %language, generation))
            .await;
        self.finish_restore(generation, language, code);
    }

    async fn restore(&self, generation: u64, language: Language) {
        let code = self
            .snapshots
            .load(language)
            .instrument(tracing::debug_span!("session.restore", language = %language, generation))
            .await;
        self.finish_restore(generation, language, code);
    }

    /// Enter `Restoring` for `language` and take the next generation.
    fn begin_restore(&self, state: &mut SessionState, language: Language) -> u64 {
        state.phase = SessionPhase::Restoring;
        state.restoring = Some(language);
        self.restore_gen.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn finish_restore(&self, generation: u64, language: Language, code: String) {
        {
            let mut state = self.state.write();
            if self.restore_gen.load(Ordering::SeqCst) != generation {
                tracing::debug!(language = %language, generation, "discarding superseded restore");
                return;
            }
            state.phase = state.settled_phase();
            state.code.clone_from(&code);
            state.shown = Some(language);
            state.restoring = None;
        }
        self.surface.set_value(&code);
    }

    pub fn code(&self) -> String {
        self.state.read().code.clone()
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.read().phase
    }

    pub fn language(&self) -> Language {
        self.prefs.language()
    }

    /// Icon for the current language.
    pub fn icon_path(&self) -> String {
        self.prefs.language().icon_path()
    }

    // ========================================================================
    // Preferences
    // ========================================================================

    pub fn preferences(&self) -> Preferences {
        self.prefs.snapshot()
    }

    pub fn font_size(&self) -> FontSize {
        self.prefs.font_size()
    }

    /// Clamp, persist and apply a font size.
    pub async fn set_font_size(&self, requested: i64) -> FontSize {
        let size = self.prefs.set_font_size(requested).await;
        self.surface.set_font_size(size);
        size
    }

    pub async fn increase_font_size(&self) -> FontSize {
        let next = self.prefs.font_size().increment();
        self.set_font_size(next.get().into()).await
    }

    pub async fn decrease_font_size(&self) -> FontSize {
        let next = self.prefs.font_size().decrement();
        self.set_font_size(next.get().into()).await
    }

    pub fn theme(&self) -> Theme {
        self.prefs.theme()
    }

    pub async fn set_theme(&self, theme: Theme) {
        self.prefs.set_theme(theme).await;
        self.surface.set_theme(theme);
    }

    // ========================================================================
    // Identity
    // ========================================================================

    /// The identity provider finished (or restarted) loading.
    pub fn set_auth_loaded(&self, loaded: bool) {
        self.state.write().auth_loaded = loaded;
    }

    pub fn surface(&self) -> Surface {
        if self.state.read().auth_loaded {
            Surface::Editor
        } else {
            Surface::Skeleton
        }
    }

    /// Resolve the signed-in identity's profile.
    ///
    /// Signing in again with an identity that is already resolved, or still
    /// resolving, reuses that lookup.
    pub async fn sign_in(&self, identity: IdentityId) -> ProfileState {
        if self.identity.identity().as_ref() == Some(&identity) {
            let current = self.identity.current();
            if current != ProfileState::NotFound {
                return current;
            }
        }
        let state = self.identity.resolve(Some(identity)).await;
        self.close_assist_unless_visible();
        state
    }

    pub async fn sign_out(&self) {
        self.identity.resolve(None).await;
        self.close_assist_unless_visible();
    }

    pub fn identity(&self) -> Option<IdentityId> {
        self.identity.identity()
    }

    pub fn profile(&self) -> ProfileState {
        self.identity.current()
    }

    /// Whether the AI affordance is shown: signed in, resolved, subscribed.
    pub fn assist_visible(&self) -> bool {
        self.identity.identity().is_some() && self.identity.current().is_subscriber()
    }

    /// Where non-subscribers go to upgrade.
    pub fn upgrade_url(&self) -> &str {
        &self.checkout_url
    }

    // ========================================================================
    // Assist
    // ========================================================================

    /// Open the assist panel. Returns whether it is open.
    pub fn open_assist(&self) -> bool {
        if !self.assist_visible() {
            return false;
        }
        let mut state = self.state.write();
        if state.panel.is_none() {
            state.panel = Some(AssistPanel::default());
            state.panel_epoch += 1;
        }
        true
    }

    /// Close the panel and discard its state. A request still in flight
    /// finishes, but its answer is dropped.
    ///
    /// The conversation goes with it: the next panel starts from the priming
    /// history.
    pub fn close_assist(&self) {
        {
            let mut state = self.state.write();
            if state.panel.take().is_some()
                && matches!(
                    state.phase,
                    SessionPhase::AssistPending | SessionPhase::AssistDisplayed
                )
            {
                state.phase = SessionPhase::Editing;
            }
        }
        self.assist.chat().reset();
    }

    /// Flip the panel. Returns whether it is open afterwards.
    pub fn toggle_assist(&self) -> bool {
        if self.state.read().panel.is_some() {
            self.close_assist();
            false
        } else {
            self.open_assist()
        }
    }

    fn close_assist_unless_visible(&self) {
        if !self.assist_visible() {
            self.close_assist();
        }
    }

    pub fn assist_panel(&self) -> Option<AssistPanel> {
        self.state.read().panel.clone()
    }

    pub fn set_question(&self, question: impl Into<String>) -> Result<(), AssistError> {
        let mut state = self.state.write();
        let panel = state.panel.as_mut().ok_or(AssistError::PanelClosed)?;
        panel.question = question.into();
        Ok(())
    }

    /// Ask the panel's question about the current code.
    ///
    /// Fails with `Busy` immediately if a request is already in flight. On
    /// failure the previous answer stays in the panel.
    pub async fn submit_question(&self) -> AssistResult {
        if !self.assist_visible() {
            return Err(AssistError::NotSubscribed);
        }
        let (code, question, epoch) = {
            let state = self.state.read();
            let panel = state.panel.as_ref().ok_or(AssistError::PanelClosed)?;
            (state.code.clone(), panel.question.clone(), state.panel_epoch)
        };

        let ticket = self.assist.try_begin()?;
        {
            let mut state = self.state.write();
            if let Some(panel) = state.panel.as_mut() {
                panel.pending = true;
                panel.last_error = None;
            }
            state.phase = SessionPhase::AssistPending;
        }

        let result = ticket.send(&code, &question).await;

        let mut guard = self.state.write();
        let state = &mut *guard;
        let same_panel = state.panel_epoch == epoch;
        match (state.panel.as_mut(), same_panel) {
            (Some(panel), true) => {
                panel.pending = false;
                match &result {
                    Ok(html) => {
                        panel.response = Some(html.clone());
                        state.phase = SessionPhase::AssistDisplayed;
                    }
                    Err(e) => {
                        panel.last_error = Some(e.to_string());
                        state.phase = SessionPhase::Editing;
                    }
                }
            }
            _ => {
                tracing::debug!("assist panel closed, dropping answer");
                if state.phase == SessionPhase::AssistPending {
                    state.phase = SessionPhase::Editing;
                }
            }
        }
        result
    }

    pub fn is_assist_busy(&self) -> bool {
        self.assist.is_busy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ChatSession, CompletionRequest, CompletionResponse, LlmProvider, LlmResult};
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSurface {
        values: Mutex<Vec<String>>,
        font_sizes: Mutex<Vec<u8>>,
    }

    impl EditorSurface for RecordingSurface {
        fn set_value(&self, code: &str) {
            self.values.lock().push(code.to_string());
        }

        fn set_font_size(&self, size: FontSize) {
            self.font_sizes.lock().push(size.get());
        }
    }

    struct EchoProvider;

    #[async_trait]
    impl LlmProvider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        fn default_model(&self) -> &str {
            "echo-1"
        }

        async fn is_available(&self) -> bool {
            true
        }

        async fn complete(&self, request: CompletionRequest) -> LlmResult<CompletionResponse> {
            let turns = request.messages.len();
            Ok(CompletionResponse {
                content: format!("```html<p>turn {turns}</p>```"),
                model: "echo-1".into(),
                stop_reason: None,
                usage: Default::default(),
            })
        }
    }

    async fn session(surface: Arc<RecordingSurface>) -> EditorSession {
        let chat = Arc::new(ChatSession::new(Arc::new(EchoProvider), Vec::new()));
        EditorSession::open(
            Arc::new(MemoryStore::new()),
            IdentityResolver::offline(),
            AssistCoordinator::new(chat),
            surface,
        )
        .await
    }

    #[tokio::test]
    async fn test_mount_loads_default_code() {
        let surface = Arc::new(RecordingSurface::default());
        let session = session(surface.clone()).await;
        assert_eq!(session.phase(), SessionPhase::Idle);

        session.mount().await;
        assert_eq!(session.phase(), SessionPhase::Editing);
        assert_eq!(session.code(), Language::Javascript.default_code());
        assert_eq!(*surface.values.lock(), vec![Language::Javascript.default_code().to_string()]);
        assert_eq!(*surface.font_sizes.lock(), vec![16]);
    }

    #[tokio::test]
    async fn test_edit_before_mount_is_ignored() {
        let session = session(Arc::new(RecordingSurface::default())).await;
        session.on_edit("early").await;
        assert_eq!(session.code(), "");
        assert_eq!(session.phase(), SessionPhase::Idle);
    }

    #[tokio::test]
    async fn test_language_switch_restores_snapshots() {
        let session = session(Arc::new(RecordingSurface::default())).await;
        session.mount().await;
        session.on_edit("console.log(1)").await;

        session.select_language(Language::Python).await;
        assert_eq!(session.code(), Language::Python.default_code());
        assert_eq!(session.icon_path(), "/python.png");

        session.select_language(Language::Javascript).await;
        assert_eq!(session.code(), "console.log(1)");
    }

    #[tokio::test]
    async fn test_reset_restores_default() {
        let session = session(Arc::new(RecordingSurface::default())).await;
        session.mount().await;
        session.on_edit("scratch").await;
        session.reset().await;
        assert_eq!(session.code(), Language::Javascript.default_code());
        assert_eq!(session.phase(), SessionPhase::Editing);
    }

    #[tokio::test]
    async fn test_font_steps_clamp() {
        let surface = Arc::new(RecordingSurface::default());
        let session = session(surface.clone()).await;
        assert_eq!(session.set_font_size(23).await.get(), 23);
        assert_eq!(session.increase_font_size().await.get(), 24);
        assert_eq!(session.increase_font_size().await.get(), 24);
        assert_eq!(session.set_font_size(12).await.get(), 12);
        assert_eq!(session.decrease_font_size().await.get(), 12);
        assert_eq!(*surface.font_sizes.lock(), vec![23, 24, 24, 12, 12]);
    }

    #[tokio::test]
    async fn test_surface_waits_for_auth() {
        let session = session(Arc::new(RecordingSurface::default())).await;
        assert_eq!(session.surface(), Surface::Skeleton);
        session.set_auth_loaded(true);
        assert_eq!(session.surface(), Surface::Editor);
    }

    #[tokio::test]
    async fn test_assist_hidden_without_profile() {
        let session = session(Arc::new(RecordingSurface::default())).await;
        session.mount().await;
        assert_eq!(
            session.sign_in(IdentityId::new("user_1")).await,
            ProfileState::NotFound
        );
        assert!(!session.assist_visible());
        assert!(!session.open_assist());
        assert!(matches!(
            session.submit_question().await,
            Err(AssistError::NotSubscribed)
        ));
        assert!(matches!(
            session.set_question("why?"),
            Err(AssistError::PanelClosed)
        ));
        assert!(session.upgrade_url().starts_with("https://"));
    }
}
