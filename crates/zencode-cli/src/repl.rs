//! Line-oriented command loop.
//!
//! Each input line is one [`Command`]. Edits, preferences and panel toggles
//! run inline; identity lookups and assist requests are spawned so typing
//! keeps flowing while they are out.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};

use zencode_kernel::{AssistError, EditorSession};
use zencode_types::{IdentityId, Language, ProfileState, Theme, UnknownLanguage, UnknownTheme};

/// Font size adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontChange {
    Set(i64),
    Increase,
    Decrease,
}

/// One REPL command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Language(Language),
    Languages,
    Show,
    Type(String),
    Load(PathBuf),
    Font(FontChange),
    Theme(Option<Theme>),
    Reset,
    Login(IdentityId),
    Logout,
    ToggleAssist,
    Ask(String),
    Upgrade,
    Help,
    Quit,
    Empty,
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("unknown command: {0} (try `help`)")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error(transparent)]
    Language(#[from] UnknownLanguage),

    #[error(transparent)]
    Theme(#[from] UnknownTheme),

    #[error("not a font size: {0}")]
    FontSize(String),
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word {
            "" => Command::Empty,
            "lang" if rest.is_empty() => return Err(CommandError::Usage("lang <language>")),
            "lang" => Command::Language(rest.parse()?),
            "langs" => Command::Languages,
            "show" => Command::Show,
            "type" => Command::Type(rest.to_string()),
            "load" if rest.is_empty() => return Err(CommandError::Usage("load <file>")),
            "load" => Command::Load(PathBuf::from(rest)),
            "font" => Command::Font(match rest {
                "+" => FontChange::Increase,
                "-" => FontChange::Decrease,
                "" => return Err(CommandError::Usage("font <size|+|->")),
                n => FontChange::Set(n.parse().map_err(|_| CommandError::FontSize(n.to_string()))?),
            }),
            "theme" if rest.is_empty() => Command::Theme(None),
            "theme" => Command::Theme(Some(rest.parse()?)),
            "reset" => Command::Reset,
            "login" if rest.is_empty() => return Err(CommandError::Usage("login <identity>")),
            "login" => Command::Login(IdentityId::new(rest)),
            "logout" => Command::Logout,
            "ai" => Command::ToggleAssist,
            "ask" if rest.is_empty() => return Err(CommandError::Usage("ask <question>")),
            "ask" => Command::Ask(rest.to_string()),
            "upgrade" => Command::Upgrade,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

pub fn print_help() {
    println!(
        r#"COMMANDS:
    lang <language>      Switch language (restores its saved code)
    langs                List languages
    show                 Print the current buffer
    type <text>          Append a line to the buffer
    load <file>          Replace the buffer with a file's contents
    font <n|+|->         Set or step the font size (12-24)
    theme [name]         Set the theme, or list themes
    reset                Discard edits for the current language
    login <identity>     Sign in and look up the subscription
    logout               Sign out
    ai                   Toggle the AI assist panel (Pro)
    ask <question>       Ask the assistant about the current code
    upgrade              Show the upgrade link
    help                 Show this help
    quit                 Exit"#
    );
}

fn prompt(session: &EditorSession) {
    let marker = if session.is_assist_busy() { "…" } else { "" };
    print!("{}{}> ", session.language(), marker);
    let _ = std::io::stdout().flush();
}

/// Read commands from stdin until `quit` or end of input.
pub async fn run(session: Arc<EditorSession>) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt(&session);
        let Some(line) = lines.next_line().await.context("reading stdin")? else {
            println!();
            return Ok(());
        };
        match Command::parse(&line) {
            Ok(Command::Quit) => return Ok(()),
            Ok(command) => execute(&session, command).await,
            Err(e) => println!("{e}"),
        }
    }
}

async fn execute(session: &Arc<EditorSession>, command: Command) {
    match command {
        Command::Empty | Command::Quit => {}
        Command::Help => print_help(),
        Command::Language(language) => session.select_language(language).await,
        Command::Languages => {
            let current = session.language();
            for language in Language::all() {
                let marker = if language == current { "*" } else { " " };
                println!("{marker} {:<11} {}", language.id(), language.label());
            }
        }
        Command::Show => {
            let prefs = session.preferences();
            println!(
                "── {} ({}) · {} · {}px ──",
                prefs.language.label(),
                session.icon_path(),
                prefs.theme.label(),
                prefs.font_size
            );
            println!("{}", session.code());
        }
        Command::Type(text) => {
            let mut code = session.code();
            if !code.is_empty() && !code.ends_with('\n') {
                code.push('\n');
            }
            code.push_str(&text);
            session.on_edit(code).await;
        }
        Command::Load(path) => match tokio::fs::read_to_string(&path).await {
            Ok(code) => session.on_edit(code).await,
            Err(e) => println!("cannot read {}: {e}", path.display()),
        },
        Command::Font(change) => {
            let size = match change {
                FontChange::Set(n) => session.set_font_size(n).await,
                FontChange::Increase => session.increase_font_size().await,
                FontChange::Decrease => session.decrease_font_size().await,
            };
            if size.is_min() || size.is_max() {
                println!("font size {size} (limit)");
            }
        }
        Command::Theme(Some(theme)) => session.set_theme(theme).await,
        Command::Theme(None) => {
            let current = session.theme();
            for theme in Theme::all() {
                let marker = if theme == current { "*" } else { " " };
                println!("{marker} {:<15} {}", theme.as_ref(), theme.label());
            }
        }
        Command::Reset => session.reset().await,
        Command::Login(identity) => spawn_login(session.clone(), identity),
        Command::Logout => {
            session.sign_out().await;
            println!("signed out");
        }
        Command::ToggleAssist => {
            if !session.assist_visible() {
                println!("AI assist is a Pro feature. Upgrade: {}", session.upgrade_url());
            } else if session.toggle_assist() {
                println!("assist panel open; `ask <question>`");
            } else {
                println!("assist panel closed");
            }
        }
        Command::Ask(question) => {
            if session.assist_visible() && session.assist_panel().is_none() {
                session.open_assist();
            }
            match session.set_question(question) {
                Ok(()) => spawn_ask(session.clone()),
                Err(AssistError::PanelClosed) => {
                    println!("AI assist is a Pro feature. Upgrade: {}", session.upgrade_url())
                }
                Err(e) => println!("{e}"),
            }
        }
        Command::Upgrade => println!("{}", session.upgrade_url()),
    }
}

pub fn spawn_login(session: Arc<EditorSession>, identity: IdentityId) {
    tokio::spawn(async move {
        let state = session.sign_in(identity.clone()).await;
        if session.identity().as_ref() != Some(&identity) {
            return;
        }
        println!("\n{}", login_message(&identity, &state));
        prompt(&session);
    });
}

/// What to print once a sign-in returns. `Unknown` means an earlier lookup
/// for the same identity is still out.
fn login_message(identity: &IdentityId, state: &ProfileState) -> String {
    match state {
        ProfileState::Resolved(profile) if profile.is_pro => {
            format!("signed in as {} (Pro)", profile.name)
        }
        ProfileState::Resolved(profile) => format!("signed in as {}", profile.name),
        ProfileState::NotFound => format!("signed in as {identity} (no profile)"),
        ProfileState::Unknown => format!("signing in as {identity}, profile still resolving…"),
    }
}

fn spawn_ask(session: Arc<EditorSession>) {
    tokio::spawn(async move {
        match session.submit_question().await {
            Ok(html) => println!("\n── assist ──\n{html}\n────────────"),
            Err(AssistError::Busy) => println!("\nstill waiting for the previous answer"),
            Err(e) => println!("\nassist failed: {e}"),
        }
        prompt(&session);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use zencode_types::UserProfile;

    #[test]
    fn test_parse_language() {
        assert_eq!(
            Command::parse("lang Python").unwrap(),
            Command::Language(Language::Python)
        );
        assert!(matches!(
            Command::parse("lang cobol"),
            Err(CommandError::Language(_))
        ));
        assert_eq!(
            Command::parse("lang"),
            Err(CommandError::Usage("lang <language>"))
        );
    }

    #[test]
    fn test_parse_font() {
        assert_eq!(
            Command::parse("font 99").unwrap(),
            Command::Font(FontChange::Set(99))
        );
        assert_eq!(
            Command::parse("font -").unwrap(),
            Command::Font(FontChange::Decrease)
        );
        assert_eq!(
            Command::parse("font +").unwrap(),
            Command::Font(FontChange::Increase)
        );
        assert!(matches!(
            Command::parse("font big"),
            Err(CommandError::FontSize(_))
        ));
    }

    #[test]
    fn test_parse_theme() {
        assert_eq!(Command::parse("theme").unwrap(), Command::Theme(None));
        assert_eq!(
            Command::parse("theme monokai").unwrap(),
            Command::Theme(Some(Theme::Monokai))
        );
    }

    #[test]
    fn test_parse_free_text_keeps_spacing() {
        assert_eq!(
            Command::parse("type   let x =  1;").unwrap(),
            Command::Type("let x =  1;".into())
        );
        assert_eq!(
            Command::parse("ask why is this slow?").unwrap(),
            Command::Ask("why is this slow?".into())
        );
    }

    #[test]
    fn test_parse_misc() {
        assert_eq!(Command::parse("").unwrap(), Command::Empty);
        assert_eq!(Command::parse("  quit ").unwrap(), Command::Quit);
        assert_eq!(
            Command::parse("login user_2abc").unwrap(),
            Command::Login(IdentityId::new("user_2abc"))
        );
        assert!(matches!(
            Command::parse("frobnicate"),
            Err(CommandError::Unknown(w)) if w == "frobnicate"
        ));
    }

    #[test]
    fn test_login_message_per_state() {
        let identity = IdentityId::new("user_2abc");
        let free = UserProfile::free("user_2abc", "a@example.com", "Ada");

        assert_eq!(
            login_message(&identity, &ProfileState::Resolved(free.clone().upgraded())),
            "signed in as Ada (Pro)"
        );
        assert_eq!(
            login_message(&identity, &ProfileState::Resolved(free)),
            "signed in as Ada"
        );
        assert_eq!(
            login_message(&identity, &ProfileState::NotFound),
            "signed in as user_2abc (no profile)"
        );
        let pending = login_message(&identity, &ProfileState::Unknown);
        assert!(pending.contains("resolving"));
        assert!(!pending.contains("no profile"));
    }
}
