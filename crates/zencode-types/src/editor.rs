//! Editor presentation preferences: font size and theme.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, IntoEnumIterator};

/// Editor font size in points.
///
/// Construction always clamps, so a `FontSize` can never hold a value outside
/// `[FontSize::MIN, FontSize::MAX]`.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub struct FontSize(u8);

impl FontSize {
    pub const MIN: u8 = 12;
    pub const MAX: u8 = 24;
    pub const DEFAULT: FontSize = FontSize(16);

    /// Clamp any requested size into range.
    pub fn clamped(requested: i64) -> Self {
        Self(requested.clamp(Self::MIN as i64, Self::MAX as i64) as u8)
    }

    /// Parse a persisted value. Unparsable text yields `None`; out-of-range
    /// numbers are clamped.
    pub fn parse_stored(raw: &str) -> Option<Self> {
        raw.trim().parse::<i64>().ok().map(Self::clamped)
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    /// One step larger, saturating at the maximum.
    pub fn increment(&self) -> Self {
        Self::clamped(self.0 as i64 + 1)
    }

    /// One step smaller, saturating at the minimum.
    pub fn decrement(&self) -> Self {
        Self::clamped(self.0 as i64 - 1)
    }

    pub fn is_min(&self) -> bool {
        self.0 <= Self::MIN
    }

    pub fn is_max(&self) -> bool {
        self.0 >= Self::MAX
    }
}

impl Default for FontSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<i64> for FontSize {
    fn from(v: i64) -> Self {
        Self::clamped(v)
    }
}

impl From<FontSize> for u8 {
    fn from(v: FontSize) -> Self {
        v.0
    }
}

impl fmt::Display for FontSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Editor color theme.
#[derive(
    Clone, Copy, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize, Display, AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Theme {
    #[default]
    VsDark,
    VsLight,
    GithubDark,
    Monokai,
    SolarizedDark,
}

/// Returned when parsing a theme id that is not known.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown theme: {0}")]
pub struct UnknownTheme(pub String);

impl FromStr for Theme {
    type Err = UnknownTheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Theme::iter()
            .find(|t| t.as_ref().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownTheme(wanted.to_string()))
    }
}

impl Theme {
    pub fn all() -> Vec<Theme> {
        Theme::iter().collect()
    }

    pub fn label(&self) -> &'static str {
        match self {
            Theme::VsDark => "VS Dark",
            Theme::VsLight => "VS Light",
            Theme::GithubDark => "GitHub Dark",
            Theme::Monokai => "Monokai",
            Theme::SolarizedDark => "Solarized Dark",
        }
    }

    pub fn is_dark(&self) -> bool {
        !matches!(self, Theme::VsLight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_bounds() {
        assert_eq!(FontSize::clamped(5).get(), 12);
        assert_eq!(FontSize::clamped(99).get(), 24);
        assert_eq!(FontSize::clamped(16).get(), 16);
        assert_eq!(FontSize::clamped(i64::MIN).get(), 12);
        assert_eq!(FontSize::clamped(i64::MAX).get(), 24);
    }

    #[test]
    fn test_parse_stored() {
        assert_eq!(FontSize::parse_stored("18"), Some(FontSize::clamped(18)));
        assert_eq!(FontSize::parse_stored(" 40 "), Some(FontSize::clamped(24)));
        assert_eq!(FontSize::parse_stored("big"), None);
    }

    #[test]
    fn test_steps_saturate() {
        let max = FontSize::clamped(24);
        assert_eq!(max.increment(), max);
        assert!(max.is_max());

        let min = FontSize::clamped(12);
        assert_eq!(min.decrement(), min);
        assert!(min.is_min());

        assert_eq!(FontSize::DEFAULT.increment().get(), 17);
    }

    #[test]
    fn test_deserialize_clamps() {
        let size: FontSize = serde_json::from_str("3").unwrap();
        assert_eq!(size.get(), 12);
        assert_eq!(serde_json::to_string(&FontSize::clamped(20)).unwrap(), "20");
    }

    #[test]
    fn test_theme_parse() {
        assert_eq!("vs-dark".parse::<Theme>(), Ok(Theme::VsDark));
        assert_eq!("Solarized-Dark".parse::<Theme>(), Ok(Theme::SolarizedDark));
        assert!("neon".parse::<Theme>().is_err());
        assert_eq!(Theme::GithubDark.to_string(), "github-dark");
    }
}
