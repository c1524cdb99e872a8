//! Theme preference context.

use anyhow::Result;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::storage::{LocalStorage, THEME_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dark" => Ok(Self::Dark),
            "light" => Ok(Self::Light),
            other => Err(format!("unknown theme: {}", other)),
        }
    }
}

/// Current theme, loaded once from local storage and written back on change.
pub struct ThemeContext {
    storage: Arc<LocalStorage>,
    current: RwLock<Theme>,
}

impl ThemeContext {
    /// Saved preference wins; without one, follow the host's dark-mode preference.
    pub fn load(storage: Arc<LocalStorage>, prefers_dark: bool) -> Self {
        let saved: Option<Theme> = storage.get(THEME_KEY);
        let initial = match saved {
            Some(theme) => theme,
            None if prefers_dark => Theme::Dark,
            None => Theme::Light,
        };

        tracing::debug!("Theme initialized: {}", initial.as_str());
        Self {
            storage,
            current: RwLock::new(initial),
        }
    }

    pub fn current(&self) -> Theme {
        *self.current.read()
    }

    pub fn set(&self, theme: Theme) -> Result<()> {
        self.storage.set(THEME_KEY, &theme)?;
        *self.current.write() = theme;
        Ok(())
    }

    /// Flip dark/light and persist; returns the new theme
    pub fn toggle(&self) -> Result<Theme> {
        let next = self.current().toggled();
        self.set(next)?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use tempfile::tempdir;

    fn storage(dir: &tempfile::TempDir) -> Arc<LocalStorage> {
        Arc::new(LocalStorage::open(&dir.path().join("local.json")).unwrap())
    }

    #[test]
    fn test_saved_preference_wins() {
        let dir = tempdir().unwrap();
        let store = storage(&dir);
        store.set(THEME_KEY, &"light").unwrap();

        let ctx = ThemeContext::load(store, true);
        assert_eq!(ctx.current(), Theme::Light);
    }

    #[test]
    fn test_falls_back_to_host_preference() {
        let dir = tempdir().unwrap();
        assert_eq!(ThemeContext::load(storage(&dir), true).current(), Theme::Dark);
        assert_eq!(ThemeContext::load(storage(&dir), false).current(), Theme::Light);
    }

    #[test]
    fn test_toggle_persists() {
        let dir = tempdir().unwrap();
        let ctx = ThemeContext::load(storage(&dir), true);
        assert_eq!(ctx.toggle().unwrap(), Theme::Light);

        let reloaded = ThemeContext::load(storage(&dir), true);
        assert_eq!(reloaded.current(), Theme::Light);
    }

    #[test]
    fn test_parse_theme() {
        assert_eq!("Dark".parse::<Theme>().unwrap(), Theme::Dark);
        assert!("sepia".parse::<Theme>().is_err());
    }
}
