use serde::{Deserialize, Serialize};

use crate::storage::Persistence;

pub const THEME_KEY: &str = "cinestream-theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn is_light(&self) -> bool {
        matches!(self, Theme::Light)
    }
}

pub struct ThemeStore {
    current: Theme,
    persistence: Persistence,
}

impl ThemeStore {
    pub fn load(persistence: Persistence) -> Self {
        let current = persistence.load(THEME_KEY).unwrap_or_default();
        Self {
            current,
            persistence,
        }
    }

    pub fn current(&self) -> Theme {
        self.current
    }

    pub fn toggle(&mut self) -> Theme {
        self.current = self.current.toggled();
        self.persistence.save(THEME_KEY, &self.current);
        self.current
    }
}
