//! Provider icon ids to weather-condition codes.

use serde::{Deserialize, Serialize};

/// Fixed provider icon table. `d`/`n` variants share a condition code.
pub const ICON_TABLE: &[(&str, u16)] = &[
    ("01d", 800),
    ("01n", 800),
    ("02d", 801),
    ("02n", 801),
    ("03d", 802),
    ("03n", 802),
    ("04d", 803),
    ("04n", 803),
    ("09d", 521),
    ("09n", 521),
    ("10d", 501),
    ("10n", 501),
    ("11d", 211),
    ("11n", 211),
    ("13d", 600),
    ("13n", 600),
    ("50d", 741),
    ("50n", 741),
];

/// Glyph shown when an icon id has no table entry
pub const UNKNOWN_GLYPH: &str = "?";

/// Look up the condition code for a provider icon id
pub fn condition_code(icon_id: &str) -> Option<u16> {
    ICON_TABLE
        .iter()
        .find(|(id, _)| *id == icon_id)
        .map(|(_, code)| *code)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherIcon {
    /// `None` renders as the placeholder glyph
    pub code: Option<u16>,
    pub is_day: bool,
}

impl WeatherIcon {
    pub fn from_icon_id(icon_id: &str) -> Self {
        Self {
            code: condition_code(icon_id),
            is_day: icon_id.ends_with('d'),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.code.is_none()
    }

    /// Icon asset name for the condition
    pub fn name(&self) -> &'static str {
        match (self.code, self.is_day) {
            (Some(800), true) => "day-sunny",
            (Some(800), false) => "night-clear",
            (Some(801), true) => "day-cloudy",
            (Some(801), false) => "night-alt-cloudy",
            (Some(802), _) => "cloud",
            (Some(803), _) => "cloudy",
            (Some(521), _) => "showers",
            (Some(501), true) => "day-rain",
            (Some(501), false) => "night-alt-rain",
            (Some(211), _) => "thunderstorm",
            (Some(600), _) => "snow",
            (Some(741), _) => "fog",
            _ => "na",
        }
    }

    /// Single-character glyph for terminal output
    pub fn glyph(&self) -> &'static str {
        match (self.code, self.is_day) {
            (Some(800), true) => "☀",
            (Some(800), false) => "☾",
            (Some(801..=803), _) => "☁",
            (Some(521 | 501), _) => "☂",
            (Some(211), _) => "⚡",
            (Some(600), _) => "❄",
            (Some(741), _) => "≡",
            _ => UNKNOWN_GLYPH,
        }
    }
}
