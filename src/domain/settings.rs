//! Per-article settings bag and the enumerations derived from it.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::error::DomainError;

pub const PULLQUOTE: &str = "pullquote";
pub const PULLQUOTE_POSITION: &str = "pullquote_position";
pub const ENABLE_ADVERTISEMENT: &str = "enable_advertisement";
pub const BODY_ORIENTATION: &str = "body_orientation";
pub const IS_PREVIEW: &str = "is_preview";
pub const IS_SPONSORED: &str = "is_sponsored";
pub const MATURITY_RATING: &str = "maturity_rating";
pub const SECTIONS: &str = "sections";

/// Loosely typed value as supplied by the host CMS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<SettingValue>),
}

impl SettingValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            SettingValue::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Booleans accept `true`/`false`, `yes`/`no`, `1`/`0` and non-zero numbers.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(value) => Some(*value),
            SettingValue::Number(value) => Some(*value != 0.0),
            SettingValue::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                "yes" | "true" | "1" | "on" => Some(true),
                "no" | "false" | "0" | "off" | "" => Some(false),
                _ => None,
            },
            SettingValue::List(_) => None,
        }
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            SettingValue::Number(value) if *value >= 0.0 && value.fract() == 0.0 => {
                Some(*value as usize)
            }
            SettingValue::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_text_list(&self) -> Vec<String> {
        match self {
            SettingValue::List(items) => items
                .iter()
                .filter_map(|item| item.as_text().map(str::to_string))
                .collect(),
            SettingValue::Text(text) if !text.trim().is_empty() => vec![text.trim().to_string()],
            _ => Vec::new(),
        }
    }
}

/// Key/value settings attached to one article.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentSettings {
    values: BTreeMap<String, SettingValue>,
}

impl ContentSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: SettingValue) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.values.get(key)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(SettingValue::as_text)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(SettingValue::as_bool)
    }

    pub fn list(&self, key: &str) -> Vec<String> {
        self.get(key)
            .map(SettingValue::as_text_list)
            .unwrap_or_default()
    }

    pub fn pullquote_position(&self) -> Option<PullQuotePosition> {
        let value = self.get(PULLQUOTE_POSITION)?;
        if let Some(index) = value.as_index() {
            return Some(PullQuotePosition::Index(index));
        }
        value.as_text().and_then(|text| text.parse().ok())
    }

    pub fn body_orientation(&self) -> Result<Option<BodyOrientation>, DomainError> {
        self.text(BODY_ORIENTATION).map(str::parse).transpose()
    }
}

/// Side the article body sits on; anchored components take the other side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyOrientation {
    #[default]
    Left,
    Right,
    Center,
}

impl BodyOrientation {
    pub fn as_str(self) -> &'static str {
        match self {
            BodyOrientation::Left => "left",
            BodyOrientation::Right => "right",
            BodyOrientation::Center => "center",
        }
    }
}

impl FromStr for BodyOrientation {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(BodyOrientation::Left),
            "right" => Ok(BodyOrientation::Right),
            "center" | "centre" => Ok(BodyOrientation::Center),
            other => Err(DomainError::unknown_value(BODY_ORIENTATION, other)),
        }
    }
}

impl fmt::Display for BodyOrientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a pull quote is spliced into the component sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullQuotePosition {
    Index(usize),
    Top,
    Middle,
    Bottom,
}

impl PullQuotePosition {
    /// Concrete index for a sequence of `count` components.
    pub fn resolve(self, count: usize) -> usize {
        match self {
            PullQuotePosition::Index(index) => index,
            PullQuotePosition::Top => 1,
            PullQuotePosition::Middle => count.div_ceil(2),
            PullQuotePosition::Bottom => count.saturating_sub(1),
        }
    }
}

impl FromStr for PullQuotePosition {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "top" => Ok(PullQuotePosition::Top),
            "middle" => Ok(PullQuotePosition::Middle),
            "bottom" => Ok(PullQuotePosition::Bottom),
            other => other
                .parse()
                .map(PullQuotePosition::Index)
                .map_err(|_| DomainError::unknown_value(PULLQUOTE_POSITION, other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_accept_cms_spellings() {
        let settings = ContentSettings::new()
            .with(ENABLE_ADVERTISEMENT, SettingValue::Text("yes".to_string()))
            .with(IS_PREVIEW, SettingValue::Bool(true))
            .with(IS_SPONSORED, SettingValue::Text("no".to_string()));

        assert_eq!(settings.flag(ENABLE_ADVERTISEMENT), Some(true));
        assert_eq!(settings.flag(IS_PREVIEW), Some(true));
        assert_eq!(settings.flag(IS_SPONSORED), Some(false));
        assert_eq!(settings.flag("missing"), None);
    }

    #[test]
    fn pullquote_position_accepts_numbers_and_names() {
        let numeric = ContentSettings::new().with(PULLQUOTE_POSITION, SettingValue::Number(3.0));
        assert_eq!(numeric.pullquote_position(), Some(PullQuotePosition::Index(3)));

        let named =
            ContentSettings::new().with(PULLQUOTE_POSITION, SettingValue::Text("middle".into()));
        assert_eq!(named.pullquote_position(), Some(PullQuotePosition::Middle));
        assert_eq!(PullQuotePosition::Middle.resolve(5), 3);
        assert_eq!(PullQuotePosition::Bottom.resolve(0), 0);
    }

    #[test]
    fn settings_deserialize_from_mixed_json() {
        let settings: ContentSettings = serde_json::from_str(
            r#"{"pullquote":"Quoted","pullquote_position":2,"sections":["a","b"],"is_preview":true}"#,
        )
        .expect("settings");
        assert_eq!(settings.text(PULLQUOTE), Some("Quoted"));
        assert_eq!(settings.list(SECTIONS), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(settings.flag(IS_PREVIEW), Some(true));
    }

    #[test]
    fn unknown_orientation_is_rejected() {
        let settings =
            ContentSettings::new().with(BODY_ORIENTATION, SettingValue::Text("diagonal".into()));
        assert!(settings.body_orientation().is_err());
    }
}
