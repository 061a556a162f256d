use serde::{Deserialize, Serialize};

use super::court::{CourtType, IndoorOutdoor, Lighting};

/// Search text plus the optional filter selections of the Courts Map view.
///
/// Every field is independent; `None` (or empty text) means "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSet {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub indoor_outdoor: Option<IndoorOutdoor>,
    #[serde(default)]
    pub min_courts: Option<u32>,
    #[serde(default)]
    pub court_type: Option<CourtType>,
    #[serde(default)]
    pub lighting: Option<Lighting>,
}

/// A single-field edit, as produced by one form control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterUpdate {
    Text(String),
    IndoorOutdoor(Option<IndoorOutdoor>),
    MinCourts(Option<u32>),
    CourtType(Option<CourtType>),
    Lighting(Option<Lighting>),
}

impl FilterSet {
    /// Apply one edit. Returns `true` if the set actually changed.
    pub fn apply(&mut self, update: FilterUpdate) -> bool {
        match update {
            FilterUpdate::Text(text) => replace_if_changed(&mut self.text, text),
            FilterUpdate::IndoorOutdoor(v) => replace_if_changed(&mut self.indoor_outdoor, v),
            FilterUpdate::MinCourts(v) => replace_if_changed(&mut self.min_courts, v),
            FilterUpdate::CourtType(v) => replace_if_changed(&mut self.court_type, v),
            FilterUpdate::Lighting(v) => replace_if_changed(&mut self.lighting, v),
        }
    }

    pub fn is_unconstrained(&self) -> bool {
        self.text.trim().is_empty()
            && self.indoor_outdoor.is_none()
            && self.min_courts.is_none()
            && self.court_type.is_none()
            && self.lighting.is_none()
    }
}

fn replace_if_changed<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

impl FilterUpdate {
    /// Build an update from a form field name and its raw input value.
    ///
    /// An empty value unsets the field. `min_courts` must be a non-negative integer.
    pub fn parse(field: &str, raw: &str) -> Result<Self, String> {
        let value = raw.trim();
        let unset = value.is_empty();
        match field {
            "q" | "text" | "query" => Ok(Self::Text(raw.to_string())),
            "indoor_outdoor" | "indoor" => Ok(Self::IndoorOutdoor(if unset {
                None
            } else {
                Some(value.parse()?)
            })),
            "min_courts" | "courts" => {
                if unset {
                    return Ok(Self::MinCourts(None));
                }
                value
                    .parse::<u32>()
                    .map(|n| Self::MinCourts(Some(n)))
                    .map_err(|_| format!("min_courts must be a non-negative integer: {}", raw))
            }
            "court_type" | "type" => Ok(Self::CourtType(if unset {
                None
            } else {
                Some(value.parse()?)
            })),
            "lighting" | "lights" => Ok(Self::Lighting(if unset {
                None
            } else {
                Some(value.parse()?)
            })),
            other => Err(format!("Unknown filter field: {}", other)),
        }
    }
}
