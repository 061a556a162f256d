//! Court records as returned by the backend.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::str::FromStr;

use super::geo::Coordinates;

crate::define_string_id!(CourtId);

/// Indoor/outdoor classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndoorOutdoor {
    Indoor,
    Outdoor,
}

/// Whether a venue has lights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lighting {
    Yes,
    No,
}

/// Venue access type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CourtType {
    #[serde(rename = "public")]
    Public,
    #[serde(rename = "private club")]
    PrivateClub,
    #[serde(rename = "pay to play")]
    PayToPlay,
    #[serde(rename = "HOA")]
    Hoa,
    /// Also absorbs values this client does not know about.
    #[serde(rename = "other", other)]
    Other,
}

/// Moderation status the listing endpoint filters on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CourtStatus {
    #[default]
    #[serde(rename = "active")]
    Active,
    #[serde(rename = "pending review")]
    PendingReview,
}

impl IndoorOutdoor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Indoor => "indoor",
            Self::Outdoor => "outdoor",
        }
    }
}

impl Lighting {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
        }
    }
}

impl CourtType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::PrivateClub => "private club",
            Self::PayToPlay => "pay to play",
            Self::Hoa => "HOA",
            Self::Other => "other",
        }
    }
}

impl CourtStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::PendingReview => "pending review",
        }
    }
}

impl FromStr for IndoorOutdoor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "indoor" => Ok(Self::Indoor),
            "outdoor" => Ok(Self::Outdoor),
            _ => Err(format!("Unknown indoor/outdoor value: {}", s)),
        }
    }
}

impl FromStr for Lighting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "yes" | "true" | "lights" => Ok(Self::Yes),
            "no" | "false" => Ok(Self::No),
            _ => Err(format!("Unknown lighting value: {}", s)),
        }
    }
}

impl FromStr for CourtType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', '-'], " ").as_str() {
            "public" => Ok(Self::Public),
            "private club" | "private" => Ok(Self::PrivateClub),
            "pay to play" => Ok(Self::PayToPlay),
            "hoa" => Ok(Self::Hoa),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown court type: {}", s)),
        }
    }
}

impl std::fmt::Display for IndoorOutdoor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for Lighting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for CourtType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A court listing.
///
/// Only `id` and `name` are guaranteed by the backend; every other field may be
/// missing on community-submitted venues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Court {
    #[serde(rename = "_id")]
    pub id: CourtId,
    pub name: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub address_city: Option<String>,
    #[serde(default)]
    pub address_state: Option<String>,
    #[serde(default, deserialize_with = "lenient_label")]
    pub indoor_outdoor: Option<IndoorOutdoor>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub number_of_courts: Option<u32>,
    #[serde(default, deserialize_with = "lenient_label")]
    pub lighting: Option<Lighting>,
    #[serde(default)]
    pub court_type: Option<CourtType>,
    #[serde(default)]
    pub surface_type: Option<String>,
}

/// Empty or unrecognised labels decode as `None` so one odd record cannot
/// fail a whole listing.
fn lenient_label<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s.parse().ok(),
        Some(Value::Bool(b)) => b.to_string().parse().ok(),
        _ => None,
    })
}

/// Accepts `6`, `6.0` and `"6"`. Anything else is `None`.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let count = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        }),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    Ok(count.and_then(|n| u32::try_from(n).ok()))
}

impl Court {
    /// Minimal record, mostly useful for fixtures.
    pub fn new(id: impl Into<CourtId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            latitude: None,
            longitude: None,
            address_city: None,
            address_state: None,
            indoor_outdoor: None,
            number_of_courts: None,
            lighting: None,
            court_type: None,
            surface_type: None,
        }
    }

    pub fn with_position(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    /// Both coordinates, if the court can be placed on a map.
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.latitude, self.longitude)
    }

    /// "City, ST" line shown under the name.
    pub fn location_label(&self) -> String {
        match (&self.address_city, &self.address_state) {
            (Some(city), Some(state)) => format!("{}, {}", city, state),
            (Some(city), None) => city.clone(),
            (None, Some(state)) => state.clone(),
            (None, None) => String::new(),
        }
    }

    /// "outdoor • 4 courts • lights" summary line.
    pub fn summary_label(&self) -> String {
        let kind = self.indoor_outdoor.map(|k| k.as_str()).unwrap_or("—");
        let count = self
            .number_of_courts
            .map(|n| n.to_string())
            .unwrap_or_else(|| "?".to_string());
        let lights = match self.lighting {
            Some(Lighting::Yes) => "lights",
            _ => "no lights",
        };
        format!("{} • {} courts • {}", kind, count, lights)
    }
}
