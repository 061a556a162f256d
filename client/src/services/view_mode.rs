use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Map plus list, or the list alone.
///
/// Purely presentational: switching never touches filters, viewport or selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Combined,
    ListOnly,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Combined => Self::ListOnly,
            Self::ListOnly => Self::Combined,
        }
    }

    pub fn shows_map(self) -> bool {
        matches!(self, Self::Combined)
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "map" | "combined" => Ok(Self::Combined),
            "list" | "list_only" | "list-only" => Ok(Self::ListOnly),
            _ => Err(format!("Unknown view mode: {}", s)),
        }
    }
}
