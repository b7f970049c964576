//! Establishment kind discriminator.
//!
//! # Invariants
//! - The set of categories is closed: `attraction`, `hotel`, `restaurant`.
//! - The text form is the value persisted in the `category` column of the
//!   shared location and image tables.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Kind of establishment a shared location/image row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Attraction,
    Hotel,
    Restaurant,
}

impl Category {
    /// All categories in declaration order.
    pub const ALL: [Category; 3] = [Self::Attraction, Self::Hotel, Self::Restaurant];

    /// Persisted text form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Attraction => "attraction",
            Self::Hotel => "hotel",
            Self::Restaurant => "restaurant",
        }
    }

    /// Parses the persisted text form; `None` for anything outside the set.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "attraction" => Some(Self::Attraction),
            "hotel" => Some(Self::Hotel),
            "restaurant" => Some(Self::Restaurant),
            _ => None,
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
