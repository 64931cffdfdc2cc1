use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Known listing sites
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Pap,
    Oqoro,
    LeBonCoin,
    LaCarteDesColocs,
}

impl Source {
    pub const ALL: [Source; 4] = [
        Source::Pap,
        Source::Oqoro,
        Source::LeBonCoin,
        Source::LaCarteDesColocs,
    ];

    /// Stable identifier, also used as the warehouse `source` column
    pub fn id(self) -> &'static str {
        match self {
            Source::Pap => "pap",
            Source::Oqoro => "oqoro",
            Source::LeBonCoin => "leboncoin",
            Source::LaCarteDesColocs => "lacartedescolocs",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Source::Pap => "PAP.fr",
            Source::Oqoro => "Oqoro",
            Source::LeBonCoin => "LeBonCoin",
            Source::LaCarteDesColocs => "La Carte des Colocs",
        }
    }

    /// Search results page for rentals
    pub fn listing_url(self) -> &'static str {
        match self {
            Source::Pap => "https://www.pap.fr/annonce/location-appartement-maison",
            Source::Oqoro => "https://www.oqoro.com/location",
            Source::LeBonCoin => "https://www.leboncoin.fr/locations",
            Source::LaCarteDesColocs => "https://www.lacartedescolocs.fr/",
        }
    }

    /// Origin that relative listing links are resolved against
    pub fn base_url(self) -> &'static str {
        match self {
            Source::Pap => "https://www.pap.fr",
            Source::Oqoro => "https://www.oqoro.com",
            Source::LeBonCoin => "https://www.leboncoin.fr",
            Source::LaCarteDesColocs => "https://www.lacartedescolocs.fr",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// One rental listing as handed to the loaders.
///
/// Serializes to exactly the warehouse row shape: `source`, `title`, `price`,
/// `size`, `location`, `link`, `timestamp`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    pub source: Source,
    pub title: String,
    /// Monthly rent in whole euros, `0` when unparsable
    pub price: u64,
    /// Surface in square meters, `0` when unknown
    pub size: u64,
    pub location: String,
    /// Always absolute
    pub link: String,
    pub timestamp: DateTime<Utc>,
}

/// Capture time with second precision
pub fn capture_time() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}
