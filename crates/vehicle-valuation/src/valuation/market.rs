//! Geographic demand adjustments keyed by ZIP code.
//!
//! Reference values are whole percentage points (`5.0` is plus five percent);
//! [`MarketAdjustment::fraction`] is the only conversion into the fractional
//! convention used by the rest of the pipeline.

use serde::{Deserialize, Serialize};

/// Sampled metro ZIP codes and their demand multipliers in percentage points.
pub const MARKET_TABLE: &[(&str, f64)] = &[
    ("90210", 5.0),
    ("95113", 4.8),
    ("94103", 4.5),
    ("10022", 4.2),
    ("98101", 4.0),
    ("10001", 3.8),
    ("96813", 3.6),
    ("02108", 3.5),
    ("90012", 3.2),
    ("20001", 3.0),
    ("92101", 2.9),
    ("33101", 2.8),
    ("80202", 2.7),
    ("97201", 2.6),
    ("78701", 2.4),
    ("60601", 2.1),
    ("95814", 1.8),
    ("30303", 1.6),
    ("19103", 1.5),
    ("37203", 1.3),
    ("75201", 1.2),
    ("28202", 1.0),
    ("84101", 0.9),
    ("77002", 0.8),
    ("33602", 0.7),
    ("55401", 0.6),
    ("27601", 0.4),
    ("32801", 0.3),
    ("89101", -0.8),
    ("21202", -1.1),
    ("85004", -1.5),
    ("78205", -1.9),
    ("23219", -2.0),
    ("43215", -2.2),
    ("99501", -2.5),
    ("53202", -2.7),
    ("45202", -3.0),
    ("70112", -3.1),
    ("64105", -3.3),
    ("87102", -3.4),
    ("46204", -3.6),
    ("63101", -3.8),
    ("68102", -4.2),
    ("15222", -4.4),
    ("73102", -4.6),
    ("74103", -4.9),
    ("38103", -5.2),
    ("44113", -5.8),
    ("35203", -6.1),
    ("48226", -6.5),
    ("39201", -8.0),
];

/// Three-digit prefixes surrounding the tabulated metros.
const SUBURBAN_PREFIXES: &[&str] = &[
    "070", "075", "113", "117", "193", "207", "223", "301", "333", "601", "604", "773", "853",
    "913", "917", "926", "945", "950", "980",
];

/// Coarse density bucket returned by geocoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionClass {
    Urban,
    Suburban,
    Rural,
}

impl RegionClass {
    pub fn percent_points(self) -> f64 {
        match self {
            RegionClass::Urban => 4.0,
            RegionClass::Suburban => 2.0,
            RegionClass::Rural => 0.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RegionClass::Urban => "urban",
            RegionClass::Suburban => "suburban",
            RegionClass::Rural => "rural",
        }
    }
}

/// Geocoding collaborator consulted when a ZIP code is not tabulated.
pub trait RegionClassifier: Send + Sync {
    fn classify(&self, zip: &str) -> Option<RegionClass>;
}

/// Offline classifier keyed on three-digit ZIP prefixes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipPrefixClassifier;

impl RegionClassifier for ZipPrefixClassifier {
    fn classify(&self, zip: &str) -> Option<RegionClass> {
        let prefix = zip.get(..3)?;
        if MARKET_TABLE
            .iter()
            .any(|(known, _)| known.starts_with(prefix))
        {
            Some(RegionClass::Urban)
        } else if SUBURBAN_PREFIXES.contains(&prefix) {
            Some(RegionClass::Suburban)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarketSource {
    Table,
    RegionFallback { region: RegionClass },
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketAdjustment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    pub percent_points: f64,
    pub source: MarketSource,
}

impl MarketAdjustment {
    pub fn neutral(zip: Option<String>) -> Self {
        Self {
            zip,
            percent_points: 0.0,
            source: MarketSource::Default,
        }
    }

    pub fn fraction(&self) -> f64 {
        self.percent_points / 100.0
    }

    pub fn description(&self) -> String {
        let zip = self.zip.as_deref().unwrap_or("unknown area");
        match self.source {
            MarketSource::Table => {
                format!("Local demand in {zip} ({:+.1}%)", self.percent_points)
            }
            MarketSource::RegionFallback { region } => format!(
                "{} market estimate for {zip} ({:+.1}%)",
                region.label(),
                self.percent_points
            ),
            MarketSource::Default => format!("No market data for {zip}"),
        }
    }
}

/// Five-digit ZIP from `ddddd` or ZIP+4 `ddddd-dddd` input.
pub fn normalize_zip(raw: &str) -> Option<&str> {
    let digits = |part: &str, len: usize| {
        part.len() == len && part.bytes().all(|byte| byte.is_ascii_digit())
    };
    let trimmed = raw.trim();
    let (zip, plus_four) = match trimmed.split_once('-') {
        Some((zip, plus_four)) => (zip, Some(plus_four)),
        None => (trimmed, None),
    };
    let valid = digits(zip, 5) && plus_four.map_or(true, |extension| digits(extension, 4));
    valid.then_some(zip)
}

fn tabulated(zip: &str) -> Option<f64> {
    let zip = normalize_zip(zip)?;
    MARKET_TABLE
        .iter()
        .find(|(known, _)| *known == zip)
        .map(|(_, points)| *points)
}

/// Tabulated multiplier in percentage points; unknown ZIP codes are neutral.
pub fn market_multiplier(zip: &str) -> f64 {
    tabulated(zip).unwrap_or(0.0)
}

/// Table lookup with the region-class fallback for untabulated ZIP codes.
pub fn market_adjustment(
    zip: Option<&str>,
    classifier: Option<&dyn RegionClassifier>,
) -> MarketAdjustment {
    let Some(raw) = zip else {
        return MarketAdjustment::neutral(None);
    };
    let zip = normalize_zip(raw).unwrap_or(raw.trim()).to_string();

    if let Some(points) = tabulated(&zip) {
        return MarketAdjustment {
            zip: Some(zip),
            percent_points: points,
            source: MarketSource::Table,
        };
    }

    match classifier.and_then(|classifier| classifier.classify(&zip)) {
        Some(region) => MarketAdjustment {
            zip: Some(zip),
            percent_points: region.percent_points(),
            source: MarketSource::RegionFallback { region },
        },
        None => MarketAdjustment::neutral(Some(zip)),
    }
}
