//! Static reference prices: new-vehicle baselines per make and typical
//! resale value of common options.

use super::domain::Cents;

/// Baseline used when a make is not catalogued.
pub const DEFAULT_BASE_PRICE: Cents = Cents(3_000_000);

const BASE_PRICES: &[(&str, i64)] = &[
    ("acura", 42_000),
    ("audi", 48_000),
    ("bmw", 52_000),
    ("buick", 34_000),
    ("cadillac", 55_000),
    ("chevrolet", 36_000),
    ("chrysler", 38_000),
    ("dodge", 40_000),
    ("ford", 38_000),
    ("genesis", 50_000),
    ("gmc", 45_000),
    ("honda", 30_000),
    ("hyundai", 28_000),
    ("infiniti", 46_000),
    ("jaguar", 58_000),
    ("jeep", 40_000),
    ("kia", 27_000),
    ("landrover", 70_000),
    ("lexus", 50_000),
    ("lincoln", 55_000),
    ("mazda", 30_000),
    ("mercedesbenz", 56_000),
    ("mini", 32_000),
    ("mitsubishi", 25_000),
    ("nissan", 30_000),
    ("porsche", 95_000),
    ("ram", 45_000),
    ("subaru", 31_000),
    ("tesla", 50_000),
    ("toyota", 32_000),
    ("volkswagen", 31_000),
    ("volvo", 48_000),
];

const EQUIPMENT_VALUES: &[(&str, i64)] = &[
    ("sunroof", 800),
    ("moonroof", 800),
    ("navigation", 600),
    ("leatherseats", 900),
    ("heatedseats", 400),
    ("premiumaudio", 700),
    ("adaptivecruisecontrol", 1_000),
    ("thirdrowseating", 1_200),
    ("towpackage", 750),
    ("allwheeldrive", 1_500),
    ("awd", 1_500),
    ("backupcamera", 300),
];

/// Lowercase alphanumeric key, so "Mercedes-Benz" and "mercedes benz" match.
fn catalog_key(raw: &str) -> String {
    raw.chars()
        .filter(|ch| ch.is_ascii_alphanumeric())
        .map(|ch| ch.to_ascii_lowercase())
        .collect()
}

pub fn base_price(make: &str) -> Cents {
    let key = catalog_key(make);
    BASE_PRICES
        .iter()
        .find(|(known, _)| *known == key)
        .map(|(_, dollars)| Cents::from_dollars(*dollars))
        .unwrap_or(DEFAULT_BASE_PRICE)
}

pub fn equipment_value(name: &str) -> Option<Cents> {
    let key = catalog_key(name);
    EQUIPMENT_VALUES
        .iter()
        .find(|(known, _)| *known == key)
        .map(|(_, dollars)| Cents::from_dollars(*dollars))
}
