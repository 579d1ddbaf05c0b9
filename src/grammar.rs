//! Filename grammar shared by every chain scraper and parser.
//!
//! Supplier file names encode type, full-snapshot flag, chain id, store id
//! and timestamp in one (admittedly baroque) convention. A single regex
//! with named groups is authoritative; everything else dispatches on it
//! rather than on file extensions.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// The kind of file encoded in a supplier file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Stores,
    Prices,
    Promo,
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FileKind::Stores => "Stores",
            FileKind::Prices => "Prices",
            FileKind::Promo => "Promo",
        };
        f.write_str(s)
    }
}

/// The base filename pattern. Type, full-snapshot flag, a 13-digit chain
/// id, an optional 2-4 digit store id (the last digit may be a check
/// digit appended by some chains), and a `YYYYMMDDHHMM` timestamp.
const BASE_PATTERN: &str = concat!(
    r".*(?P<type>Stores|Promo|Price(?:s)?)",
    r"(?P<full>Full)?",
    r"(?:-|_)?",
    r"(?P<id>\d{13})",
    r"(?:(?:-|_)(?P<store>\d{2,4}))?",
    r"(?:-|_)",
    r"(?P<year>\d{4})(?P<month>\d{2})(?P<day>\d{2})",
    r"(?P<hour>\d{2})(?P<min>\d{2})",
    r".*",
);

pub static FILE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(BASE_PATTERN).expect("filename grammar is valid regex"));

pub static STORES_FILE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&BASE_PATTERN.replace(
        r"(?P<type>Stores|Promo|Price(?:s)?)",
        r"(?P<type>Stores)",
    ))
    .expect("derived stores pattern is valid regex")
});

pub static FULL_FILE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&BASE_PATTERN.replace("(?P<full>Full)?", "(?P<full>Full)"))
        .expect("derived full pattern is valid regex")
});

pub static FULL_PRICES_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        &FULL_FILE_PATTERN
            .as_str()
            .replace(
                r"(?P<type>Stores|Promo|Price(?:s)?)",
                r"(?P<type>Price(?:s)?)",
            ),
    )
    .expect("derived full-prices pattern is valid regex")
});

pub static FULL_PROMOS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        &FULL_FILE_PATTERN
            .as_str()
            .replace(r"(?P<type>Stores|Promo|Price(?:s)?)", r"(?P<type>Promo)"),
    )
    .expect("derived full-promos pattern is valid regex")
});

/// All named groups extracted from a matching file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNameInfo {
    pub kind: FileKind,
    pub full: bool,
    pub chain_full_id: u64,
    pub store_id: Option<u32>,
    pub date: NaiveDate,
    pub hour: u32,
    pub minute: u32,
}

/// Parses a file name against [FILE_PATTERN], returning `None` if it does
/// not match at all. A filename either matches with every expected group
/// present, or it does not match (spec: "filename grammar totality").
pub fn parse(file_name: &str) -> Option<FileNameInfo> {
    let caps = FILE_PATTERN.captures(file_name)?;

    let kind = match &caps["type"] {
        "Stores" => FileKind::Stores,
        "Promo" => FileKind::Promo,
        t if t.starts_with("Price") => FileKind::Prices,
        _ => return None,
    };

    let full = caps.name("full").is_some();
    let chain_full_id: u64 = caps["id"].parse().ok()?;
    let store_id = caps.name("store").and_then(|m| m.as_str().parse().ok());

    let year: i32 = caps["year"].parse().ok()?;
    let month: u32 = caps["month"].parse().ok()?;
    let day: u32 = caps["day"].parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;

    let hour: u32 = caps["hour"].parse().ok()?;
    let minute: u32 = caps["min"].parse().ok()?;

    Some(FileNameInfo {
        kind,
        full,
        chain_full_id,
        store_id,
        date,
        hour,
        minute,
    })
}

/// Which derived pattern a caller wants dated/store-scoped.
#[derive(Debug, Clone, Copy)]
pub enum PatternKind {
    Stores,
    Prices,
    Promos,
    AnyFull,
}

/// Specializes a pattern to match only a concrete date.
pub fn with_date(kind: PatternKind, date: NaiveDate) -> Regex {
    let base = base_source(kind);
    let dated = base.replace(
        r"(?P<year>\d{4})(?P<month>\d{2})(?P<day>\d{2})",
        &format!(
            "(?P<year>{:04})(?P<month>{:02})(?P<day>{:02})",
            date.year(),
            date.month(),
            date.day(),
        ),
    );
    Regex::new(&dated).expect("date-specialized pattern is valid regex")
}

/// Specializes a pattern to match only a concrete store id, zero-padded
/// to three digits (matching the government portal's own convention).
pub fn with_store(pattern: &Regex, store_id: u32) -> Regex {
    let specialized = pattern
        .as_str()
        .replace(r"(?:(?:-|_)(?P<store>\d{2,4}))?", &format!("(?:-|_)(?P<store>{store_id:03})"));
    Regex::new(&specialized).expect("store-specialized pattern is valid regex")
}

/// Returns the prices pattern scoped to one store and (optionally) one date.
pub fn prices_pattern(store_id: u32, date: Option<NaiveDate>) -> Regex {
    let pattern = match date {
        Some(d) => with_date(PatternKind::Prices, d),
        None => FULL_PRICES_PATTERN.clone(),
    };
    with_store(&pattern, store_id)
}

/// Returns the promos pattern scoped to one store and (optionally) one date.
pub fn promos_pattern(store_id: u32, date: Option<NaiveDate>) -> Regex {
    let pattern = match date {
        Some(d) => with_date(PatternKind::Promos, d),
        None => FULL_PROMOS_PATTERN.clone(),
    };
    with_store(&pattern, store_id)
}

/// Returns the stores pattern, optionally scoped to one date.
pub fn stores_pattern(date: Option<NaiveDate>) -> Regex {
    match date {
        Some(d) => with_date(PatternKind::Stores, d),
        None => STORES_FILE_PATTERN.clone(),
    }
}

fn base_source(kind: PatternKind) -> &'static str {
    match kind {
        PatternKind::Stores => STORES_FILE_PATTERN.as_str(),
        PatternKind::Prices => FULL_PRICES_PATTERN.as_str(),
        PatternKind::Promos => FULL_PROMOS_PATTERN.as_str(),
        PatternKind::AnyFull => FULL_FILE_PATTERN.as_str(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_full_prices_file_with_store() {
        let info = parse("PriceFull7290027600007-001-202001101200.gz").expect("should match");
        assert_eq!(info.kind, FileKind::Prices);
        assert!(info.full);
        assert_eq!(info.chain_full_id, 7290027600007);
        assert_eq!(info.store_id, Some(1));
        assert_eq!(info.date, NaiveDate::from_ymd_opt(2020, 1, 10).unwrap());
        assert_eq!(info.hour, 12);
        assert_eq!(info.minute, 0);
    }

    #[test]
    fn matches_stores_file_without_store_group() {
        let info = parse("Stores7290027600007-202001100600.xml").expect("should match");
        assert_eq!(info.kind, FileKind::Stores);
        assert!(!info.full);
        assert_eq!(info.store_id, None);
    }

    #[test]
    fn matches_promo_file() {
        let info = parse("PromoFull7290058140886-050-202001100100.xml").expect("should match");
        assert_eq!(info.kind, FileKind::Promo);
        assert_eq!(info.store_id, Some(50));
    }

    #[test]
    fn rejects_garbage_file_name_entirely() {
        assert!(parse("readme.txt").is_none());
        assert!(parse("PriceNotARealFile.gz").is_none());
    }

    #[test]
    fn store_pattern_specializes_to_zero_padded_id() {
        let pattern = prices_pattern(7, Some(NaiveDate::from_ymd_opt(2020, 1, 10).unwrap()));
        assert!(pattern.is_match("Price7290027600007-007-202001101200.gz"));
        assert!(!pattern.is_match("Price7290027600007-008-202001101200.gz"));
    }
}
