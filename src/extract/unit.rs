//! Unit-string-to-unit-enum normalization. The mapping table is fixed and
//! ported directly from the original Hebrew string table: chains are free
//! to spell the same unit with or without punctuation, so every spelling
//! observed in the wild gets its own entry rather than a parser.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, Default,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
pub enum Unit {
    #[default]
    #[sea_orm(num_value = 0)]
    Unknown = 0,
    #[sea_orm(num_value = 1)]
    Kg = 1,
    #[sea_orm(num_value = 2)]
    Gr = 2,
    #[sea_orm(num_value = 3)]
    Liter = 3,
    #[sea_orm(num_value = 4)]
    Ml = 4,
    #[sea_orm(num_value = 5)]
    Unit = 5,
    #[sea_orm(num_value = 6)]
    M = 6,
}

impl Unit {
    /// Normalizes a raw unit string as it appears in a prices file into a
    /// [Unit] value. Unknown or empty strings normalize to [Unit::Unknown].
    pub fn from_raw(raw: &str) -> Unit {
        let trimmed = raw.trim();
        for (unit, spellings) in TABLE {
            if spellings.iter().any(|s| *s == trimmed) {
                return *unit;
            }
        }
        Unit::Unknown
    }
}

const TABLE: &[(Unit, &[&str])] = &[
    (Unit::Kg, &["קג", "קילוגרם", "קילוגרמים", "ק\"ג"]),
    (Unit::Gr, &["גר", "גרמים", "גר'"]),
    (Unit::Liter, &["ליטר", "ליטרים", "ל'"]),
    (Unit::Ml, &["מ\"ל", "מיליליטרים", "מיליליטר", "מל"]),
    (Unit::Unit, &["יחידה"]),
    (Unit::M, &["מטר", "מטרים", "מ", "מ'"]),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_known_spellings() {
        assert_eq!(Unit::from_raw("קג"), Unit::Kg);
        assert_eq!(Unit::from_raw(" ליטר "), Unit::Liter);
        assert_eq!(Unit::from_raw("יחידה"), Unit::Unit);
    }

    #[test]
    fn falls_back_to_unknown() {
        assert_eq!(Unit::from_raw("banana"), Unit::Unknown);
        assert_eq!(Unit::from_raw(""), Unit::Unknown);
    }
}
