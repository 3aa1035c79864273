//! Record identity used to match venues across sources.
//!
//! The `OriginalOrder` column is the stable identity. Rows without a usable
//! order number fall back to their lower-cased name, which collapses distinct
//! venues that share a name; counts keyed that way can under-report.

use std::fmt;

use crate::model::VenueRecord;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordKey {
    Order(i64),
    Name(String),
}

impl RecordKey {
    pub fn is_order(&self) -> bool {
        matches!(self, Self::Order(_))
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Order(n) => write!(f, "#{n}"),
            Self::Name(name) => write!(f, "name:{name}"),
        }
    }
}

pub fn key_of(record: &VenueRecord) -> RecordKey {
    match record.order.trim().parse::<i64>() {
        Ok(n) => RecordKey::Order(n),
        Err(_) => RecordKey::Name(record.name.trim().to_lowercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn venue(order: &str, name: &str) -> VenueRecord {
        VenueRecord {
            order: order.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    #[test]
    fn order_wins_over_name() {
        assert_eq!(key_of(&venue("42", "The Crown")), RecordKey::Order(42));
        assert_eq!(key_of(&venue(" 7 ", "")), RecordKey::Order(7));
    }

    #[test]
    fn falls_back_to_normalized_name() {
        assert_eq!(
            key_of(&venue("", "  The Crown ")),
            RecordKey::Name("the crown".into())
        );
        assert_eq!(
            key_of(&venue("n/a", "THE CROWN")),
            RecordKey::Name("the crown".into())
        );
    }

    #[test]
    fn same_name_different_case_collides() {
        assert_eq!(key_of(&venue("", "Red Lion")), key_of(&venue("", "red lion")));
        assert_ne!(key_of(&venue("1", "Red Lion")), key_of(&venue("2", "Red Lion")));
    }

    #[test]
    fn display() {
        assert_eq!(RecordKey::Order(3).to_string(), "#3");
        assert_eq!(RecordKey::Name("bar".into()).to_string(), "name:bar");
    }
}
