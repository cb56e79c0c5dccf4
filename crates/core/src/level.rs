//! CEFR proficiency levels

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// CEFR level as reported by the tutor ("A1", "A1+", "A2", ...)
///
/// Serialized in its display form so it round-trips with the frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum CefrLevel {
    #[default]
    A1,
    A1Plus,
    A2,
    A2Plus,
    B1,
    B1Plus,
    B2,
    C1,
    C2,
}

impl CefrLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CefrLevel::A1 => "A1",
            CefrLevel::A1Plus => "A1+",
            CefrLevel::A2 => "A2",
            CefrLevel::A2Plus => "A2+",
            CefrLevel::B1 => "B1",
            CefrLevel::B1Plus => "B1+",
            CefrLevel::B2 => "B2",
            CefrLevel::C1 => "C1",
            CefrLevel::C2 => "C2",
        }
    }

    /// Zero-based CEFR tier, ignoring "+" sub-steps (A1 = 0, A2 = 1, B1 = 2, ...)
    pub fn tier(&self) -> u8 {
        match self {
            CefrLevel::A1 | CefrLevel::A1Plus => 0,
            CefrLevel::A2 | CefrLevel::A2Plus => 1,
            CefrLevel::B1 | CefrLevel::B1Plus => 2,
            CefrLevel::B2 => 3,
            CefrLevel::C1 => 4,
            CefrLevel::C2 => 5,
        }
    }

    /// Parse leniently; anything unrecognised falls back to A1.
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl FromStr for CefrLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        match compact.to_ascii_uppercase().as_str() {
            "A1" => Ok(CefrLevel::A1),
            "A1+" => Ok(CefrLevel::A1Plus),
            "A2" => Ok(CefrLevel::A2),
            "A2+" => Ok(CefrLevel::A2Plus),
            "B1" => Ok(CefrLevel::B1),
            "B1+" => Ok(CefrLevel::B1Plus),
            "B2" => Ok(CefrLevel::B2),
            "C1" => Ok(CefrLevel::C1),
            "C2" => Ok(CefrLevel::C2),
            other => Err(format!("unknown CEFR level: {}", other)),
        }
    }
}

impl std::fmt::Display for CefrLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for CefrLevel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CefrLevel {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(CefrLevel::parse_lenient(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!("a1+".parse::<CefrLevel>().unwrap(), CefrLevel::A1Plus);
        assert_eq!(" B2 ".parse::<CefrLevel>().unwrap(), CefrLevel::B2);
        assert!("Z9".parse::<CefrLevel>().is_err());
        assert_eq!(CefrLevel::parse_lenient("unknown"), CefrLevel::A1);
    }

    #[test]
    fn test_tiers() {
        assert_eq!(CefrLevel::A1Plus.tier(), 0);
        assert_eq!(CefrLevel::A2.tier(), 1);
        assert!(CefrLevel::A2 > CefrLevel::A1Plus);
    }

    #[test]
    fn test_serde_display_form() {
        let json = serde_json::to_string(&CefrLevel::A1Plus).unwrap();
        assert_eq!(json, "\"A1+\"");
        let back: CefrLevel = serde_json::from_str("\"A2\"").unwrap();
        assert_eq!(back, CefrLevel::A2);
    }
}
