// Card reference records
// One CardRecord per row of a reference file, built once and never mutated

use serde::{Deserialize, Serialize};

// ============================================================================
// CARD KIND
// ============================================================================

/// CardKind - closed classification of a card's attribute column
///
/// Monsters carry one of the seven elemental attributes. Spells and traps
/// are the two non-combat kinds. Anything else lands in `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardKind {
    Earth,
    Water,
    Fire,
    Wind,
    Dark,
    Light,
    Divine,
    Spell,
    Trap,
    Unknown,
}

impl CardKind {
    /// Classify a category string (any casing)
    pub fn from_category(category: &str) -> Self {
        match category.to_lowercase().as_str() {
            "earth" => CardKind::Earth,
            "water" => CardKind::Water,
            "fire" => CardKind::Fire,
            "wind" => CardKind::Wind,
            "dark" => CardKind::Dark,
            "light" => CardKind::Light,
            "divine" => CardKind::Divine,
            "spell" => CardKind::Spell,
            "trap" => CardKind::Trap,
            _ => CardKind::Unknown,
        }
    }

    /// Spells and traps have no attack or defense
    pub fn is_non_combat(&self) -> bool {
        matches!(self, CardKind::Spell | CardKind::Trap)
    }
}

/// Canonical capitalization: first char upper, the rest lower.
/// "SPELL" -> "Spell", "dark" -> "Dark", "" -> ""
pub fn normalize_category(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}

// ============================================================================
// CARD RECORD
// ============================================================================

/// CardRecord - one known card from the reference data
///
/// Serialized field names are UPPERCASE, which is the convention of the
/// compiled artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct CardRecord {
    /// Lookup key (the card's passcode)
    pub passcode: String,
    pub name: String,
    pub status: String,
    /// Normalized category / attribute
    pub attribute: String,
    pub attack: String,
    pub defense: String,
    /// Stem of the reference file the record came from
    pub source_file: String,
}

impl CardRecord {
    /// Derive a record from raw field values.
    ///
    /// The attribute is normalized and attack/defense are dropped for
    /// spells and traps, whatever the source row says.
    pub fn derive(
        passcode: &str,
        name: &str,
        status: &str,
        attribute: &str,
        attack: &str,
        defense: &str,
        source_file: &str,
    ) -> Self {
        let attribute = normalize_category(attribute);
        let non_combat = CardKind::from_category(&attribute).is_non_combat();

        CardRecord {
            passcode: passcode.to_string(),
            name: name.to_string(),
            status: status.to_string(),
            attack: if non_combat { String::new() } else { attack.to_string() },
            defense: if non_combat { String::new() } else { defense.to_string() },
            attribute,
            source_file: source_file.to_string(),
        }
    }

    pub fn kind(&self) -> CardKind {
        CardKind::from_category(&self.attribute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_category() {
        assert_eq!(normalize_category("SPELL"), "Spell");
        assert_eq!(normalize_category("dark"), "Dark");
        assert_eq!(normalize_category("mOnStEr"), "Monster");
        assert_eq!(normalize_category(""), "");
    }

    #[test]
    fn test_kind_classification() {
        assert_eq!(CardKind::from_category("LIGHT"), CardKind::Light);
        assert_eq!(CardKind::from_category("Trap"), CardKind::Trap);
        assert_eq!(CardKind::from_category("Monster"), CardKind::Unknown);
        assert!(CardKind::Spell.is_non_combat());
        assert!(CardKind::Trap.is_non_combat());
        assert!(!CardKind::Divine.is_non_combat());
    }

    #[test]
    fn test_derive_blanks_non_combat_stats() {
        let spell = CardRecord::derive("1", "Pot", "", "SPELL", "9999", "9999", "set");
        assert_eq!(spell.attribute, "Spell");
        assert_eq!(spell.attack, "");
        assert_eq!(spell.defense, "");

        let trap = CardRecord::derive("2", "Hole", "", "trap", "1", "2", "set");
        assert_eq!(trap.attack, "");
        assert_eq!(trap.defense, "");
    }

    #[test]
    fn test_derive_keeps_monster_stats() {
        let card = CardRecord::derive("3", "Dragon", "Limited", "light", "3000", "2500", "set");
        assert_eq!(card.attribute, "Light");
        assert_eq!(card.attack, "3000");
        assert_eq!(card.defense, "2500");
        assert_eq!(card.kind(), CardKind::Light);
    }

    #[test]
    fn test_serialized_keys_are_uppercase() {
        let card = CardRecord::derive("3", "Dragon", "", "Dark", "1", "2", "set");
        let json = serde_json::to_value(&card).unwrap();
        for key in ["PASSCODE", "NAME", "STATUS", "ATTRIBUTE", "ATTACK", "DEFENSE", "SOURCE_FILE"] {
            assert!(json.get(key).is_some(), "missing key {}", key);
        }
    }
}
