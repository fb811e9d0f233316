use std::fmt;
use std::str::FromStr;

use crate::error::KanbanError;

/// Closed post-it color palette, mapped one-to-one to fixed hex values.
///
/// Tasks store the hex string (that is what the schema and the snapshot
/// format carry); this enum is the authoritative mapping in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteColor {
    Yellow,
    Pink,
    Green,
    Blue,
    Orange,
}

impl NoteColor {
    pub const ALL: [NoteColor; 5] = [
        NoteColor::Yellow,
        NoteColor::Pink,
        NoteColor::Green,
        NoteColor::Blue,
        NoteColor::Orange,
    ];

    /// The `#RRGGBB` value persisted for this palette entry.
    pub fn hex(&self) -> &'static str {
        match self {
            NoteColor::Yellow => "#FFF59D",
            NoteColor::Pink => "#F8BBD0",
            NoteColor::Green => "#C5E1A5",
            NoteColor::Blue => "#BBDEFB",
            NoteColor::Orange => "#FFCC80",
        }
    }

    pub fn from_hex(hex: &str) -> Option<NoteColor> {
        NoteColor::ALL
            .into_iter()
            .find(|c| c.hex().eq_ignore_ascii_case(hex))
    }

    pub fn name(&self) -> &'static str {
        match self {
            NoteColor::Yellow => "Yellow",
            NoteColor::Pink => "Pink",
            NoteColor::Green => "Green",
            NoteColor::Blue => "Blue",
            NoteColor::Orange => "Orange",
        }
    }
}

impl fmt::Display for NoteColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NoteColor {
    type Err = KanbanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NoteColor::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| KanbanError::UnknownColor(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_mapping_round_trips() {
        for color in NoteColor::ALL {
            assert_eq!(NoteColor::from_hex(color.hex()), Some(color));
        }
    }

    #[test]
    fn from_hex_is_case_insensitive() {
        assert_eq!(NoteColor::from_hex("#fff59d"), Some(NoteColor::Yellow));
    }

    #[test]
    fn unknown_hex_is_none() {
        assert_eq!(NoteColor::from_hex("#123456"), None);
        assert_eq!(NoteColor::from_hex("not-a-color"), None);
    }

    #[test]
    fn parses_palette_names() {
        assert_eq!("yellow".parse::<NoteColor>().unwrap(), NoteColor::Yellow);
        assert!("Mauve".parse::<NoteColor>().is_err());
    }
}
