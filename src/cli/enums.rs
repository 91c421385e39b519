//! CLI enum types for the character set option.

use clap::ValueEnum;

use crate::render::Palette;

/// Glyph character set for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CharacterSet {
    #[default]
    Standard,
    Blocks,
    Minimal,
}

impl From<CharacterSet> for Palette {
    fn from(c: CharacterSet) -> Self {
        match c {
            CharacterSet::Standard => Palette::Standard,
            CharacterSet::Blocks => Palette::Blocks,
            CharacterSet::Minimal => Palette::Minimal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_charset_to_palette() {
        assert_eq!(Palette::from(CharacterSet::Standard), Palette::Standard);
        assert_eq!(Palette::from(CharacterSet::Blocks), Palette::Blocks);
        assert_eq!(Palette::from(CharacterSet::Minimal), Palette::Minimal);
    }

    #[test]
    fn test_charset_names_match_palette_names() {
        for value in CharacterSet::value_variants() {
            let name = value.to_possible_value().unwrap();
            assert_eq!(Palette::from_name(name.get_name()), Some(Palette::from(*value)));
        }
    }
}
