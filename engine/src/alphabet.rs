use std::collections::BTreeMap;
use std::fmt;

use font_document::{FontDocument, FontDocumentError};

use crate::NeedleFontError;

/// Every character a timer string can contain.
pub const TIMER_SYMBOLS: &str = "0123456789:";

/// A glyph reference as the shaper sees it: id first, so ordering follows
/// the font's glyph order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GlyphRef {
    pub id: usize,
    pub name: String,
}

/// Glyphs of one rendered timer string, in reading order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GlyphSequence(pub Vec<GlyphRef>);

impl GlyphSequence {
    pub fn first(&self) -> Option<&GlyphRef> {
        self.0.first()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|glyph| glyph.name.as_str()).collect()
    }
}

impl fmt::Display for GlyphSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.names().join(" "))
    }
}

/// Symbol to glyph mapping for [`TIMER_SYMBOLS`], resolved once per font.
#[derive(Debug, Clone)]
pub struct Alphabet {
    glyphs: BTreeMap<char, GlyphRef>,
}

impl Alphabet {
    /// Resolves every timer symbol through the document's character map.
    /// The first unmapped symbol aborts with [`NeedleFontError::MissingSymbol`].
    pub fn resolve<D: FontDocument + ?Sized>(document: &D) -> Result<Self, NeedleFontError> {
        let mut glyphs = BTreeMap::new();
        for ch in TIMER_SYMBOLS.chars() {
            let name = match document.resolve_character(ch) {
                Ok(Some(name)) => name,
                Ok(None) => return Err(NeedleFontError::MissingSymbol { ch }),
                Err(FontDocumentError::NoCharacterMap) => {
                    return Err(NeedleFontError::NoCharacterMap);
                }
                Err(err) => return Err(err.into()),
            };
            let id = document
                .glyph_order()
                .iter()
                .position(|existing| *existing == name)
                .ok_or_else(|| FontDocumentError::UnknownGlyph(name.clone()))?;
            glyphs.insert(ch, GlyphRef { id, name });
        }

        log::debug!(
            "Resolved alphabet: {}",
            glyphs
                .iter()
                .map(|(ch, glyph)| format!("{ch}={}", glyph.name))
                .collect::<Vec<_>>()
                .join(" ")
        );
        Ok(Self { glyphs })
    }

    pub fn glyph(&self, ch: char) -> Option<&GlyphRef> {
        self.glyphs.get(&ch)
    }

    /// Translates `text` character by character.
    pub fn translate(&self, text: &str) -> Result<GlyphSequence, NeedleFontError> {
        text.chars()
            .map(|ch| {
                self.glyph(ch)
                    .cloned()
                    .ok_or_else(|| NeedleFontError::UnsupportedCharacter {
                        ch,
                        text: text.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(GlyphSequence)
    }
}
