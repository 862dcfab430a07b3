//! Font capability layer for the needle font generator.
//!
//! The generator never touches binary table layouts itself. Everything it
//! needs from a font goes through [`FontDocument`]:
//!
//! - `opentype`: binding over `write-fonts`/`read-fonts`
//! - `memory`: plain in-memory document used for planning and tests
//! - `atomic`: temp-file-then-rename writer shared by both

mod atomic;
mod memory;
mod opentype;
mod outline;

pub use atomic::write_atomically;
pub use memory::MemoryDocument;
pub use opentype::OpenTypeDocument;
pub use outline::{BoundingBox, Contour, Outline, OutlinePoint};

use std::path::Path;

/// Bridge trait implemented by every font backend the generator can drive.
pub trait FontDocument {
    /// Glyph name mapped to `ch` by the best Unicode character map.
    ///
    /// Fails with [`FontDocumentError::NoCharacterMap`] when the font has no
    /// usable character map at all; returns `Ok(None)` when the map exists but
    /// has no entry for `ch`.
    fn resolve_character(&self, ch: char) -> Result<Option<String>, FontDocumentError>;

    /// Glyph names in glyph-id order.
    fn glyph_order(&self) -> &[String];

    fn has_glyph(&self, name: &str) -> bool {
        self.glyph_order().iter().any(|existing| existing == name)
    }

    /// Current outline of `name`, `None` for an empty glyph.
    fn glyph_outline(&self, name: &str) -> Result<Option<Outline>, FontDocumentError>;

    fn advance_width(&self, name: &str) -> Option<u16>;

    /// Substitution lookups of the given kind, in lookup-list order.
    fn list_lookups_of_kind(&self, kind: LookupKind)
    -> Result<Vec<LookupSummary>, FontDocumentError>;

    /// Replaces the content of the lookup at `index`, keeping its position.
    fn replace_lookup(&mut self, index: usize, table: LigatureTable)
    -> Result<(), FontDocumentError>;

    /// Writes `outline` under `name`. Unknown names are appended to the glyph
    /// order exactly once; `advance` is only applied to appended glyphs.
    fn upsert_glyph(
        &mut self,
        name: &str,
        outline: Outline,
        advance: u16,
    ) -> Result<GlyphSlot, FontDocumentError>;

    /// Replaces every Windows/English record of `field` with `value`.
    fn set_metadata(&mut self, field: NameField, value: &str);

    /// Compiles the document and writes it to `path` via a temporary file in
    /// the destination directory followed by a rename.
    fn write_atomically(&self, path: &Path) -> Result<(), FontDocumentError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LookupKind {
    Single,
    Multiple,
    Alternate,
    Ligature,
    Contextual,
    ChainContextual,
    Reverse,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupSummary {
    pub index: usize,
    pub kind: LookupKind,
    /// Output glyph names of every ligature in the lookup.
    pub ligature_targets: Vec<String>,
}

/// Whether [`FontDocument::upsert_glyph`] replaced or appended a glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphSlot {
    Replaced,
    Appended,
}

/// Naming table fields the generator rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NameField {
    Family,
    Style,
    UniqueId,
    FullName,
    Version,
    PostScriptName,
}

impl NameField {
    pub const ALL: [NameField; 6] = [
        NameField::Family,
        NameField::Style,
        NameField::UniqueId,
        NameField::FullName,
        NameField::Version,
        NameField::PostScriptName,
    ];

    pub fn name_id(self) -> u16 {
        match self {
            NameField::Family => 1,
            NameField::Style => 2,
            NameField::UniqueId => 3,
            NameField::FullName => 4,
            NameField::Version => 5,
            NameField::PostScriptName => 6,
        }
    }
}

/// One ligature: the glyphs after the first one, and the replacement glyph.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LigatureRule {
    pub trailing: Vec<String>,
    pub target: String,
}

/// All ligatures that start with `first_glyph`, in match-priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LigatureSet {
    pub first_glyph: String,
    pub ligatures: Vec<LigatureRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LigatureSubtable {
    pub sets: Vec<LigatureSet>,
}

impl LigatureSubtable {
    pub fn ligature_count(&self) -> usize {
        self.sets.iter().map(|set| set.ligatures.len()).sum()
    }
}

/// Replacement content for a ligature lookup.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LigatureTable {
    pub subtables: Vec<LigatureSubtable>,
    /// Subtables must be reached through 32-bit extension offsets.
    pub use_extension: bool,
}

impl LigatureTable {
    pub fn ligature_count(&self) -> usize {
        self.subtables.iter().map(LigatureSubtable::ligature_count).sum()
    }

    /// Applies the table at the start of `glyphs` the way a shaper would:
    /// subtables in order, the first matching rule of the first matching set
    /// wins. Returns the replacement glyph and the number of glyphs consumed.
    pub fn apply(&self, glyphs: &[&str]) -> Option<(&str, usize)> {
        let (first, rest) = glyphs.split_first()?;
        self.subtables
            .iter()
            .filter_map(|subtable| subtable.sets.iter().find(|set| set.first_glyph == *first))
            .flat_map(|set| set.ligatures.iter())
            .find(|rule| {
                rule.trailing.len() <= rest.len()
                    && rule.trailing.iter().zip(rest).all(|(want, have)| want == have)
            })
            .map(|rule| (rule.target.as_str(), rule.trailing.len() + 1))
    }

    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.subtables
            .iter()
            .flat_map(|subtable| subtable.sets.iter())
            .flat_map(|set| set.ligatures.iter())
            .map(|rule| rule.target.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FontDocumentError {
    #[error("failed to open '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read font data: {0}")]
    Read(String),
    #[error("failed to compile table '{table}': {message}")]
    Compile { table: &'static str, message: String },
    #[error("font has no usable character map")]
    NoCharacterMap,
    #[error("font has no glyph named '{0}'")]
    UnknownGlyph(String),
    #[error("glyph '{name}' cannot be edited: {reason}")]
    UnsupportedOutline { name: String, reason: String },
    #[error("lookup index {index} is out of range ({count} lookups)")]
    LookupIndex { index: usize, count: usize },
    #[error("glyph count {0} exceeds the 65535 glyph limit")]
    TooManyGlyphs(usize),
    #[error("failed to write '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<write_fonts::read::ReadError> for FontDocumentError {
    fn from(err: write_fonts::read::ReadError) -> Self {
        FontDocumentError::Read(err.to_string())
    }
}
