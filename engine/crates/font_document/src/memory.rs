use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use crate::{
    FontDocument, FontDocumentError, GlyphSlot, LigatureTable, LookupKind, LookupSummary,
    NameField, Outline, write_atomically,
};

/// Font document held entirely in plain collections.
///
/// Used for planning runs without a binary font and by tests. Writing renders
/// a deterministic text dump of the document.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    glyph_order: Vec<String>,
    character_map: Option<BTreeMap<char, String>>,
    outlines: BTreeMap<String, Outline>,
    advances: BTreeMap<String, u16>,
    lookups: Vec<MemoryLookup>,
    names: BTreeMap<NameField, String>,
}

#[derive(Debug, Clone)]
struct MemoryLookup {
    kind: LookupKind,
    table: LigatureTable,
}

impl MemoryDocument {
    pub fn new<S: Into<String>>(glyph_order: impl IntoIterator<Item = S>) -> Self {
        Self {
            glyph_order: glyph_order.into_iter().map(Into::into).collect(),
            character_map: Some(BTreeMap::new()),
            outlines: BTreeMap::new(),
            advances: BTreeMap::new(),
            lookups: Vec::new(),
            names: BTreeMap::new(),
        }
    }

    pub fn map_character(&mut self, ch: char, glyph: impl Into<String>) -> &mut Self {
        self.character_map
            .get_or_insert_with(BTreeMap::new)
            .insert(ch, glyph.into());
        self
    }

    /// Drops the character map entirely, like a font without a `cmap` table.
    pub fn remove_character_map(&mut self) -> &mut Self {
        self.character_map = None;
        self
    }

    /// Sets outline and advance of an existing glyph.
    pub fn set_glyph(&mut self, name: &str, outline: Outline, advance: u16) -> &mut Self {
        self.outlines.insert(name.to_string(), outline);
        self.advances.insert(name.to_string(), advance);
        self
    }

    pub fn push_lookup(&mut self, kind: LookupKind, table: LigatureTable) -> &mut Self {
        self.lookups.push(MemoryLookup { kind, table });
        self
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.len()
    }

    pub fn lookup_table(&self, index: usize) -> Option<&LigatureTable> {
        self.lookups.get(index).map(|lookup| &lookup.table)
    }

    pub fn metadata(&self, field: NameField) -> Option<&str> {
        self.names.get(&field).map(String::as_str)
    }

    /// Deterministic text form of the whole document.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "glyphs {}", self.glyph_order.len());
        for name in &self.glyph_order {
            let advance = self.advances.get(name).copied().unwrap_or(0);
            let _ = write!(out, "glyph {name} advance={advance}");
            if let Some(outline) = self.outlines.get(name) {
                for contour in &outline.contours {
                    out.push_str(" |");
                    for point in &contour.points {
                        let marker = if point.on_curve { "" } else { "~" };
                        let _ = write!(out, " {marker}{},{}", point.x, point.y);
                    }
                }
            }
            out.push('\n');
        }
        if let Some(map) = &self.character_map {
            for (ch, glyph) in map {
                let _ = writeln!(out, "cmap U+{:04X} {glyph}", *ch as u32);
            }
        }
        for (index, lookup) in self.lookups.iter().enumerate() {
            let _ = writeln!(
                out,
                "lookup {index} {:?} extension={} subtables={}",
                lookup.kind,
                lookup.table.use_extension,
                lookup.table.subtables.len()
            );
            for subtable in &lookup.table.subtables {
                for set in &subtable.sets {
                    for rule in &set.ligatures {
                        let _ = writeln!(
                            out,
                            "  {} {} -> {}",
                            set.first_glyph,
                            rule.trailing.join(" "),
                            rule.target
                        );
                    }
                }
            }
        }
        for (field, value) in &self.names {
            let _ = writeln!(out, "name {} {value}", field.name_id());
        }
        out
    }
}

impl FontDocument for MemoryDocument {
    fn resolve_character(&self, ch: char) -> Result<Option<String>, FontDocumentError> {
        let map = self
            .character_map
            .as_ref()
            .ok_or(FontDocumentError::NoCharacterMap)?;
        Ok(map.get(&ch).cloned())
    }

    fn glyph_order(&self) -> &[String] {
        &self.glyph_order
    }

    fn glyph_outline(&self, name: &str) -> Result<Option<Outline>, FontDocumentError> {
        if !self.has_glyph(name) {
            return Err(FontDocumentError::UnknownGlyph(name.to_string()));
        }
        Ok(self.outlines.get(name).cloned())
    }

    fn advance_width(&self, name: &str) -> Option<u16> {
        self.advances.get(name).copied()
    }

    fn list_lookups_of_kind(
        &self,
        kind: LookupKind,
    ) -> Result<Vec<LookupSummary>, FontDocumentError> {
        Ok(self
            .lookups
            .iter()
            .enumerate()
            .filter(|(_, lookup)| lookup.kind == kind)
            .map(|(index, lookup)| LookupSummary {
                index,
                kind: lookup.kind,
                ligature_targets: lookup.table.targets().map(str::to_string).collect(),
            })
            .collect())
    }

    fn replace_lookup(
        &mut self,
        index: usize,
        table: LigatureTable,
    ) -> Result<(), FontDocumentError> {
        let count = self.lookups.len();
        let lookup = self
            .lookups
            .get_mut(index)
            .ok_or(FontDocumentError::LookupIndex { index, count })?;
        lookup.kind = LookupKind::Ligature;
        lookup.table = table;
        Ok(())
    }

    fn upsert_glyph(
        &mut self,
        name: &str,
        outline: Outline,
        advance: u16,
    ) -> Result<GlyphSlot, FontDocumentError> {
        let slot = if self.has_glyph(name) {
            GlyphSlot::Replaced
        } else {
            if self.glyph_order.len() >= u16::MAX as usize {
                return Err(FontDocumentError::TooManyGlyphs(self.glyph_order.len() + 1));
            }
            self.glyph_order.push(name.to_string());
            self.advances.insert(name.to_string(), advance);
            GlyphSlot::Appended
        };
        self.outlines.insert(name.to_string(), outline);
        Ok(slot)
    }

    fn set_metadata(&mut self, field: NameField, value: &str) {
        self.names.insert(field, value.to_string());
    }

    fn write_atomically(&self, path: &Path) -> Result<(), FontDocumentError> {
        write_atomically(path, self.render().as_bytes())
    }
}
