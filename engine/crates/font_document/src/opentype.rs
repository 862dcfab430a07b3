use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::path::Path;

use write_fonts::FontBuilder;
use write_fonts::from_obj::ToOwnedTable;
use write_fonts::read::tables::glyf::{CurvePoint, Glyph as ReadGlyph};
use write_fonts::read::{FontRef, ReadError, TableProvider};
use write_fonts::tables::glyf::{
    Bbox, Contour as GlyfContour, GlyfLocaBuilder, Glyph, SimpleGlyph,
};
use write_fonts::tables::gsub::{
    ExtensionSubstFormat1, ExtensionSubtable, Gsub, Ligature, LigatureSet as GsubLigatureSet,
    LigatureSubstFormat1, SubstitutionLookup,
};
use write_fonts::tables::head::Head;
use write_fonts::tables::hhea::Hhea;
use write_fonts::tables::hmtx::{Hmtx, LongMetric};
use write_fonts::tables::layout::{Lookup, builders::CoverageTableBuilder};
use write_fonts::tables::loca::LocaFormat;
use write_fonts::tables::maxp::Maxp;
use write_fonts::tables::name::{Name, NameRecord};
use write_fonts::tables::post::Post;
use write_fonts::types::{FWord, GlyphId, GlyphId16, NameId, Tag, UfWord};

use crate::{
    FontDocument, FontDocumentError, GlyphSlot, LigatureSubtable, LigatureTable, LookupKind,
    LookupSummary, NameField, Outline, OutlinePoint, Contour, write_atomically,
};

const WINDOWS_PLATFORM: u16 = 3;
const WINDOWS_UNICODE_BMP: u16 = 1;
const ENGLISH_US: u16 = 0x409;
const LIGATURE_LOOKUP_TYPE: u16 = 4;

/// Tables sized by the glyph count that are not rebuilt here.
const GLYPH_COUNT_TABLES: [Tag; 4] = [
    Tag::new(b"hdmx"),
    Tag::new(b"LTSH"),
    Tag::new(b"vhea"),
    Tag::new(b"vmtx"),
];

/// TrueType-outline font loaded from disk, edited in memory, recompiled on
/// write. Untouched tables are copied through byte for byte.
#[derive(Debug)]
pub struct OpenTypeDocument {
    data: Vec<u8>,
    glyph_order: Vec<String>,
    glyph_index: HashMap<String, usize>,
    original_glyph_count: usize,
    edited_outlines: BTreeMap<usize, Outline>,
    appended_advances: BTreeMap<usize, u16>,
    replaced_lookups: BTreeMap<usize, LigatureTable>,
    names: BTreeMap<NameField, String>,
}

impl OpenTypeDocument {
    pub fn open(path: &Path) -> Result<Self, FontDocumentError> {
        let data = std::fs::read(path).map_err(|source| FontDocumentError::Open {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_bytes(data)
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self, FontDocumentError> {
        let glyph_order = read_glyph_order(&FontRef::new(&data)?)?;
        let glyph_index = glyph_order
            .iter()
            .enumerate()
            .map(|(index, name)| (name.clone(), index))
            .collect();
        let original_glyph_count = glyph_order.len();

        Ok(Self {
            data,
            glyph_order,
            glyph_index,
            original_glyph_count,
            edited_outlines: BTreeMap::new(),
            appended_advances: BTreeMap::new(),
            replaced_lookups: BTreeMap::new(),
            names: BTreeMap::new(),
        })
    }

    fn font(&self) -> Result<FontRef<'_>, FontDocumentError> {
        Ok(FontRef::new(&self.data)?)
    }

    fn glyph_id16(&self, name: &str) -> Result<GlyphId16, FontDocumentError> {
        self.glyph_index
            .get(name)
            .map(|&index| GlyphId16::new(index as u16))
            .ok_or_else(|| FontDocumentError::UnknownGlyph(name.to_string()))
    }

    fn glyph_name(&self, gid: GlyphId16) -> Option<&String> {
        self.glyph_order.get(gid.to_u16() as usize)
    }

    fn has_glyph_edits(&self) -> bool {
        !self.edited_outlines.is_empty() || self.glyph_order.len() != self.original_glyph_count
    }

    /// Recompiles every edited table and copies the rest from the source.
    pub fn compile(&self) -> Result<Vec<u8>, FontDocumentError> {
        let font = self.font()?;
        let mut builder = FontBuilder::new();

        if self.has_glyph_edits() {
            self.compile_glyph_tables(&font, &mut builder)?;
        }
        if !self.replaced_lookups.is_empty() {
            let gsub = self.compile_gsub(&font)?;
            builder.add_table(&gsub).map_err(compile_error("GSUB"))?;
        }
        if !self.names.is_empty() {
            match font.name() {
                Ok(name) => {
                    let name = self.compile_name(name.to_owned_table());
                    builder.add_table(&name).map_err(compile_error("name"))?;
                }
                Err(ReadError::TableIsMissing(_)) => {
                    log::warn!("Font has no name table; metadata left unchanged");
                }
                Err(err) => return Err(err.into()),
            }
        }

        self.copy_untouched_tables(&font, &mut builder);
        Ok(builder.build())
    }

    fn copy_untouched_tables<'a>(&self, font: &FontRef<'a>, builder: &mut FontBuilder<'a>) {
        let glyphs_appended = self.glyph_order.len() != self.original_glyph_count;
        for record in font.table_directory().table_records() {
            let tag = record.tag();
            if builder.contains(tag) {
                continue;
            }
            if glyphs_appended && GLYPH_COUNT_TABLES.contains(&tag) {
                log::debug!("Dropping '{tag}', it no longer matches the glyph count");
                continue;
            }
            match font.data_for_tag(tag) {
                Some(data) => {
                    builder.add_raw(tag, data.as_bytes());
                }
                None => log::warn!("Skipping malformed table '{tag}'"),
            }
        }
    }

    fn compile_glyph_tables(
        &self,
        font: &FontRef<'_>,
        builder: &mut FontBuilder<'_>,
    ) -> Result<(), FontDocumentError> {
        let glyph_count = self.glyph_order.len();
        let glyf = font.glyf()?;
        let loca = font.loca(None)?;
        let hmtx = font.hmtx()?;

        let mut glyf_builder = GlyfLocaBuilder::new();
        let mut metrics = Vec::with_capacity(glyph_count);
        let mut max_points = 0u16;
        let mut max_contours = 0u16;
        let mut edited_bounds: Option<Bbox> = None;
        let mut extremes = HorizontalExtremes::default();

        for index in 0..glyph_count {
            let gid = GlyphId::new(index as u32);
            let original = index < self.original_glyph_count;

            let (glyph, side_bearing) = match self.edited_outlines.get(&index) {
                Some(outline) => {
                    max_points = max_points.max(outline.point_count() as u16);
                    max_contours = max_contours.max(outline.contours.len() as u16);
                    match simple_glyph(&self.glyph_order[index], outline)? {
                        Some(simple) => {
                            edited_bounds = Some(union_bbox(edited_bounds, simple.bbox));
                            let side_bearing = simple.bbox.x_min;
                            (Glyph::Simple(simple), side_bearing)
                        }
                        None => (Glyph::Empty, 0),
                    }
                }
                None if original => {
                    let glyph = match loca.get_glyf(gid, &glyf)? {
                        Some(glyph) => glyph.to_owned_table(),
                        None => Glyph::Empty,
                    };
                    (glyph, hmtx.side_bearing(gid).unwrap_or(0))
                }
                None => (Glyph::Empty, 0),
            };

            let advance = if original {
                hmtx.advance(gid).unwrap_or(0)
            } else {
                self.appended_advances.get(&index).copied().unwrap_or(0)
            };

            extremes.add(advance, side_bearing, glyph.bbox());
            glyf_builder.add_glyph(&glyph).map_err(compile_error("glyf"))?;
            metrics.push(LongMetric::new(advance, side_bearing));
        }

        let (glyf_table, loca_table, loca_format) = glyf_builder.build();

        let mut head: Head = font.head()?.to_owned_table();
        head.index_to_loc_format = match loca_format {
            LocaFormat::Short => 0,
            LocaFormat::Long => 1,
        };
        if let Some(bounds) = edited_bounds {
            head.x_min = head.x_min.min(bounds.x_min);
            head.y_min = head.y_min.min(bounds.y_min);
            head.x_max = head.x_max.max(bounds.x_max);
            head.y_max = head.y_max.max(bounds.y_max);
        }

        let mut hhea: Hhea = font.hhea()?.to_owned_table();
        hhea.number_of_h_metrics = glyph_count as u16;
        extremes.apply(&mut hhea);

        let mut maxp: Maxp = font.maxp()?.to_owned_table();
        maxp.num_glyphs = glyph_count as u16;
        if let Some(points) = maxp.max_points.as_mut() {
            *points = (*points).max(max_points);
        }
        if let Some(contours) = maxp.max_contours.as_mut() {
            *contours = (*contours).max(max_contours);
        }

        let old_post: Post = font.post()?.to_owned_table();
        let mut post = Post::new_v2(self.glyph_order.iter().map(String::as_str));
        post.italic_angle = old_post.italic_angle;
        post.underline_position = old_post.underline_position;
        post.underline_thickness = old_post.underline_thickness;
        post.is_fixed_pitch = old_post.is_fixed_pitch;

        let hmtx_table = Hmtx::new(metrics, Vec::new());

        builder.add_table(&glyf_table).map_err(compile_error("glyf"))?;
        builder.add_table(&loca_table).map_err(compile_error("loca"))?;
        builder.add_table(&head).map_err(compile_error("head"))?;
        builder.add_table(&hhea).map_err(compile_error("hhea"))?;
        builder.add_table(&hmtx_table).map_err(compile_error("hmtx"))?;
        builder.add_table(&maxp).map_err(compile_error("maxp"))?;
        builder.add_table(&post).map_err(compile_error("post"))?;
        Ok(())
    }

    fn compile_gsub(&self, font: &FontRef<'_>) -> Result<Gsub, FontDocumentError> {
        let mut gsub: Gsub = font.gsub()?.to_owned_table();

        for (&index, table) in &self.replaced_lookups {
            let lookup_flag = match gsub.lookup_list.lookups.get(index).map(|lookup| &**lookup) {
                Some(SubstitutionLookup::Ligature(lookup)) => lookup.lookup_flag,
                Some(SubstitutionLookup::Extension(lookup)) => lookup.lookup_flag,
                _ => Default::default(),
            };

            let subtables = table
                .subtables
                .iter()
                .map(|subtable| self.compile_ligature_subtable(subtable))
                .collect::<Result<Vec<_>, _>>()?;

            let lookup = if table.use_extension {
                let wrapped = subtables
                    .into_iter()
                    .map(|subtable| ExtensionSubtable::Ligature(ExtensionSubstFormat1::new(
                            LIGATURE_LOOKUP_TYPE,
                            subtable,
                        )))
                    .collect();
                SubstitutionLookup::Extension(Lookup::new(lookup_flag, wrapped))
            } else {
                SubstitutionLookup::Ligature(Lookup::new(lookup_flag, subtables))
            };

            let count = gsub.lookup_list.lookups.len();
            let slot = gsub
                .lookup_list
                .lookups
                .get_mut(index)
                .ok_or(FontDocumentError::LookupIndex { index, count })?;
            *slot = lookup.into();
        }

        Ok(gsub)
    }

    fn compile_ligature_subtable(
        &self,
        subtable: &LigatureSubtable,
    ) -> Result<LigatureSubstFormat1, FontDocumentError> {
        let mut sets = Vec::with_capacity(subtable.sets.len());
        for set in &subtable.sets {
            let first = self.glyph_id16(&set.first_glyph)?;
            let mut ligatures = Vec::with_capacity(set.ligatures.len());
            for rule in &set.ligatures {
                let components = rule
                    .trailing
                    .iter()
                    .map(|name| self.glyph_id16(name))
                    .collect::<Result<Vec<_>, _>>()?;
                ligatures.push(Ligature::new(self.glyph_id16(&rule.target)?, components));
            }
            sets.push((first, GsubLigatureSet::new(ligatures)));
        }

        // Coverage is sorted by glyph id; ligature sets must follow it.
        sets.sort_by_key(|(first, _)| *first);
        let coverage =
            CoverageTableBuilder::from_glyphs(sets.iter().map(|(first, _)| *first).collect())
                .build();
        Ok(LigatureSubstFormat1::new(
            coverage,
            sets.into_iter().map(|(_, set)| set).collect(),
        ))
    }

    fn compile_name(&self, mut name: Name) -> Name {
        for (field, value) in &self.names {
            let name_id = NameId::new(field.name_id());
            name.name_record.retain(|record| {
                !(record.name_id == name_id
                    && record.platform_id == WINDOWS_PLATFORM
                    && record.language_id == ENGLISH_US)
            });
            name.name_record.extend([NameRecord::new(
                WINDOWS_PLATFORM,
                WINDOWS_UNICODE_BMP,
                ENGLISH_US,
                name_id,
                value.clone().into(),
            )]);
        }
        name.name_record.sort();
        name
    }
}

impl FontDocument for OpenTypeDocument {
    fn resolve_character(&self, ch: char) -> Result<Option<String>, FontDocumentError> {
        let font = self.font()?;
        let cmap = match font.cmap() {
            Ok(cmap) => cmap,
            Err(ReadError::TableIsMissing(_)) => return Err(FontDocumentError::NoCharacterMap),
            Err(err) => return Err(err.into()),
        };
        if cmap.encoding_records().is_empty() {
            return Err(FontDocumentError::NoCharacterMap);
        }

        Ok(cmap
            .map_codepoint(ch)
            .filter(|gid| gid.to_u32() != 0)
            .and_then(|gid| self.glyph_order.get(gid.to_u32() as usize))
            .cloned())
    }

    fn glyph_order(&self) -> &[String] {
        &self.glyph_order
    }

    fn has_glyph(&self, name: &str) -> bool {
        self.glyph_index.contains_key(name)
    }

    fn glyph_outline(&self, name: &str) -> Result<Option<Outline>, FontDocumentError> {
        let index = *self
            .glyph_index
            .get(name)
            .ok_or_else(|| FontDocumentError::UnknownGlyph(name.to_string()))?;
        if let Some(outline) = self.edited_outlines.get(&index) {
            return Ok(Some(outline.clone()));
        }
        if index >= self.original_glyph_count {
            return Ok(None);
        }

        let font = self.font()?;
        let glyf = font.glyf()?;
        let loca = font.loca(None)?;
        match loca.get_glyf(GlyphId::new(index as u32), &glyf)? {
            None => Ok(None),
            Some(ReadGlyph::Simple(simple)) => {
                let mut points = simple.points();
                let mut contours = Vec::new();
                let mut start = 0usize;
                for end in simple.end_pts_of_contours() {
                    let end = end.get() as usize;
                    let contour = points
                        .by_ref()
                        .take((end + 1).saturating_sub(start))
                        .map(|point| OutlinePoint {
                            x: point.x as i32,
                            y: point.y as i32,
                            on_curve: point.on_curve,
                        })
                        .collect();
                    contours.push(Contour { points: contour });
                    start = end + 1;
                }
                Ok(Some(Outline::new(contours)))
            }
            Some(ReadGlyph::Composite(_)) => Err(FontDocumentError::UnsupportedOutline {
                name: name.to_string(),
                reason: "composite glyphs are not supported".into(),
            }),
        }
    }

    fn advance_width(&self, name: &str) -> Option<u16> {
        let index = *self.glyph_index.get(name)?;
        if index >= self.original_glyph_count {
            return self.appended_advances.get(&index).copied();
        }
        self.font()
            .ok()?
            .hmtx()
            .ok()?
            .advance(GlyphId::new(index as u32))
    }

    fn list_lookups_of_kind(
        &self,
        kind: LookupKind,
    ) -> Result<Vec<LookupSummary>, FontDocumentError> {
        let font = self.font()?;
        let gsub: Gsub = match font.gsub() {
            Ok(gsub) => gsub.to_owned_table(),
            Err(ReadError::TableIsMissing(_)) => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut summaries = Vec::new();
        for (index, lookup) in gsub.lookup_list.lookups.iter().enumerate() {
            let (lookup_kind, subtables): (LookupKind, Vec<&LigatureSubstFormat1>) =
                match &**lookup {
                    SubstitutionLookup::Single(_) => (LookupKind::Single, Vec::new()),
                    SubstitutionLookup::Multiple(_) => (LookupKind::Multiple, Vec::new()),
                    SubstitutionLookup::Alternate(_) => (LookupKind::Alternate, Vec::new()),
                    SubstitutionLookup::Ligature(lookup) => (
                        LookupKind::Ligature,
                        lookup.subtables.iter().map(|subtable| &**subtable).collect(),
                    ),
                    SubstitutionLookup::Contextual(_) => (LookupKind::Contextual, Vec::new()),
                    SubstitutionLookup::ChainContextual(_) => {
                        (LookupKind::ChainContextual, Vec::new())
                    }
                    SubstitutionLookup::Reverse(_) => (LookupKind::Reverse, Vec::new()),
                    SubstitutionLookup::Extension(lookup) => {
                        extension_contents(lookup.subtables.iter().map(|subtable| &**subtable))
                    }
                };
            if lookup_kind != kind {
                continue;
            }

            let ligature_targets = subtables
                .iter()
                .flat_map(|subtable| subtable.ligature_sets.iter())
                .flat_map(|set| set.ligatures.iter())
                .filter_map(|ligature| self.glyph_name(ligature.ligature_glyph).cloned())
                .collect();
            summaries.push(LookupSummary {
                index,
                kind: lookup_kind,
                ligature_targets,
            });
        }
        Ok(summaries)
    }

    fn replace_lookup(
        &mut self,
        index: usize,
        table: LigatureTable,
    ) -> Result<(), FontDocumentError> {
        let count = self.font()?.gsub()?.lookup_list()?.lookup_count() as usize;
        if index >= count {
            return Err(FontDocumentError::LookupIndex { index, count });
        }
        self.replaced_lookups.insert(index, table);
        Ok(())
    }

    fn upsert_glyph(
        &mut self,
        name: &str,
        outline: Outline,
        advance: u16,
    ) -> Result<GlyphSlot, FontDocumentError> {
        if let Some(&index) = self.glyph_index.get(name) {
            self.edited_outlines.insert(index, outline);
            return Ok(GlyphSlot::Replaced);
        }

        let index = self.glyph_order.len();
        if index >= u16::MAX as usize {
            return Err(FontDocumentError::TooManyGlyphs(index + 1));
        }
        self.glyph_order.push(name.to_string());
        self.glyph_index.insert(name.to_string(), index);
        self.appended_advances.insert(index, advance);
        self.edited_outlines.insert(index, outline);
        Ok(GlyphSlot::Appended)
    }

    fn set_metadata(&mut self, field: NameField, value: &str) {
        self.names.insert(field, value.to_string());
    }

    fn write_atomically(&self, path: &Path) -> Result<(), FontDocumentError> {
        let bytes = self.compile()?;
        log::debug!("Compiled font: {} bytes", bytes.len());
        write_atomically(path, &bytes)
    }
}

fn read_glyph_order(font: &FontRef<'_>) -> Result<Vec<String>, FontDocumentError> {
    let glyph_count = font.maxp()?.num_glyphs();
    let post = font.post().ok();

    Ok((0..glyph_count)
        .map(|gid| {
            post.as_ref()
                .and_then(|post| post.glyph_name(GlyphId16::new(gid)))
                .map(str::to_string)
                .unwrap_or_else(|| {
                    if gid == 0 {
                        ".notdef".to_string()
                    } else {
                        format!("glyph{gid:05}")
                    }
                })
        })
        .collect())
}

fn extension_contents<'a>(
    mut subtables: impl Iterator<Item = &'a ExtensionSubtable>,
) -> (LookupKind, Vec<&'a LigatureSubstFormat1>) {
    let mut ligatures = Vec::new();
    let kind = match subtables.next() {
        Some(ExtensionSubtable::Single(_)) => LookupKind::Single,
        Some(ExtensionSubtable::Multiple(_)) => LookupKind::Multiple,
        Some(ExtensionSubtable::Alternate(_)) => LookupKind::Alternate,
        Some(ExtensionSubtable::Contextual(_)) => LookupKind::Contextual,
        Some(ExtensionSubtable::ChainContextual(_)) => LookupKind::ChainContextual,
        Some(ExtensionSubtable::Reverse(_)) => LookupKind::Reverse,
        Some(ExtensionSubtable::Ligature(first)) => {
            ligatures.push(&*first.extension);
            for subtable in subtables {
                if let ExtensionSubtable::Ligature(ext) = subtable {
                    ligatures.push(&*ext.extension);
                }
            }
            LookupKind::Ligature
        }
        // An empty extension lookup carries nothing worth matching.
        None => LookupKind::Single,
    };
    (kind, ligatures)
}

fn simple_glyph(name: &str, outline: &Outline) -> Result<Option<SimpleGlyph>, FontDocumentError> {
    let Some(bounds) = outline.bounding_box() else {
        return Ok(None);
    };
    let coord = |value: i32| {
        i16::try_from(value).map_err(|_| FontDocumentError::UnsupportedOutline {
            name: name.to_string(),
            reason: format!("coordinate {value} does not fit in 16 bits"),
        })
    };

    let mut contours = Vec::with_capacity(outline.contours.len());
    for contour in outline.contours.iter().filter(|c| !c.points.is_empty()) {
        let mut points = Vec::with_capacity(contour.points.len());
        for point in &contour.points {
            let (x, y) = (coord(point.x)?, coord(point.y)?);
            points.push(if point.on_curve {
                CurvePoint::on_curve(x, y)
            } else {
                CurvePoint::off_curve(x, y)
            });
        }
        contours.push(GlyfContour::from(points));
    }

    Ok(Some(SimpleGlyph {
        bbox: Bbox {
            x_min: coord(bounds.x_min)?,
            y_min: coord(bounds.y_min)?,
            x_max: coord(bounds.x_max)?,
            y_max: coord(bounds.y_max)?,
        },
        contours,
        instructions: Vec::new(),
    }))
}

/// Running hhea extremes; bearings only count glyphs with contours.
#[derive(Debug, Default)]
struct HorizontalExtremes {
    advance_max: u16,
    min_left: Option<i32>,
    min_right: Option<i32>,
    max_extent: Option<i32>,
}

impl HorizontalExtremes {
    fn add(&mut self, advance: u16, side_bearing: i16, bbox: Option<Bbox>) {
        self.advance_max = self.advance_max.max(advance);
        let Some(bbox) = bbox else {
            return;
        };
        let left = i32::from(side_bearing);
        let extent = left + i32::from(bbox.x_max) - i32::from(bbox.x_min);
        let right = i32::from(advance) - extent;
        self.min_left = Some(self.min_left.map_or(left, |min| min.min(left)));
        self.min_right = Some(self.min_right.map_or(right, |min| min.min(right)));
        self.max_extent = Some(self.max_extent.map_or(extent, |max| max.max(extent)));
    }

    fn apply(&self, hhea: &mut Hhea) {
        hhea.advance_width_max = UfWord::new(self.advance_max);
        hhea.min_left_side_bearing = fword(self.min_left.unwrap_or(0));
        hhea.min_right_side_bearing = fword(self.min_right.unwrap_or(0));
        hhea.x_max_extent = fword(self.max_extent.unwrap_or(0));
    }
}

fn fword(value: i32) -> FWord {
    FWord::new(value.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16)
}

fn union_bbox(acc: Option<Bbox>, next: Bbox) -> Bbox {
    match acc {
        None => next,
        Some(acc) => Bbox {
            x_min: acc.x_min.min(next.x_min),
            y_min: acc.y_min.min(next.y_min),
            x_max: acc.x_max.max(next.x_max),
            y_max: acc.y_max.max(next.y_max),
        },
    }
}

fn compile_error<E: Display>(table: &'static str) -> impl Fn(E) -> FontDocumentError {
    move |err| FontDocumentError::Compile {
        table,
        message: err.to_string(),
    }
}
