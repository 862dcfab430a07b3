//! The generation pipeline, one strictly sequential pass:
//! validate, resolve the alphabet, enumerate, build the table, locate the
//! lookup, generate glyphs, mutate, write.
//!
//! Planning only reads the document, so a run that fails before
//! [`apply_plan`] has not changed anything, in memory or on disk.

use std::fmt;
use std::path::Path;

use font_document::{FontDocument, FontDocumentError, OpenTypeDocument, Outline};
use shared::{NeedleFontConfig, OutlineSource, TrailStyle};

use crate::alphabet::Alphabet;
use crate::buckets::{BucketModel, GlyphNaming};
use crate::enumerator::TimerEnumerator;
use crate::geometry::{KeeperZone, NeedleProfile, anchor_contours};
use crate::ligatures::{BuiltLigatures, build_table, verify_table};
use crate::mutator::{
    MutationReport, NeedleGlyph, apply_mutation, locate_needle_lookup, require_template_family,
};
use crate::trail::{Motion, TrailPainter};
use crate::NeedleFontError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Validating,
    OpeningTemplate,
    ResolvingAlphabet,
    Enumerating,
    BuildingTable,
    LocatingLookup,
    GeneratingGlyphs,
    Mutating,
    Writing,
    Done,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::Validating => "validating configuration",
            Stage::OpeningTemplate => "opening template",
            Stage::ResolvingAlphabet => "resolving alphabet",
            Stage::Enumerating => "enumerating timer strings",
            Stage::BuildingTable => "building ligature table",
            Stage::LocatingLookup => "locating needle lookup",
            Stage::GeneratingGlyphs => "generating glyphs",
            Stage::Mutating => "mutating font",
            Stage::Writing => "writing font",
            Stage::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Everything derived from the template, ready to be applied.
#[derive(Debug, Clone)]
pub struct Plan {
    pub model: BucketModel,
    pub naming: GlyphNaming,
    pub entry_count: usize,
    pub ligatures: BuiltLigatures,
    pub lookup_index: usize,
    pub glyphs: Vec<NeedleGlyph>,
}

impl Plan {
    pub fn summary(&self) -> String {
        let groups = self
            .ligatures
            .groups
            .iter()
            .map(|group| {
                format!(
                    "{} {} in {} subtable(s)",
                    group.pattern.label(),
                    group.entries,
                    group.subtables
                )
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "{} buckets, {} entries ({groups}), lookup {}{}, {} glyph(s) to write",
            self.model.bucket_count(),
            self.entry_count,
            self.lookup_index,
            if self.ligatures.table.use_extension {
                " via extension"
            } else {
                ""
            },
            self.glyphs.len()
        )
    }
}

/// Runs every check that needs no font.
pub fn validate(config: &NeedleFontConfig) -> Result<BucketModel, NeedleFontError> {
    config.validate()?;
    Ok(BucketModel::from_window(&config.window)?)
}

pub fn open_template(path: &Path) -> Result<OpenTypeDocument, NeedleFontError> {
    log::info!("Loading template font {}…", path.display());
    OpenTypeDocument::open(path).map_err(|err| match err {
        FontDocumentError::Open { path, source } if source.kind() == std::io::ErrorKind::NotFound => {
            NeedleFontError::TemplateMissing { path, source }
        }
        other => other.into(),
    })
}

/// Derives the lookup content and needle glyphs without touching `document`.
pub fn plan<D: FontDocument + ?Sized>(
    config: &NeedleFontConfig,
    document: &D,
    on_stage: &mut dyn FnMut(Stage),
) -> Result<Plan, NeedleFontError> {
    on_stage(Stage::Validating);
    let model = validate(config)?;
    plan_validated(config, model, document, on_stage)
}

/// [`plan`] for a caller that already ran [`validate`] and reported the
/// validating stage itself.
pub fn plan_validated<D: FontDocument + ?Sized>(
    config: &NeedleFontConfig,
    model: BucketModel,
    document: &D,
    on_stage: &mut dyn FnMut(Stage),
) -> Result<Plan, NeedleFontError> {
    let naming = GlyphNaming::new(&config.template.glyph_prefix, model.bucket_count());
    require_template_family(
        document,
        &config.template.glyph_prefix,
        config.template.family_size,
    )?;

    on_stage(Stage::ResolvingAlphabet);
    log::info!("Reading cmap for digit/colon glyph names…");
    let alphabet = Alphabet::resolve(document)?;

    on_stage(Stage::Enumerating);
    log::info!(
        "Building ligature mapping (window {}h, {} buckets)…",
        config.window.hours,
        model.bucket_count()
    );
    let entries = TimerEnumerator::new(&alphabet, model, &naming, config.window.hours)
        .enumerate(&config.window.patterns)?;

    on_stage(Stage::BuildingTable);
    let ligatures = build_table(&entries)?;
    verify_table(&ligatures.table, &entries)?;
    log::info!(
        "Built {} subtable(s), {} ligatures",
        ligatures.table.subtables.len(),
        ligatures.table.ligature_count()
    );

    on_stage(Stage::LocatingLookup);
    let lookup_index = locate_needle_lookup(document, &config.template.glyph_prefix)?;
    log::info!("Needle lookup is at index {lookup_index}");

    on_stage(Stage::GeneratingGlyphs);
    let glyphs = generate_glyphs(config, document, &model, &naming)?;

    Ok(Plan {
        model,
        naming,
        entry_count: entries.len(),
        ligatures,
        lookup_index,
        glyphs,
    })
}

/// Needle outlines for every bucket. Template outlines are only rewritten
/// when a trail is configured.
fn generate_glyphs<D: FontDocument + ?Sized>(
    config: &NeedleFontConfig,
    document: &D,
    model: &BucketModel,
    naming: &GlyphNaming,
) -> Result<Vec<NeedleGlyph>, NeedleFontError> {
    let needle = &config.needle;
    let profile = NeedleProfile::from_config(needle);
    let dial_size = needle.dial_size as i32;
    let anchor_size = needle.anchors.size as i32;
    let keepers = KeeperZone::new(dial_size, anchor_size);

    let sources: Vec<(u32, Outline)> = match needle.source {
        OutlineSource::Generate => {
            log::info!(
                "Generating {} needle outlines ({}x{})…",
                model.bucket_count(),
                profile.width,
                profile.length
            );
            model
                .buckets()
                .map(|bucket| {
                    if bucket.index % 10 == 0 {
                        log::debug!(
                            "  needle {}/{} at {:.2}°",
                            bucket.index,
                            model.bucket_count(),
                            bucket.angle_degrees
                        );
                    }
                    let mut contours = Vec::with_capacity(3);
                    let hand = profile.needle(bucket.angle_degrees);
                    if needle.anchors.enabled {
                        let [low, high] = anchor_contours(dial_size, anchor_size);
                        contours.extend([low, hand, high]);
                    } else {
                        contours.push(hand);
                    }
                    (bucket.index, Outline::new(contours))
                })
                .collect()
        }
        OutlineSource::Template if needle.trail.style == TrailStyle::None => {
            log::info!("Keeping template outlines");
            return Ok(Vec::new());
        }
        OutlineSource::Template => {
            log::info!("Reading {} template outlines…", model.bucket_count());
            (0..model.bucket_count())
                .map(|index| -> Result<(u32, Outline), NeedleFontError> {
                    let outline = document.glyph_outline(&naming.name(index))?.unwrap_or_default();
                    Ok((index, outline))
                })
                .collect::<Result<_, _>>()?
        }
    };

    let sources = if needle.trail.style == TrailStyle::None {
        sources
    } else {
        let hand_of = |position: usize| {
            sources
                .get(position)
                .map(|(_, outline)| keepers.split(outline).1)
                .unwrap_or_default()
        };
        let motion = Motion::detect(&hand_of(0), &hand_of(1), profile.center());
        let painter = TrailPainter::new(&needle.trail, motion, profile.center(), keepers);
        log::info!(
            "Adding {:?} trail, hand moves {:?}",
            painter.style(),
            motion
        );
        sources
            .into_iter()
            .map(|(index, outline)| (index, painter.paint(&outline)))
            .collect()
    };

    Ok(sources
        .into_iter()
        .map(|(bucket, outline)| NeedleGlyph {
            name: naming.name(bucket),
            bucket,
            outline,
        })
        .collect())
}

pub fn apply_plan<D: FontDocument + ?Sized>(
    config: &NeedleFontConfig,
    document: &mut D,
    plan: Plan,
    on_stage: &mut dyn FnMut(Stage),
) -> Result<MutationReport, NeedleFontError> {
    on_stage(Stage::Mutating);
    apply_mutation(
        document,
        plan.lookup_index,
        plan.ligatures.table,
        plan.glyphs,
        &config.output,
    )
}

/// Plans and applies in one go, leaving the write to the caller.
pub fn prepare<D: FontDocument + ?Sized>(
    config: &NeedleFontConfig,
    document: &mut D,
    on_stage: &mut dyn FnMut(Stage),
) -> Result<MutationReport, NeedleFontError> {
    let plan = plan(config, &*document, on_stage)?;
    log::info!("Plan: {}", plan.summary());
    apply_plan(config, document, plan, on_stage)
}
