use std::path::Path;

use font_document::{FontDocument, GlyphSlot, LigatureTable, LookupKind, NameField, Outline};
use shared::OutputSection;

use crate::buckets::GlyphNaming;
use crate::NeedleFontError;

/// A needle outline ready to be written under its deterministic name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeedleGlyph {
    pub name: String,
    pub bucket: u32,
    pub outline: Outline,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationReport {
    pub lookup_index: usize,
    pub replaced_glyphs: usize,
    pub appended_glyphs: usize,
}

/// Fails unless the template carries the whole `prefix00..` needle family.
pub fn require_template_family<D: FontDocument + ?Sized>(
    document: &D,
    prefix: &str,
    family_size: u32,
) -> Result<(), NeedleFontError> {
    let naming = GlyphNaming::new(prefix, family_size);
    for index in 0..family_size {
        let name = naming.name(index);
        if !document.has_glyph(&name) {
            return Err(NeedleFontError::MissingTemplateGlyph(name));
        }
    }
    Ok(())
}

/// Index of the ligature lookup whose outputs use the needle naming.
///
/// The first match wins; more than one match means the template has grown
/// a second needle lookup, which is worth a warning but not a failure.
/// `prefix` followed by one or more ASCII digits, like `sec07` for `sec`.
fn is_family_member(name: &str, prefix: &str) -> bool {
    name.strip_prefix(prefix)
        .is_some_and(|index| !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()))
}

pub fn locate_needle_lookup<D: FontDocument + ?Sized>(
    document: &D,
    prefix: &str,
) -> Result<usize, NeedleFontError> {
    let matches: Vec<usize> = document
        .list_lookups_of_kind(LookupKind::Ligature)?
        .into_iter()
        .filter(|lookup| {
            lookup
                .ligature_targets
                .iter()
                .any(|target| is_family_member(target, prefix))
        })
        .map(|lookup| lookup.index)
        .collect();

    match matches.as_slice() {
        [] => Err(NeedleFontError::LookupNotFound {
            prefix: prefix.to_string(),
        }),
        [index] => Ok(*index),
        [index, rest @ ..] => {
            log::warn!(
                "Found {} lookups producing '{prefix}*' glyphs; replacing lookup {index}, leaving {rest:?}",
                matches.len()
            );
            Ok(*index)
        }
    }
}

/// Rewrites the document in memory: lookup content, needle outlines and
/// naming. Nothing touches disk until [`write_output`].
pub fn apply_mutation<D: FontDocument + ?Sized>(
    document: &mut D,
    lookup_index: usize,
    table: LigatureTable,
    glyphs: Vec<NeedleGlyph>,
    output: &OutputSection,
) -> Result<MutationReport, NeedleFontError> {
    log::info!("Replacing GSUB ligature lookup at index {lookup_index}…");
    document.replace_lookup(lookup_index, table)?;

    let mut report = MutationReport {
        lookup_index,
        ..MutationReport::default()
    };
    let total = glyphs.len();
    for (written, glyph) in glyphs.into_iter().enumerate() {
        // Replaced glyphs keep their own advance.
        let advance = if document.has_glyph(&glyph.name) {
            0
        } else {
            inherited_advance(document)?
        };
        match document.upsert_glyph(&glyph.name, glyph.outline, advance)? {
            GlyphSlot::Replaced => report.replaced_glyphs += 1,
            GlyphSlot::Appended => report.appended_glyphs += 1,
        }
        if written % 10 == 0 {
            log::debug!("  wrote {} ({}/{total})", glyph.name, written + 1);
        }
    }
    log::info!(
        "Glyphs written: {} replaced, {} appended",
        report.replaced_glyphs,
        report.appended_glyphs
    );

    log::info!("Updating name table…");
    for field in NameField::ALL {
        document.set_metadata(field, &identity_value(output, field));
    }

    Ok(report)
}

/// An appended glyph inherits the advance of the glyph before it.
fn inherited_advance<D: FontDocument + ?Sized>(document: &D) -> Result<u16, NeedleFontError> {
    let previous = document
        .glyph_order()
        .last()
        .ok_or_else(|| NeedleFontError::MissingTemplateGlyph(".notdef".into()))?;
    document
        .advance_width(previous)
        .ok_or_else(|| NeedleFontError::MissingAdvance(previous.clone()))
}

fn identity_value(output: &OutputSection, field: NameField) -> String {
    match field {
        NameField::Family => output.family.clone(),
        NameField::Style => output.style.clone(),
        NameField::UniqueId | NameField::PostScriptName => output.postscript_name(),
        NameField::FullName => output.full_name(),
        NameField::Version => output.version.clone(),
    }
}

pub fn write_output<D: FontDocument + ?Sized>(
    document: &D,
    path: &Path,
) -> Result<(), NeedleFontError> {
    log::info!("Saving font (no output until complete)…");
    document.write_atomically(path)?;
    log::info!("Wrote: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{needle_lookup, template_document};
    use font_document::{
        Contour, LigatureRule, LigatureSet, LigatureSubtable, LigatureTable, MemoryDocument,
    };
    use shared::{NeedleFontConfig, Preset};

    fn square() -> Outline {
        Outline::new(vec![Contour::polygon([(0, 0), (0, 10), (10, 10), (10, 0)])])
    }

    #[test]
    fn locates_lookup_by_target_prefix() {
        let doc = template_document();
        assert_eq!(locate_needle_lookup(&doc, "sec").unwrap(), 1);
        assert!(matches!(
            locate_needle_lookup(&doc, "min"),
            Err(NeedleFontError::LookupNotFound { .. })
        ));
    }

    #[test]
    fn prefix_must_be_followed_by_digits() {
        assert!(is_family_member("sec07", "sec"));
        assert!(is_family_member("sec0307", "sec"));
        assert!(!is_family_member("secondary", "sec"));
        assert!(!is_family_member("sec", "sec"));
        assert!(!is_family_member("sec07.alt", "sec"));
        assert!(!is_family_member("minute07", "sec"));
    }

    #[test]
    fn lookup_producing_lookalike_names_is_skipped() {
        let mut doc = MemoryDocument::new([".notdef", "one", "secondary", "sec00"]);
        doc.push_lookup(
            LookupKind::Ligature,
            LigatureTable {
                subtables: vec![LigatureSubtable {
                    sets: vec![LigatureSet {
                        first_glyph: "one".into(),
                        ligatures: vec![LigatureRule {
                            trailing: vec!["one".into()],
                            target: "secondary".into(),
                        }],
                    }],
                }],
                use_extension: false,
            },
        );
        doc.push_lookup(LookupKind::Ligature, needle_lookup());
        assert_eq!(locate_needle_lookup(&doc, "sec").unwrap(), 1);
    }

    #[test]
    fn first_of_several_needle_lookups_wins() {
        let mut doc = template_document();
        doc.push_lookup(LookupKind::Ligature, needle_lookup());
        assert_eq!(locate_needle_lookup(&doc, "sec").unwrap(), 1);
    }

    #[test]
    fn non_ligature_lookups_are_ignored() {
        let mut doc = MemoryDocument::new([".notdef", "sec00"]);
        doc.push_lookup(LookupKind::Single, needle_lookup());
        assert!(locate_needle_lookup(&doc, "sec").is_err());
    }

    #[test]
    fn template_family_must_be_complete() {
        let doc = template_document();
        require_template_family(&doc, "sec", 60).unwrap();

        let mut partial = MemoryDocument::new(["sec00", "sec01"]);
        partial.push_lookup(LookupKind::Ligature, needle_lookup());
        match require_template_family(&partial, "sec", 60) {
            Err(NeedleFontError::MissingTemplateGlyph(name)) => assert_eq!(name, "sec02"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn mutation_replaces_appends_and_renames() {
        let mut doc = template_document();
        let output = NeedleFontConfig::preset(Preset::Sweep).output;
        let glyphs = vec![
            NeedleGlyph {
                name: "sec00".into(),
                bucket: 0,
                outline: square(),
            },
            NeedleGlyph {
                name: "sec0000".into(),
                bucket: 0,
                outline: square(),
            },
            NeedleGlyph {
                name: "sec0001".into(),
                bucket: 1,
                outline: square(),
            },
        ];
        let before = doc.glyph_order().len();

        let report = apply_mutation(&mut doc, 1, LigatureTable::default(), glyphs, &output).unwrap();

        assert_eq!(report.replaced_glyphs, 1);
        assert_eq!(report.appended_glyphs, 2);
        assert_eq!(doc.glyph_order().len(), before + 2);
        assert_eq!(doc.glyph_order().last().map(String::as_str), Some("sec0001"));
        let last_original = doc.advance_width("sec59");
        assert_eq!(doc.advance_width("sec0000"), last_original);
        assert_eq!(doc.advance_width("sec0001"), last_original);
        assert_eq!(doc.lookup_table(1), Some(&LigatureTable::default()));

        assert_eq!(doc.metadata(NameField::Family), Some("WWClockSweepHand"));
        assert_eq!(
            doc.metadata(NameField::PostScriptName),
            Some("WWClockSweepHand-Regular")
        );
        assert_eq!(doc.metadata(NameField::FullName), Some("WWClockSweepHand Regular"));
        assert_eq!(doc.metadata(NameField::Version), Some("Version 1.0"));
    }

    #[test]
    fn appending_after_a_glyph_without_advance_fails() {
        let mut doc = MemoryDocument::new([".notdef", "sec00"]);
        doc.push_lookup(LookupKind::Ligature, needle_lookup());
        let output = NeedleFontConfig::default().output;
        let glyphs = vec![NeedleGlyph {
            name: "sec0000".into(),
            bucket: 0,
            outline: square(),
        }];

        let result = apply_mutation(&mut doc, 0, LigatureTable::default(), glyphs, &output);
        match result {
            Err(err @ NeedleFontError::MissingAdvance(_)) => {
                assert_eq!(err.to_string(), "glyph 'sec00' has no advance width to inherit");
                assert_eq!(err.kind(), crate::ErrorKind::TemplateIntegrity);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(!doc.has_glyph("sec0000"));
    }

    #[test]
    fn replacing_needs_no_inherited_advance() {
        let mut doc = MemoryDocument::new([".notdef", "sec00"]);
        doc.push_lookup(LookupKind::Ligature, needle_lookup());
        let output = NeedleFontConfig::default().output;
        let glyphs = vec![NeedleGlyph {
            name: "sec00".into(),
            bucket: 0,
            outline: square(),
        }];

        let report = apply_mutation(&mut doc, 0, LigatureTable::default(), glyphs, &output).unwrap();
        assert_eq!(report.replaced_glyphs, 1);
        assert_eq!(doc.advance_width("sec00"), None);
    }

    #[test]
    fn bad_lookup_index_is_reported() {
        let mut doc = template_document();
        let output = NeedleFontConfig::default().output;
        let result = apply_mutation(&mut doc, 9, LigatureTable::default(), Vec::new(), &output);
        assert!(matches!(result, Err(NeedleFontError::Font(_))));
    }
}
