//! Fixture documents shaped like the shipped second-hand template.

use font_document::{
    Contour, LigatureRule, LigatureSet, LigatureSubtable, LigatureTable, LookupKind,
    MemoryDocument, Outline,
};

use crate::alphabet::TIMER_SYMBOLS;
use crate::geometry::{NeedleProfile, anchor_contours};

const DIGIT_NAMES: [&str; 11] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "colon",
];

/// `.notdef` plus mapped digits and colon.
pub fn digits_document() -> MemoryDocument {
    let mut doc = MemoryDocument::new(std::iter::once(".notdef").chain(DIGIT_NAMES));
    for (ch, name) in TIMER_SYMBOLS.chars().zip(DIGIT_NAMES) {
        doc.map_character(ch, name);
    }
    doc
}

/// Two-rule stand-in for the template's original seconds lookup.
pub fn needle_lookup() -> LigatureTable {
    let rule = |second: &str, target: &str| LigatureRule {
        trailing: vec!["colon".into(), "zero".into(), second.into()],
        target: target.into(),
    };
    LigatureTable {
        subtables: vec![LigatureSubtable {
            sets: vec![LigatureSet {
                first_glyph: "zero".into(),
                ligatures: vec![rule("zero", "sec00"), rule("one", "sec01")],
            }],
        }],
        use_extension: false,
    }
}

/// Digits, colon and `sec00..sec59` with anchored needles, a single
/// substitution at lookup 0 and the needle ligature lookup at index 1.
pub fn template_document() -> MemoryDocument {
    let profile = NeedleProfile::default();
    let names: Vec<String> = std::iter::once(".notdef".to_string())
        .chain(DIGIT_NAMES.iter().map(|name| name.to_string()))
        .chain((0..60).map(|i| format!("sec{i:02}")))
        .collect();

    let mut doc = MemoryDocument::new(names);
    for (ch, name) in TIMER_SYMBOLS.chars().zip(DIGIT_NAMES) {
        doc.map_character(ch, name);
        doc.set_glyph(
            name,
            Outline::new(vec![Contour::polygon([(0, 0), (0, 700), (500, 700), (500, 0)])]),
            600,
        );
    }
    for i in 0..60u32 {
        let [low, high] = anchor_contours(1000, 32);
        let outline = Outline::new(vec![low, profile.needle(f64::from(i) * 6.0), high]);
        doc.set_glyph(&format!("sec{i:02}"), outline, 1000);
    }
    doc.push_lookup(LookupKind::Single, LigatureTable::default());
    doc.push_lookup(LookupKind::Ligature, needle_lookup());
    doc
}
