#![allow(dead_code)]

use engine::geometry::{NeedleProfile, anchor_contours};
use font_document::{
    Contour, LigatureRule, LigatureSet, LigatureSubtable, LigatureTable, LookupKind,
    MemoryDocument, Outline,
};

pub const DIGIT_NAMES: [&str; 11] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "colon",
];

pub struct Template {
    pub map_colon: bool,
    pub lookup_target: &'static str,
}

impl Default for Template {
    fn default() -> Self {
        Self {
            map_colon: true,
            lookup_target: "sec00",
        }
    }
}

impl Template {
    /// A document laid out like the shipped second-hand font: digits, colon,
    /// `sec00..sec59` with anchored needles, an unrelated single substitution
    /// and the needle ligature lookup.
    pub fn build(&self) -> MemoryDocument {
        let profile = NeedleProfile::default();
        let names: Vec<String> = std::iter::once(".notdef".to_string())
            .chain(DIGIT_NAMES.iter().map(|name| name.to_string()))
            .chain((0..60).map(|i| format!("sec{i:02}")))
            .collect();

        let mut doc = MemoryDocument::new(names);
        for (ch, name) in "0123456789:".chars().zip(DIGIT_NAMES) {
            if ch != ':' || self.map_colon {
                doc.map_character(ch, name);
            }
            doc.set_glyph(
                name,
                Outline::new(vec![Contour::polygon([(40, 0), (40, 700), (560, 700), (560, 0)])]),
                600,
            );
        }
        for i in 0..60u32 {
            let [low, high] = anchor_contours(1000, 32);
            let outline = Outline::new(vec![low, profile.needle(f64::from(i) * 6.0), high]);
            doc.set_glyph(&format!("sec{i:02}"), outline, 1000);
        }

        doc.push_lookup(LookupKind::Single, LigatureTable::default());
        doc.push_lookup(
            LookupKind::Ligature,
            LigatureTable {
                subtables: vec![LigatureSubtable {
                    sets: vec![LigatureSet {
                        first_glyph: "zero".into(),
                        ligatures: vec![LigatureRule {
                            trailing: vec!["colon".into(), "zero".into(), "zero".into()],
                            target: self.lookup_target.into(),
                        }],
                    }],
                }],
                use_extension: false,
            },
        );
        doc
    }
}

pub fn template() -> MemoryDocument {
    Template::default().build()
}
