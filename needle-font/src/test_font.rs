//! A small TrueType clock template built in memory for the run tests.

use write_fonts::FontBuilder;
use write_fonts::read::tables::glyf::CurvePoint;
use write_fonts::tables::cmap::Cmap;
use write_fonts::tables::glyf::{Bbox, Contour, GlyfLocaBuilder, Glyph, SimpleGlyph};
use write_fonts::tables::gsub::{
    Gsub, Ligature, LigatureSet, LigatureSubstFormat1, SubstitutionLookup,
    SubstitutionLookupList,
};
use write_fonts::tables::head::Head;
use write_fonts::tables::hhea::Hhea;
use write_fonts::tables::hmtx::{Hmtx, LongMetric};
use write_fonts::tables::layout::{
    builders::CoverageTableBuilder, Feature, FeatureList, FeatureRecord, LangSys, Lookup, LookupFlag,
    Script, ScriptList, ScriptRecord,
};
use write_fonts::tables::loca::LocaFormat;
use write_fonts::tables::maxp::Maxp;
use write_fonts::tables::name::{Name, NameRecord};
use write_fonts::tables::post::Post;
use write_fonts::types::{FWord, GlyphId, GlyphId16, NameId, Tag, UfWord};

const DIGITS: [&str; 10] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine",
];

/// `.notdef`, the ten digits, `colon`, then `sec00..sec59` with empty
/// outlines. Lookup 0 is `zero colon -> sec00`.
pub fn clock_template() -> Vec<u8> {
    let order: Vec<String> = std::iter::once(".notdef".to_string())
        .chain(DIGITS.iter().map(|name| name.to_string()))
        .chain(std::iter::once("colon".to_string()))
        .chain((0..60).map(|i| format!("sec{i:02}")))
        .collect();
    let glyph_count = order.len() as u16;
    let colon = GlyphId16::new(11);
    let sec00 = GlyphId16::new(12);

    let mut glyphs = GlyfLocaBuilder::new();
    let mut metrics = Vec::with_capacity(order.len());
    for gid in 0..order.len() {
        if (1..=11).contains(&gid) {
            let points = vec![
                CurvePoint::on_curve(40, 0),
                CurvePoint::on_curve(40, 700),
                CurvePoint::on_curve(560, 700),
                CurvePoint::on_curve(560, 0),
            ];
            let digit = SimpleGlyph {
                bbox: Bbox {
                    x_min: 40,
                    y_min: 0,
                    x_max: 560,
                    y_max: 700,
                },
                contours: vec![Contour::from(points)],
                instructions: Vec::new(),
            };
            glyphs.add_glyph(&digit).unwrap();
            metrics.push(LongMetric::new(600, 40));
        } else {
            glyphs.add_glyph(&Glyph::Empty).unwrap();
            metrics.push(LongMetric::new(if gid == 0 { 500 } else { 1000 }, 0));
        }
    }
    let (glyf, loca, loca_format) = glyphs.build();

    let head = Head {
        units_per_em: 1000,
        x_min: 40,
        y_min: 0,
        x_max: 560,
        y_max: 700,
        index_to_loc_format: match loca_format {
            LocaFormat::Short => 0,
            LocaFormat::Long => 1,
        },
        ..Default::default()
    };
    let hhea = Hhea {
        ascender: FWord::new(1000),
        descender: FWord::new(0),
        advance_width_max: UfWord::new(1000),
        min_left_side_bearing: FWord::new(40),
        min_right_side_bearing: FWord::new(40),
        x_max_extent: FWord::new(560),
        caret_slope_rise: 1,
        number_of_h_metrics: glyph_count,
        ..Default::default()
    };
    let maxp = Maxp {
        num_glyphs: glyph_count,
        max_points: Some(4),
        max_contours: Some(1),
        max_composite_points: Some(0),
        max_composite_contours: Some(0),
        max_zones: Some(2),
        max_twilight_points: Some(0),
        max_storage: Some(0),
        max_function_defs: Some(0),
        max_instruction_defs: Some(0),
        max_stack_elements: Some(0),
        max_size_of_instructions: Some(0),
        max_component_elements: Some(0),
        max_component_depth: Some(0),
    };
    let post = Post::new_v2(order.iter().map(String::as_str));
    let name = Name::new(vec![NameRecord::new(
        3,
        1,
        0x409,
        NameId::FAMILY_NAME,
        "Clock Template".to_string().into(),
    )]);
    let cmap = Cmap::from_mappings(
        "0123456789:"
            .chars()
            .enumerate()
            .map(|(i, ch)| (ch, GlyphId::new(i as u32 + 1))),
    )
    .unwrap();

    let needle = LigatureSubstFormat1::new(
        CoverageTableBuilder::from_glyphs(vec![GlyphId16::new(1)]).build(),
        vec![LigatureSet::new(vec![Ligature::new(sec00, vec![colon])])],
    );
    let gsub = Gsub::new(
        ScriptList::new(vec![ScriptRecord::new(
            Tag::new(b"DFLT"),
            Script::new(Some(LangSys::new(vec![0])), Vec::new()),
        )]),
        FeatureList::new(vec![FeatureRecord::new(
            Tag::new(b"liga"),
            Feature::new(None, vec![0]),
        )]),
        SubstitutionLookupList::new(vec![SubstitutionLookup::Ligature(Lookup::new(
            LookupFlag::default(),
            vec![needle],
        ))]),
    );

    let mut builder = FontBuilder::new();
    builder.add_table(&head).unwrap();
    builder.add_table(&hhea).unwrap();
    builder.add_table(&maxp).unwrap();
    builder.add_table(&Hmtx::new(metrics, Vec::new())).unwrap();
    builder.add_table(&glyf).unwrap();
    builder.add_table(&loca).unwrap();
    builder.add_table(&post).unwrap();
    builder.add_table(&name).unwrap();
    builder.add_table(&cmap).unwrap();
    builder.add_table(&gsub).unwrap();
    builder.build()
}
