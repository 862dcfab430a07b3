//! Compiles ligature entries into lookup subtables.
//!
//! Ordering rules the shaper depends on:
//! - inside a set, longer component sequences come first, so `1:05` never
//!   wins over `1:05:07`;
//! - subtables go pattern by pattern, longest pattern first;
//! - a first glyph may appear in several subtables, and the shaper moves on
//!   to the next subtable when none of a set's ligatures match.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use font_document::{LigatureRule, LigatureSet, LigatureSubtable, LigatureTable};
use shared::TimerPattern;

use crate::alphabet::{GlyphRef, GlyphSequence};
use crate::enumerator::LigatureEntry;
use crate::NeedleFontError;

/// Largest offset a 16-bit offset field can hold.
pub const OFFSET16_LIMIT: usize = 0xFFFF;

// LigatureSubstFormat1 header: format, coverage offset, set count.
const SUBTABLE_HEADER: usize = 6;
// Coverage format 1 header: format, glyph count.
const COVERAGE_HEADER: usize = 4;
// Set offset, coverage glyph, ligature count.
const SET_COST: usize = 6;
// Ligature offset, ligature glyph, component count.
const LIGATURE_COST: usize = 6;
const COMPONENT_COST: usize = 2;

fn rule_cost(rule: &LigatureRule) -> usize {
    LIGATURE_COST + COMPONENT_COST * rule.trailing.len()
}

/// Encoded size of `subtable`, ignoring alignment and shared sub-objects.
pub fn estimated_size(subtable: &LigatureSubtable) -> usize {
    SUBTABLE_HEADER
        + COVERAGE_HEADER
        + subtable
            .sets
            .iter()
            .map(|set| SET_COST + set.ligatures.iter().map(rule_cost).sum::<usize>())
            .sum::<usize>()
}

/// Rejects two strings that reduce to different glyphs, and folds exact
/// duplicates.
pub fn check_collisions(entries: &[LigatureEntry]) -> Result<Vec<&LigatureEntry>, NeedleFontError> {
    let mut seen: BTreeMap<&GlyphSequence, &LigatureEntry> = BTreeMap::new();
    let mut unique = Vec::with_capacity(entries.len());
    for entry in entries {
        match seen.entry(&entry.sequence) {
            Entry::Vacant(slot) => {
                slot.insert(entry);
                unique.push(entry);
            }
            Entry::Occupied(existing) if existing.get().target == entry.target => {}
            Entry::Occupied(existing) => {
                return Err(NeedleFontError::LigatureCollision {
                    text: entry.text.clone(),
                    first: existing.get().target.clone(),
                    second: entry.target.clone(),
                });
            }
        }
    }
    Ok(unique)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternGroup {
    pub pattern: TimerPattern,
    pub entries: usize,
    pub subtables: usize,
}

#[derive(Debug, Clone)]
pub struct BuiltLigatures {
    pub table: LigatureTable,
    pub groups: Vec<PatternGroup>,
    pub estimated_size: usize,
}

/// Builds the replacement lookup content for `entries`.
///
/// Output depends only on the entry set, never on its order.
pub fn build_table(entries: &[LigatureEntry]) -> Result<BuiltLigatures, NeedleFontError> {
    let unique = check_collisions(entries)?;

    let mut by_pattern: BTreeMap<TimerPattern, Vec<&LigatureEntry>> = BTreeMap::new();
    for entry in unique {
        by_pattern.entry(entry.pattern).or_default().push(entry);
    }

    let mut subtables = Vec::new();
    let mut groups = Vec::new();
    for (pattern, entries) in by_pattern {
        let sets = ordered_sets(&entries);
        let split = pack_subtables(sets);
        log::debug!(
            "Pattern {}: {} entries in {} subtable(s)",
            pattern.label(),
            entries.len(),
            split.len()
        );
        groups.push(PatternGroup {
            pattern,
            entries: entries.len(),
            subtables: split.len(),
        });
        subtables.extend(split);
    }

    let estimated_size: usize = subtables.iter().map(estimated_size).sum();
    let use_extension = estimated_size > OFFSET16_LIMIT;
    if use_extension {
        log::info!("Estimated lookup size {estimated_size} bytes; using extension subtables");
    }

    Ok(BuiltLigatures {
        table: LigatureTable {
            subtables,
            use_extension,
        },
        groups,
        estimated_size,
    })
}

/// Groups by first glyph (ascending id) and orders each group longest
/// sequence first, ties broken by component ids.
fn ordered_sets(entries: &[&LigatureEntry]) -> Vec<LigatureSet> {
    let mut by_first: BTreeMap<&GlyphRef, Vec<&LigatureEntry>> = BTreeMap::new();
    for &entry in entries {
        if let Some(first) = entry.sequence.first() {
            by_first.entry(first).or_default().push(entry);
        }
    }

    by_first
        .into_iter()
        .map(|(first, mut members)| {
            members.sort_by(|a, b| {
                b.sequence
                    .len()
                    .cmp(&a.sequence.len())
                    .then_with(|| a.sequence.cmp(&b.sequence))
            });
            LigatureSet {
                first_glyph: first.name.clone(),
                ligatures: members
                    .into_iter()
                    .map(|entry| LigatureRule {
                        trailing: entry.sequence.0[1..]
                            .iter()
                            .map(|glyph| glyph.name.clone())
                            .collect(),
                        target: entry.target.clone(),
                    })
                    .collect(),
            }
        })
        .collect()
}

/// Packs whole sets into subtables that fit under the offset limit, keeping
/// set order. A set too large on its own continues in the next subtable.
fn pack_subtables(sets: Vec<LigatureSet>) -> Vec<LigatureSubtable> {
    let mut packed = Vec::new();
    let mut current = LigatureSubtable::default();
    let mut size = SUBTABLE_HEADER + COVERAGE_HEADER;

    for set in sets {
        let set_size = SET_COST + set.ligatures.iter().map(rule_cost).sum::<usize>();
        if !current.sets.is_empty() && size + set_size > OFFSET16_LIMIT {
            packed.push(std::mem::take(&mut current));
            size = SUBTABLE_HEADER + COVERAGE_HEADER;
        }

        let mut open: Option<LigatureSet> = None;
        for rule in set.ligatures {
            let mut cost = rule_cost(&rule);
            if open.is_none() {
                cost += SET_COST;
            }
            if size + cost > OFFSET16_LIMIT && (open.is_some() || !current.sets.is_empty()) {
                current.sets.extend(open.take());
                packed.push(std::mem::take(&mut current));
                size = SUBTABLE_HEADER + COVERAGE_HEADER;
                cost = rule_cost(&rule) + SET_COST;
            }
            size += cost;
            open.get_or_insert_with(|| LigatureSet {
                first_glyph: set.first_glyph.clone(),
                ligatures: Vec::new(),
            })
            .ligatures
            .push(rule);
        }
        current.sets.extend(open);
    }

    if !current.sets.is_empty() {
        packed.push(current);
    }
    packed
}

/// Replays every entry through `table` the way a shaper would and fails on
/// the first string that does not land on its own glyph.
pub fn verify_table(table: &LigatureTable, entries: &[LigatureEntry]) -> Result<(), NeedleFontError> {
    for entry in entries {
        let names = entry.sequence.names();
        let actual = table.apply(&names);
        if actual != Some((entry.target.as_str(), names.len())) {
            return Err(NeedleFontError::TableMismatch {
                text: entry.text.clone(),
                expected: entry.target.clone(),
                actual: actual.map(|(glyph, _)| glyph.to_string()),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::Alphabet;
    use crate::buckets::{BucketModel, GlyphNaming};
    use crate::enumerator::TimerEnumerator;
    use crate::test_support::digits_document;

    fn sweep_entries(hours: u32, patterns: &[TimerPattern]) -> Vec<LigatureEntry> {
        let alphabet = Alphabet::resolve(&digits_document()).unwrap();
        let naming = GlyphNaming::new("sec", 3600);
        let model = BucketModel::hour_relative(1).unwrap();
        TimerEnumerator::new(&alphabet, model, &naming, hours)
            .enumerate(patterns)
            .unwrap()
    }

    #[test]
    fn longer_sequences_come_first_in_a_set() {
        let entries = sweep_entries(2, &TimerPattern::ALL);
        let built = build_table(&entries).unwrap();

        let one = built
            .table
            .subtables
            .iter()
            .flat_map(|subtable| subtable.sets.iter())
            .find(|set| set.first_glyph == "one")
            .unwrap();
        let lengths: Vec<usize> = one.ligatures.iter().map(|rule| rule.trailing.len()).collect();
        assert!(lengths.windows(2).all(|pair| pair[0] >= pair[1]));
    }

    #[test]
    fn hour_strings_are_not_shadowed() {
        let entries = sweep_entries(2, &TimerPattern::ALL);
        let built = build_table(&entries).unwrap();
        let glyphs = ["one", "colon", "zero", "five", "colon", "zero", "seven"];
        assert_eq!(built.table.apply(&glyphs), Some(("sec0307", 7)));
        assert_eq!(built.table.apply(&glyphs[..4]), Some(("sec0065", 4)));
        verify_table(&built.table, &entries).unwrap();
    }

    #[test]
    fn large_groups_split_and_use_extension() {
        let entries = sweep_entries(2, &TimerPattern::ALL);
        let built = build_table(&entries).unwrap();

        assert!(built.table.use_extension);
        for subtable in &built.table.subtables {
            assert!(estimated_size(subtable) <= OFFSET16_LIMIT);
        }
        let hour = &built.groups[0];
        assert_eq!(hour.pattern, TimerPattern::HourQualified);
        assert_eq!(hour.entries, 7200);
        assert_eq!(hour.subtables, 2);
        assert_eq!(built.table.ligature_count(), 7200 + 3600 + 600);
    }

    #[test]
    fn small_tables_stay_in_one_subtable_per_pattern() {
        let alphabet = Alphabet::resolve(&digits_document()).unwrap();
        let naming = GlyphNaming::new("sec", 60);
        let entries = TimerEnumerator::new(&alphabet, BucketModel::MinuteRelative, &naming, 1)
            .enumerate(&[TimerPattern::Padded, TimerPattern::Short])
            .unwrap();
        let built = build_table(&entries).unwrap();

        assert!(!built.table.use_extension);
        assert_eq!(built.table.subtables.len(), 2);
        assert_eq!(built.groups[0].pattern, TimerPattern::Padded);
        verify_table(&built.table, &entries).unwrap();
    }

    #[test]
    fn oversized_single_set_continues_in_next_subtable() {
        // 12 hours: first glyph "one" covers 1:.. and 10:.. and 11:..
        let entries = sweep_entries(12, &[TimerPattern::HourQualified]);
        let built = build_table(&entries).unwrap();
        for subtable in &built.table.subtables {
            assert!(estimated_size(subtable) <= OFFSET16_LIMIT);
        }
        let one_sets = built
            .table
            .subtables
            .iter()
            .filter(|subtable| subtable.sets.iter().any(|set| set.first_glyph == "one"))
            .count();
        assert!(one_sets > 1);

        let sample: Vec<LigatureEntry> = entries
            .iter()
            .filter(|entry| entry.text.ends_with(":07"))
            .cloned()
            .collect();
        verify_table(&built.table, &sample).unwrap();
    }

    #[test]
    fn input_order_does_not_matter() {
        let entries = sweep_entries(1, &TimerPattern::ALL);
        let mut reversed = entries.clone();
        reversed.reverse();
        assert_eq!(
            build_table(&entries).unwrap().table,
            build_table(&reversed).unwrap().table
        );
    }

    #[test]
    fn conflicting_targets_are_fatal() {
        let mut entries = sweep_entries(1, &[TimerPattern::Padded]);
        let mut clash = entries[10].clone();
        clash.target = "sec9999".into();
        entries.push(clash);
        assert!(matches!(
            build_table(&entries),
            Err(NeedleFontError::LigatureCollision { .. })
        ));
    }

    #[test]
    fn verify_reports_wrong_target() {
        let entries = sweep_entries(1, &[TimerPattern::Padded]);
        let mut built = build_table(&entries).unwrap();
        built.table.subtables[0].sets[0].ligatures[0].target = "sec9999".into();
        assert!(matches!(
            verify_table(&built.table, &entries),
            Err(NeedleFontError::TableMismatch { .. })
        ));
    }
}
