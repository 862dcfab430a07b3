use shared::TimerPattern;

use crate::alphabet::{Alphabet, GlyphSequence};
use crate::buckets::{BucketModel, GlyphNaming};
use crate::NeedleFontError;

/// One rendered timer string and the needle glyph it must become.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LigatureEntry {
    pub pattern: TimerPattern,
    pub text: String,
    pub sequence: GlyphSequence,
    pub bucket: u32,
    pub target: String,
}

/// Renders `h:mm:ss`, `mm:ss` or `m:ss`. `None` when the pattern cannot
/// show that time (`m:ss` only covers single-digit minutes).
pub fn format_timer(pattern: TimerPattern, hours: u32, minutes: u32, seconds: u32) -> Option<String> {
    match pattern {
        TimerPattern::HourQualified => Some(format!("{hours}:{minutes:02}:{seconds:02}")),
        TimerPattern::Padded => Some(format!("{minutes:02}:{seconds:02}")),
        TimerPattern::Short if minutes < 10 => Some(format!("{minutes}:{seconds:02}")),
        TimerPattern::Short => None,
    }
}

/// Enumerates every string the host's timer formatter can produce over the
/// window and reduces each to its bucket.
pub struct TimerEnumerator<'a> {
    alphabet: &'a Alphabet,
    model: BucketModel,
    naming: &'a GlyphNaming,
    window_hours: u32,
}

impl<'a> TimerEnumerator<'a> {
    pub fn new(
        alphabet: &'a Alphabet,
        model: BucketModel,
        naming: &'a GlyphNaming,
        window_hours: u32,
    ) -> Self {
        Self {
            alphabet,
            model,
            naming,
            window_hours,
        }
    }

    fn hour_range(&self, pattern: TimerPattern) -> std::ops::Range<u32> {
        match pattern {
            TimerPattern::HourQualified => 0..self.window_hours,
            TimerPattern::Padded | TimerPattern::Short => 0..1,
        }
    }

    /// Entries of one pattern in `(h, m, s)` order.
    pub fn entries_for(&self, pattern: TimerPattern) -> Result<Vec<LigatureEntry>, NeedleFontError> {
        let mut entries = Vec::new();
        for hours in self.hour_range(pattern) {
            for minutes in 0..60 {
                for seconds in 0..60 {
                    let Some(text) = format_timer(pattern, hours, minutes, seconds) else {
                        continue;
                    };
                    // The hour digit never moves the hand.
                    let bucket = self.model.bucket_of(u64::from(minutes * 60 + seconds)).index;
                    entries.push(LigatureEntry {
                        pattern,
                        sequence: self.alphabet.translate(&text)?,
                        text,
                        bucket,
                        target: self.naming.name(bucket),
                    });
                }
            }
        }
        Ok(entries)
    }

    pub fn enumerate(&self, patterns: &[TimerPattern]) -> Result<Vec<LigatureEntry>, NeedleFontError> {
        let mut entries = Vec::new();
        for &pattern in patterns {
            let before = entries.len();
            entries.extend(self.entries_for(pattern)?);
            log::info!(
                "Mapping entries {:>7}: {}",
                pattern.label(),
                entries.len() - before
            );
        }
        log::info!("Mapping total entries: {}", entries.len());
        Ok(entries)
    }
}
