//! Needle font synthesis.
//!
//! Turns a clock template font into one whose ligature lookup maps every
//! countdown string the host can render onto a pre-rotated needle glyph.

pub mod alphabet;
pub mod buckets;
pub mod enumerator;
mod error;
pub mod geometry;
pub mod ligatures;
pub mod mutator;
pub mod pipeline;
pub mod trail;

#[cfg(test)]
mod test_support;

pub use alphabet::{Alphabet, GlyphRef, GlyphSequence, TIMER_SYMBOLS};
pub use buckets::{Bucket, BucketModel, GlyphNaming};
pub use enumerator::{LigatureEntry, TimerEnumerator, format_timer};
pub use error::{ErrorKind, NeedleFontError};
pub use ligatures::{BuiltLigatures, build_table, verify_table};
pub use mutator::{MutationReport, NeedleGlyph, write_output};
pub use pipeline::{Plan, Stage};
