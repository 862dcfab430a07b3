use shared::{BucketModelKind, ConfigError, SECONDS_PER_HOUR, WindowSection};

/// One discrete needle position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bucket {
    pub index: u32,
    pub angle_degrees: f64,
}

/// Discretisation of elapsed time into cyclically wrapping needle positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketModel {
    /// `3600 / tick_seconds` positions across one hour.
    HourRelative { tick_seconds: u32 },
    /// 60 positions, one per second of the minute.
    MinuteRelative,
}

impl BucketModel {
    pub fn hour_relative(tick_seconds: u32) -> Result<Self, ConfigError> {
        if tick_seconds == 0 || SECONDS_PER_HOUR % tick_seconds != 0 {
            return Err(ConfigError::TickNotDivisor(tick_seconds));
        }
        Ok(BucketModel::HourRelative { tick_seconds })
    }

    pub fn from_window(window: &WindowSection) -> Result<Self, ConfigError> {
        match window.model {
            BucketModelKind::Hour => Self::hour_relative(window.tick_seconds),
            BucketModelKind::Minute => Ok(BucketModel::MinuteRelative),
        }
    }

    pub fn bucket_count(&self) -> u32 {
        match *self {
            BucketModel::HourRelative { tick_seconds } => SECONDS_PER_HOUR / tick_seconds,
            BucketModel::MinuteRelative => 60,
        }
    }

    pub fn bucket_of(&self, elapsed_seconds: u64) -> Bucket {
        let index = match *self {
            BucketModel::HourRelative { tick_seconds } => {
                (elapsed_seconds % u64::from(SECONDS_PER_HOUR)) / u64::from(tick_seconds)
            }
            BucketModel::MinuteRelative => elapsed_seconds % 60,
        } as u32;
        self.bucket(index)
    }

    /// Angle clockwise from 12 o'clock, in `[0, 360)`.
    pub fn angle_of(&self, index: u32) -> f64 {
        match *self {
            BucketModel::HourRelative { tick_seconds } => {
                (f64::from(index) * f64::from(tick_seconds) / f64::from(SECONDS_PER_HOUR)) * 360.0
            }
            BucketModel::MinuteRelative => f64::from(index) * 6.0,
        }
    }

    pub fn bucket(&self, index: u32) -> Bucket {
        Bucket {
            index,
            angle_degrees: self.angle_of(index),
        }
    }

    pub fn buckets(&self) -> impl Iterator<Item = Bucket> + '_ {
        (0..self.bucket_count()).map(|index| self.bucket(index))
    }
}

/// Deterministic needle glyph names: prefix plus zero-padded bucket index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphNaming {
    prefix: String,
    width: usize,
}

impl GlyphNaming {
    pub fn new(prefix: impl Into<String>, bucket_count: u32) -> Self {
        let last = bucket_count.saturating_sub(1);
        Self {
            prefix: prefix.into(),
            width: last.to_string().len().max(2),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn name(&self, index: u32) -> String {
        format!("{}{:0width$}", self.prefix, index, width = self.width)
    }
}
