use serde::{Deserialize, Serialize};

// ===== CONVENTIONAL PATHS =====

pub const TEMPLATE_FONT_PATH: &str = "WidgetWeaverWidget/Clock/WWClockSecondHand-Regular.ttf";
pub const MINUTE_HAND_FONT_PATH: &str = "WidgetWeaverWidget/Clock/WWClockMinuteHand-Regular.ttf";
pub const SWEEP_HAND_FONT_PATH: &str = "WidgetWeaverWidget/Clock/WWClockSweepHand-Regular.ttf";

pub const SECONDS_PER_HOUR: u32 = 3600;
/// Longest countdown window; every extra hour adds 3600 hour-qualified
/// ligatures to a single lookup.
pub const MAX_WINDOW_HOURS: u32 = 24;

// ===== TIMER FORMATS =====

/// Text shapes the host's countdown formatter renders.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum TimerPattern {
    /// `h:mm:ss`
    HourQualified,
    /// `mm:ss`
    Padded,
    /// `m:ss`, single-digit minutes only
    Short,
}

impl TimerPattern {
    /// Longest rendering first.
    pub const ALL: [TimerPattern; 3] = [
        TimerPattern::HourQualified,
        TimerPattern::Padded,
        TimerPattern::Short,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TimerPattern::HourQualified => "h:mm:ss",
            TimerPattern::Padded => "mm:ss",
            TimerPattern::Short => "m:ss",
        }
    }
}

// ===== CONFIG TYPES =====

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct NeedleFontConfig {
    pub template: TemplateSection,
    pub output: OutputSection,
    pub window: WindowSection,
    pub needle: NeedleSection,
}

impl Default for NeedleFontConfig {
    fn default() -> Self {
        Self::preset(Preset::MinuteHand)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TemplateSection {
    pub path: String,
    /// Prefix of the template's needle glyph family (`sec00`..`sec59`).
    pub glyph_prefix: String,
    pub family_size: u32,
}

impl Default for TemplateSection {
    fn default() -> Self {
        Self {
            path: TEMPLATE_FONT_PATH.to_string(),
            glyph_prefix: "sec".to_string(),
            family_size: 60,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct OutputSection {
    pub path: String,
    pub family: String,
    pub style: String,
    pub version: String,
}

impl OutputSection {
    fn named(path: &str, family: &str) -> Self {
        Self {
            path: path.to_string(),
            family: family.to_string(),
            style: "Regular".to_string(),
            version: "Version 1.0".to_string(),
        }
    }

    /// `Family-Style`, used for the unique identifier and PostScript name.
    pub fn postscript_name(&self) -> String {
        format!("{}-{}", self.family, self.style)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.family, self.style)
    }
}

impl Default for OutputSection {
    fn default() -> Self {
        Self::named(MINUTE_HAND_FONT_PATH, "WWClockMinuteHand")
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum BucketModelKind {
    /// Positions across one hour, `3600 / tick_seconds` of them.
    Hour,
    /// Seconds within a minute, 60 positions.
    Minute,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct WindowSection {
    pub model: BucketModelKind,
    /// Timer window the host renders, in whole hours.
    pub hours: u32,
    pub tick_seconds: u32,
    pub patterns: Vec<TimerPattern>,
}

impl WindowSection {
    pub fn bucket_count(&self) -> u32 {
        match self.model {
            BucketModelKind::Minute => 60,
            BucketModelKind::Hour if self.tick_seconds == 0 => 0,
            BucketModelKind::Hour => SECONDS_PER_HOUR / self.tick_seconds,
        }
    }
}

impl Default for WindowSection {
    fn default() -> Self {
        Self {
            model: BucketModelKind::Hour,
            hours: 2,
            tick_seconds: 60,
            patterns: TimerPattern::ALL.to_vec(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum OutlineSource {
    /// Synthesize one needle per bucket.
    Generate,
    /// Keep the template's existing needle glyphs.
    Template,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct NeedleSection {
    pub source: OutlineSource,
    pub dial_size: u32,
    pub width: f64,
    pub length: f64,
    pub anchors: AnchorSection,
    pub trail: TrailSection,
}

impl Default for NeedleSection {
    fn default() -> Self {
        Self {
            source: OutlineSource::Generate,
            dial_size: 1000,
            width: 18.0,
            length: 420.0,
            anchors: AnchorSection::default(),
            trail: TrailSection::default(),
        }
    }
}

/// Corner squares that pin every needle glyph to the full dial box.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AnchorSection {
    pub enabled: bool,
    pub size: u32,
}

impl Default for AnchorSection {
    fn default() -> Self {
        Self {
            enabled: true,
            size: 32,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TrailStyle {
    None,
    /// Rotated, shrinking copies of the hand.
    Echo,
    /// Tapered arc sectors behind the tip.
    Arc,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TrailSection {
    pub style: TrailStyle,
    pub flip_direction: bool,
    pub echo: EchoTrail,
    pub arc: ArcTrail,
}

impl Default for TrailSection {
    fn default() -> Self {
        Self {
            style: TrailStyle::None,
            flip_direction: false,
            echo: EchoTrail::default(),
            arc: ArcTrail::default(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EchoTrail {
    pub count: u32,
    pub step_deg: f64,
    pub scale_step: f64,
}

impl Default for EchoTrail {
    fn default() -> Self {
        Self {
            count: 5,
            step_deg: 1.0,
            scale_step: 0.03,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ArcTrail {
    pub span_deg: f64,
    pub radius_inset: f64,
    pub thickness: f64,
    pub segments: u32,
    pub taper_min_frac: f64,
    pub layers: u32,
    pub span_decay: f64,
    pub thickness_decay: f64,
    pub inset_step: f64,
}

impl Default for ArcTrail {
    fn default() -> Self {
        Self {
            span_deg: 5.5,
            radius_inset: 10.0,
            thickness: 10.0,
            segments: 20,
            taper_min_frac: 0.22,
            layers: 3,
            span_decay: 0.25,
            thickness_decay: 0.25,
            inset_step: 2.0,
        }
    }
}

// ===== PRESETS =====

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Rebuilds the template's seconds lookup in place; outlines untouched.
    SecondHand,
    /// 60 generated needles over a multi-hour window.
    MinuteHand,
    /// 3600 generated needles, one per second of the hour, with an echo trail.
    Sweep,
}

impl NeedleFontConfig {
    pub fn preset(preset: Preset) -> Self {
        match preset {
            Preset::SecondHand => Self {
                template: TemplateSection::default(),
                output: OutputSection::named(TEMPLATE_FONT_PATH, "WWClockSecondHand"),
                window: WindowSection {
                    model: BucketModelKind::Minute,
                    hours: 1,
                    tick_seconds: 1,
                    patterns: vec![TimerPattern::Padded, TimerPattern::Short],
                },
                needle: NeedleSection {
                    source: OutlineSource::Template,
                    ..NeedleSection::default()
                },
            },
            Preset::MinuteHand => Self {
                template: TemplateSection::default(),
                output: OutputSection::named(MINUTE_HAND_FONT_PATH, "WWClockMinuteHand"),
                window: WindowSection::default(),
                needle: NeedleSection::default(),
            },
            Preset::Sweep => Self {
                template: TemplateSection::default(),
                output: OutputSection::named(SWEEP_HAND_FONT_PATH, "WWClockSweepHand"),
                window: WindowSection {
                    tick_seconds: 1,
                    ..WindowSection::default()
                },
                needle: NeedleSection {
                    trail: TrailSection {
                        style: TrailStyle::Echo,
                        ..TrailSection::default()
                    },
                    ..NeedleSection::default()
                },
            },
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Checks everything that can be checked without opening a font.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let window = &self.window;
        if window.hours == 0 {
            return Err(ConfigError::ZeroHours);
        }
        if window.hours > MAX_WINDOW_HOURS {
            return Err(ConfigError::TooManyHours(window.hours));
        }
        if window.model == BucketModelKind::Hour
            && (window.tick_seconds == 0 || SECONDS_PER_HOUR % window.tick_seconds != 0)
        {
            return Err(ConfigError::TickNotDivisor(window.tick_seconds));
        }
        if window.patterns.is_empty() {
            return Err(ConfigError::NoPatterns);
        }
        for (index, pattern) in window.patterns.iter().enumerate() {
            if window.patterns[..index].contains(pattern) {
                return Err(ConfigError::DuplicatePattern(pattern.label()));
            }
        }

        if self.template.glyph_prefix.is_empty() {
            return Err(ConfigError::EmptyGlyphPrefix);
        }
        if self.needle.source == OutlineSource::Template
            && window.bucket_count() != self.template.family_size
        {
            return Err(ConfigError::TemplateBucketMismatch {
                bucket_count: window.bucket_count(),
                family_size: self.template.family_size,
            });
        }

        self.validate_needle()
    }

    fn validate_needle(&self) -> Result<(), ConfigError> {
        let needle = &self.needle;
        if needle.dial_size == 0 || needle.dial_size > i16::MAX as u32 {
            return Err(ConfigError::InvalidNeedle(format!(
                "dial_size must be within 1..={}, got {}",
                i16::MAX,
                needle.dial_size
            )));
        }
        if !(needle.width >= 0.0 && needle.width.is_finite()) {
            return Err(ConfigError::InvalidNeedle(format!(
                "width must be a finite non-negative number, got {}",
                needle.width
            )));
        }
        if !(needle.length > 0.0 && needle.length <= needle.dial_size as f64 / 2.0) {
            return Err(ConfigError::InvalidNeedle(format!(
                "length must be within (0, {}], got {}",
                needle.dial_size as f64 / 2.0,
                needle.length
            )));
        }
        if needle.anchors.enabled
            && (needle.anchors.size == 0
                || needle
                    .anchors
                    .size
                    .checked_mul(2)
                    .is_none_or(|span| span > needle.dial_size))
        {
            return Err(ConfigError::InvalidNeedle(format!(
                "anchor size {} does not fit the dial",
                needle.anchors.size
            )));
        }

        let trail = &needle.trail;
        match trail.style {
            TrailStyle::None => Ok(()),
            TrailStyle::Echo => {
                let echo = &trail.echo;
                if echo.count == 0 || !(echo.step_deg > 0.0) {
                    return Err(ConfigError::InvalidTrail(
                        "echo trail needs count >= 1 and step_deg > 0".into(),
                    ));
                }
                if !(0.0..1.0).contains(&echo.scale_step) {
                    return Err(ConfigError::InvalidTrail(format!(
                        "echo scale_step must be within [0, 1), got {}",
                        echo.scale_step
                    )));
                }
                Ok(())
            }
            TrailStyle::Arc => {
                let arc = &trail.arc;
                if arc.segments == 0 || arc.layers == 0 {
                    return Err(ConfigError::InvalidTrail(
                        "arc trail needs segments >= 1 and layers >= 1".into(),
                    ));
                }
                if !(arc.span_deg > 0.0 && arc.thickness > 0.0) {
                    return Err(ConfigError::InvalidTrail(
                        "arc span_deg and thickness must be positive".into(),
                    ));
                }
                if !(0.0..=1.0).contains(&arc.taper_min_frac) {
                    return Err(ConfigError::InvalidTrail(format!(
                        "arc taper_min_frac must be within [0, 1], got {}",
                        arc.taper_min_frac
                    )));
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}'")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("window hours must be at least 1")]
    ZeroHours,
    #[error("window hours {0} exceeds the maximum of {max}", max = MAX_WINDOW_HOURS)]
    TooManyHours(u32),
    #[error("tick_seconds {0} does not divide 3600 evenly")]
    TickNotDivisor(u32),
    #[error("at least one timer pattern is required")]
    NoPatterns,
    #[error("timer pattern {0} is listed more than once")]
    DuplicatePattern(&'static str),
    #[error("template glyph prefix must not be empty")]
    EmptyGlyphPrefix,
    #[error(
        "template outlines cover {family_size} positions but the window needs {bucket_count}"
    )]
    TemplateBucketMismatch { bucket_count: u32, family_size: u32 },
    #[error("invalid needle shape: {0}")]
    InvalidNeedle(String),
    #[error("invalid trail: {0}")]
    InvalidTrail(String),
}
