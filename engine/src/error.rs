use font_document::FontDocumentError;
use shared::ConfigError;

/// Broad failure classes. Every one of them aborts the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected before any font was opened.
    Configuration,
    /// The template font lacks something the generator relies on.
    TemplateIntegrity,
    /// Internal logic produced contradictory data.
    Consistency,
    Io,
}

#[derive(Debug, thiserror::Error)]
pub enum NeedleFontError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("template font missing: {path}")]
    TemplateMissing {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("font has no usable character map")]
    NoCharacterMap,

    #[error("font character map has no glyph for {ch:?} (U+{:04X})", code_point(.ch))]
    MissingSymbol { ch: char },

    #[error("template font does not contain glyph '{0}'")]
    MissingTemplateGlyph(String),

    #[error("glyph '{0}' has no advance width to inherit")]
    MissingAdvance(String),

    #[error("could not locate a ligature lookup producing '{prefix}*' glyphs")]
    LookupNotFound { prefix: String },

    #[error("unsupported character {ch:?} in timer string '{text}'")]
    UnsupportedCharacter { ch: char, text: String },

    #[error("'{text}' maps to both '{first}' and '{second}'")]
    LigatureCollision {
        text: String,
        first: String,
        second: String,
    },

    #[error("built table maps '{text}' to {actual:?}, expected '{expected}'")]
    TableMismatch {
        text: String,
        expected: String,
        actual: Option<String>,
    },

    #[error(transparent)]
    Font(#[from] FontDocumentError),
}

fn code_point(ch: &char) -> u32 {
    u32::from(*ch)
}

impl NeedleFontError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NeedleFontError::Config(_) => ErrorKind::Configuration,
            NeedleFontError::TemplateMissing { .. }
            | NeedleFontError::NoCharacterMap
            | NeedleFontError::MissingSymbol { .. }
            | NeedleFontError::MissingTemplateGlyph(_)
            | NeedleFontError::MissingAdvance(_)
            | NeedleFontError::LookupNotFound { .. } => ErrorKind::TemplateIntegrity,
            NeedleFontError::UnsupportedCharacter { .. }
            | NeedleFontError::LigatureCollision { .. }
            | NeedleFontError::TableMismatch { .. } => ErrorKind::Consistency,
            NeedleFontError::Font(err) => match err {
                FontDocumentError::Open { .. } | FontDocumentError::Write { .. } => ErrorKind::Io,
                FontDocumentError::NoCharacterMap
                | FontDocumentError::UnknownGlyph(_)
                | FontDocumentError::Read(_)
                | FontDocumentError::UnsupportedOutline { .. } => ErrorKind::TemplateIntegrity,
                FontDocumentError::Compile { .. }
                | FontDocumentError::LookupIndex { .. }
                | FontDocumentError::TooManyGlyphs(_) => ErrorKind::Consistency,
            },
        }
    }
}
