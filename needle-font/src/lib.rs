pub mod config;
pub mod diagnostics;
pub mod heartbeat;
pub mod run;

#[cfg(test)]
mod test_font;

use engine::{ErrorKind, NeedleFontError};
use shared::ConfigError;

/// Process status for a fatal error: 2 for configuration problems, 1 for
/// everything else.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(err) = cause.downcast_ref::<NeedleFontError>() {
            return match err.kind() {
                ErrorKind::Configuration => 2,
                _ => 1,
            };
        }
        if cause.downcast_ref::<ConfigError>().is_some() {
            return 2;
        }
    }
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn configuration_errors_exit_with_two() {
        let err = anyhow::Error::from(ConfigError::NoPatterns).context("Failed to load config");
        assert_eq!(exit_code(&err), 2);

        let err = anyhow::Error::from(NeedleFontError::from(ConfigError::ZeroHours));
        assert_eq!(exit_code(&err), 2);
    }

    #[test]
    fn other_errors_exit_with_one() {
        let err = anyhow::Error::from(NeedleFontError::NoCharacterMap);
        assert_eq!(exit_code(&err), 1);

        let err: anyhow::Result<()> = Err(std::io::Error::other("disk full")).context("write");
        assert_eq!(exit_code(&err.unwrap_err()), 1);
    }
}
