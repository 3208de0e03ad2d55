use chrono::Duration;
use thiserror::Error;

/// Tunables of the lesson session engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineSettings {
    words_per_minute: u32,
    min_reading_secs: u32,
    default_reading_secs: u32,
    progress_tick_secs: u32,
    countdown_tick_ms: u32,
    sync_debounce_ms: u32,
    pass_threshold_percent: u8,
    lockout_secs: u32,
}

#[derive(Clone, Debug, Default)]
pub struct EngineSettingsDraft {
    pub words_per_minute: Option<u32>,
    pub min_reading_secs: Option<u32>,
    pub default_reading_secs: Option<u32>,
    pub progress_tick_secs: Option<u32>,
    pub countdown_tick_ms: Option<u32>,
    pub sync_debounce_ms: Option<u32>,
    pub pass_threshold_percent: Option<u8>,
    pub lockout_secs: Option<u32>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
    #[error("pass threshold must be within 1..=100, got {0}")]
    PassThreshold(u8),
}

impl EngineSettings {
    pub const DEFAULT_WORDS_PER_MINUTE: u32 = 250;
    pub const DEFAULT_MIN_READING_SECS: u32 = 300;
    pub const DEFAULT_READING_SECS: u32 = 300;
    pub const DEFAULT_PROGRESS_TICK_SECS: u32 = 10;
    pub const DEFAULT_COUNTDOWN_TICK_MS: u32 = 1_000;
    pub const DEFAULT_SYNC_DEBOUNCE_MS: u32 = 1_000;
    pub const DEFAULT_PASS_THRESHOLD: u8 = 70;
    pub const DEFAULT_LOCKOUT_SECS: u32 = 24 * 60 * 60;

    #[must_use]
    pub fn words_per_minute(&self) -> u32 {
        self.words_per_minute
    }

    #[must_use]
    pub fn min_reading_secs(&self) -> u32 {
        self.min_reading_secs
    }

    #[must_use]
    pub fn default_reading_secs(&self) -> u32 {
        self.default_reading_secs
    }

    #[must_use]
    pub fn progress_tick_secs(&self) -> u32 {
        self.progress_tick_secs
    }

    #[must_use]
    pub fn progress_tick(&self) -> Duration {
        Duration::seconds(i64::from(self.progress_tick_secs))
    }

    #[must_use]
    pub fn countdown_tick(&self) -> Duration {
        Duration::milliseconds(i64::from(self.countdown_tick_ms))
    }

    #[must_use]
    pub fn sync_debounce(&self) -> Duration {
        Duration::milliseconds(i64::from(self.sync_debounce_ms))
    }

    #[must_use]
    pub fn pass_threshold_percent(&self) -> u8 {
        self.pass_threshold_percent
    }

    #[must_use]
    pub fn lockout(&self) -> Duration {
        Duration::seconds(i64::from(self.lockout_secs))
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            words_per_minute: Self::DEFAULT_WORDS_PER_MINUTE,
            min_reading_secs: Self::DEFAULT_MIN_READING_SECS,
            default_reading_secs: Self::DEFAULT_READING_SECS,
            progress_tick_secs: Self::DEFAULT_PROGRESS_TICK_SECS,
            countdown_tick_ms: Self::DEFAULT_COUNTDOWN_TICK_MS,
            sync_debounce_ms: Self::DEFAULT_SYNC_DEBOUNCE_MS,
            pass_threshold_percent: Self::DEFAULT_PASS_THRESHOLD,
            lockout_secs: Self::DEFAULT_LOCKOUT_SECS,
        }
    }
}

impl EngineSettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill unset fields with defaults and validate.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if a rate, duration, or tick is zero, or the
    /// pass threshold is outside `1..=100`.
    pub fn validate(self) -> Result<EngineSettings, SettingsError> {
        let defaults = EngineSettings::default();
        let settings = EngineSettings {
            words_per_minute: self.words_per_minute.unwrap_or(defaults.words_per_minute),
            min_reading_secs: self.min_reading_secs.unwrap_or(defaults.min_reading_secs),
            default_reading_secs: self
                .default_reading_secs
                .unwrap_or(defaults.default_reading_secs),
            progress_tick_secs: self.progress_tick_secs.unwrap_or(defaults.progress_tick_secs),
            countdown_tick_ms: self.countdown_tick_ms.unwrap_or(defaults.countdown_tick_ms),
            sync_debounce_ms: self.sync_debounce_ms.unwrap_or(defaults.sync_debounce_ms),
            pass_threshold_percent: self
                .pass_threshold_percent
                .unwrap_or(defaults.pass_threshold_percent),
            lockout_secs: self.lockout_secs.unwrap_or(defaults.lockout_secs),
        };

        for (field, value) in [
            ("words_per_minute", settings.words_per_minute),
            ("default_reading_secs", settings.default_reading_secs),
            ("progress_tick_secs", settings.progress_tick_secs),
            ("countdown_tick_ms", settings.countdown_tick_ms),
        ] {
            if value == 0 {
                return Err(SettingsError::Zero { field });
            }
        }
        if settings.pass_threshold_percent == 0 || settings.pass_threshold_percent > 100 {
            return Err(SettingsError::PassThreshold(settings.pass_threshold_percent));
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_draft_yields_defaults() {
        let settings = EngineSettingsDraft::new().validate().unwrap();
        assert_eq!(settings, EngineSettings::default());
        assert_eq!(settings.lockout(), Duration::hours(24));
        assert_eq!(settings.pass_threshold_percent(), 70);
    }

    #[test]
    fn rejects_zero_tick() {
        let draft = EngineSettingsDraft {
            progress_tick_secs: Some(0),
            ..EngineSettingsDraft::default()
        };
        assert_eq!(
            draft.validate().unwrap_err(),
            SettingsError::Zero {
                field: "progress_tick_secs"
            }
        );
    }

    #[test]
    fn rejects_threshold_above_hundred() {
        let draft = EngineSettingsDraft {
            pass_threshold_percent: Some(101),
            ..EngineSettingsDraft::default()
        };
        assert_eq!(draft.validate().unwrap_err(), SettingsError::PassThreshold(101));
    }
}
