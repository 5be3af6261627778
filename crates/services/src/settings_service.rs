use std::sync::Arc;

use storage::repository::PreferencesRepository;
use trivia_core::model::Locale;

use crate::error::SettingsServiceError;

/// Preference key holding the player's chosen locale code.
pub const LOCALE_KEY: &str = "app.locale";

#[derive(Clone)]
pub struct SettingsService {
    preferences: Arc<dyn PreferencesRepository>,
}

impl SettingsService {
    #[must_use]
    pub fn new(preferences: Arc<dyn PreferencesRepository>) -> Self {
        Self { preferences }
    }

    /// The stored locale if it is a supported one.
    ///
    /// # Errors
    ///
    /// Returns `SettingsServiceError` on storage failures.
    pub async fn stored_locale(&self) -> Result<Option<Locale>, SettingsServiceError> {
        let stored = self.preferences.get_preference(LOCALE_KEY).await?;
        Ok(stored.and_then(|raw| match raw.parse::<Locale>() {
            Ok(locale) => Some(locale),
            Err(err) => {
                tracing::warn!(error = %err, "ignoring stored locale");
                None
            }
        }))
    }

    /// Stored preference, else the device locale, else English.
    ///
    /// # Errors
    ///
    /// Returns `SettingsServiceError` on storage failures.
    pub async fn resolve_locale(
        &self,
        device: Option<Locale>,
    ) -> Result<Locale, SettingsServiceError> {
        Ok(self
            .stored_locale()
            .await?
            .or(device)
            .unwrap_or(Locale::FALLBACK))
    }

    /// # Errors
    ///
    /// Returns `SettingsServiceError` on storage failures.
    pub async fn set_locale(&self, locale: Locale) -> Result<(), SettingsServiceError> {
        self.preferences
            .set_preference(LOCALE_KEY, locale.code())
            .await?;
        Ok(())
    }
}
