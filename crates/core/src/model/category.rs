use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::model::ids::CategoryId;
use crate::model::locale::{Locale, LocalizedText};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CategoryError {
    #[error("category title cannot be empty")]
    EmptyTitle,

    #[error("category slug cannot be empty")]
    EmptySlug,

    #[error("invalid hex color: {raw}")]
    InvalidColor { raw: String },

    #[error("category cannot be its own parent")]
    SelfParent,

    #[error("invalid category image url: {raw}")]
    InvalidImageUrl { raw: String },
}

/// A quiz category resolved to one locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    id: CategoryId,
    title: String,
    slug: String,
    description: Option<String>,
    parent_id: Option<CategoryId>,
    color: Option<String>,
    icon: Option<String>,
    order: i32,
    time_limit_secs: Option<u32>,
    image_url: Option<Url>,
}

impl Category {
    #[must_use]
    pub fn id(&self) -> &CategoryId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn slug(&self) -> &str {
        &self.slug
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn parent_id(&self) -> Option<&CategoryId> {
        self.parent_id.as_ref()
    }

    #[must_use]
    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }

    /// `#RRGGBB` accent colour for the category card.
    #[must_use]
    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    #[must_use]
    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    #[must_use]
    pub fn order(&self) -> i32 {
        self.order
    }

    /// Default countdown for questions in this category that do not set one.
    #[must_use]
    pub fn time_limit_secs(&self) -> Option<u32> {
        self.time_limit_secs
    }

    #[must_use]
    pub fn image_url(&self) -> Option<&Url> {
        self.image_url.as_ref()
    }
}

/// Localized category as authored in the content store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDocument {
    pub id: CategoryId,
    pub title: LocalizedText,
    pub slug: String,
    #[serde(default)]
    pub description: Option<LocalizedText>,
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub time_limit_secs: Option<u32>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl CategoryDocument {
    /// Check the locale-independent fields.
    ///
    /// # Errors
    ///
    /// Returns `CategoryError` for a blank slug, a malformed colour, an image
    /// reference that is not a URL, or a self-referencing parent.
    pub fn validate(&self) -> Result<(), CategoryError> {
        if self.slug.trim().is_empty() {
            return Err(CategoryError::EmptySlug);
        }
        if let Some(color) = self.color.as_deref() {
            if !is_hex_color(color) {
                return Err(CategoryError::InvalidColor {
                    raw: color.to_string(),
                });
            }
        }
        self.parsed_image_url()?;
        if self.parent_id.as_ref() == Some(&self.id) {
            return Err(CategoryError::SelfParent);
        }
        Ok(())
    }

    /// A blank image reference counts as no image.
    fn parsed_image_url(&self) -> Result<Option<Url>, CategoryError> {
        let Some(raw) = self.image_url.as_deref().map(str::trim).filter(|raw| !raw.is_empty())
        else {
            return Ok(None);
        };
        Url::parse(raw).map(Some).map_err(|_| CategoryError::InvalidImageUrl {
            raw: raw.to_string(),
        })
    }

    /// Resolve titles for `locale` (English fallback) and validate.
    ///
    /// # Errors
    ///
    /// Returns `CategoryError` if validation fails or no title exists.
    pub fn localize(&self, locale: Locale) -> Result<Category, CategoryError> {
        self.validate()?;
        let title = self
            .title
            .resolve(locale)
            .map(|title| title.trim().to_string())
            .ok_or(CategoryError::EmptyTitle)?;

        Ok(Category {
            id: self.id.clone(),
            title,
            slug: self.slug.trim().to_string(),
            description: self
                .description
                .as_ref()
                .and_then(|text| text.resolve(locale))
                .map(str::to_string),
            parent_id: self.parent_id.clone(),
            color: self.color.clone(),
            icon: self.icon.clone(),
            order: self.order,
            time_limit_secs: self.time_limit_secs,
            image_url: self.parsed_image_url()?,
        })
    }
}

fn is_hex_color(raw: &str) -> bool {
    raw.len() == 7
        && raw.starts_with('#')
        && raw[1..].chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> CategoryDocument {
        CategoryDocument {
            id: CategoryId::new("barista"),
            title: LocalizedText::en("Barista Skills").with(Locale::Es, "Habilidades de Barista"),
            slug: "barista-skills".into(),
            description: Some(LocalizedText::en("Master espresso and milk drinks")),
            parent_id: None,
            color: Some("#7B2FF7".into()),
            icon: Some("☕".into()),
            order: 2,
            time_limit_secs: Some(25),
            image_url: Some("https://cdn.example.com/barista.png".into()),
        }
    }

    #[test]
    fn localizes_title_and_falls_back_for_description() {
        let category = doc().localize(Locale::Es).unwrap();
        assert_eq!(category.title(), "Habilidades de Barista");
        assert_eq!(category.description(), Some("Master espresso and milk drinks"));
        assert!(category.is_top_level());
        assert_eq!(category.time_limit_secs(), Some(25));
    }

    #[test]
    fn rejects_malformed_color() {
        let mut bad = doc();
        bad.color = Some("purple".into());
        assert!(matches!(
            bad.localize(Locale::En),
            Err(CategoryError::InvalidColor { .. })
        ));
    }

    #[test]
    fn rejects_missing_title_and_self_parent() {
        let mut untitled = doc();
        untitled.title = LocalizedText::new();
        assert_eq!(untitled.localize(Locale::En), Err(CategoryError::EmptyTitle));

        let mut looped = doc();
        looped.parent_id = Some(looped.id.clone());
        assert_eq!(looped.validate(), Err(CategoryError::SelfParent));
    }

    #[test]
    fn carries_image_url_and_rejects_malformed_ones() {
        let category = doc().localize(Locale::En).unwrap();
        assert_eq!(
            category.image_url().map(Url::as_str),
            Some("https://cdn.example.com/barista.png")
        );

        let mut blank = doc();
        blank.image_url = Some("   ".into());
        assert!(blank.localize(Locale::En).unwrap().image_url().is_none());

        let mut bad = doc();
        bad.image_url = Some("beans.png".into());
        assert_eq!(
            bad.validate(),
            Err(CategoryError::InvalidImageUrl {
                raw: "beans.png".into()
            })
        );
    }
}
