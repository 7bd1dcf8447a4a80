//! Client-side validation for the create-movie form, performed server-side
//! before anything is forwarded upstream.

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

use crate::models::{NewMovie, PosterUpload};

pub const MIN_RELEASE_YEAR: i32 = 1900;

/// Years beyond the current one a release may be scheduled for.
const RELEASE_YEAR_HEADROOM: i32 = 5;

/// Raw form state as submitted by the browser. Selections are tracked by
/// numeric id for genres and actors alike. The poster never round-trips
/// through a re-render (file inputs cannot be prefilled), so it is skipped
/// when the form is stashed for a redirect.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MovieForm {
    pub title: String,
    pub description: String,
    pub duration: String,
    pub release_year: String,
    pub trailer_url: String,
    pub genres: Vec<i64>,
    pub actors: Vec<i64>,
    #[serde(skip)]
    pub poster: Option<PosterUpload>,
}

impl MovieForm {
    /// An empty form with the release year prefilled to today's.
    #[must_use]
    pub fn prefilled() -> Self {
        Self {
            release_year: Utc::now().year().to_string(),
            ..Self::default()
        }
    }

    /// Validate every field; either a [`NewMovie`] ready to submit or a map
    /// keyed by exactly the invalid fields.
    pub fn validated(&self) -> Result<NewMovie, BTreeMap<String, String>> {
        let mut errors = BTreeMap::new();
        let max_year = Utc::now().year() + RELEASE_YEAR_HEADROOM;

        if self.title.trim().is_empty() {
            errors.insert("title".to_string(), "Title is required".to_string());
        }

        if self.description.trim().is_empty() {
            errors.insert(
                "description".to_string(),
                "Description is required".to_string(),
            );
        }

        let duration = if self.duration.trim().is_empty() {
            errors.insert("duration".to_string(), "Duration is required".to_string());
            None
        } else {
            match self.duration.trim().parse::<u32>() {
                Ok(minutes) if minutes > 0 => Some(minutes),
                _ => {
                    errors.insert(
                        "duration".to_string(),
                        "Duration must be a positive integer".to_string(),
                    );
                    None
                }
            }
        };

        let release_year = if self.release_year.trim().is_empty() {
            errors.insert(
                "release_year".to_string(),
                "Release year is required".to_string(),
            );
            None
        } else {
            match self.release_year.trim().parse::<i32>() {
                Ok(year) if (MIN_RELEASE_YEAR..=max_year).contains(&year) => Some(year),
                _ => {
                    errors.insert(
                        "release_year".to_string(),
                        format!("Release year must be between {MIN_RELEASE_YEAR} and {max_year}"),
                    );
                    None
                }
            }
        };

        let trailer_url = self.trailer_url.trim();
        let trailer_url = if trailer_url.is_empty() {
            None
        } else if Url::parse(trailer_url).is_ok() {
            Some(trailer_url.to_string())
        } else {
            errors.insert(
                "trailer_url".to_string(),
                "Trailer URL is not a valid URL".to_string(),
            );
            None
        };

        if self.genres.is_empty() {
            errors.insert(
                "genres".to_string(),
                "Select at least one genre".to_string(),
            );
        }

        if self.actors.is_empty() {
            errors.insert(
                "actors".to_string(),
                "Select at least one actor".to_string(),
            );
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(NewMovie {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            duration: duration.unwrap_or_default(),
            release_year: release_year.unwrap_or_default(),
            trailer_url,
            genres: self.genres.clone(),
            actors: self.actors.clone(),
            poster: self.poster.clone(),
        })
    }
}

/// Validation errors and entered values stashed in the session across the
/// submit-then-redirect round trip.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormFlash {
    pub values: MovieForm,
    pub errors: BTreeMap<String, String>,
    pub banner: Option<String>,
}

pub const FORM_FLASH_KEY: &str = "movie_form_flash";

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> MovieForm {
        MovieForm {
            title: "Arrival".to_string(),
            description: "First contact, in reverse".to_string(),
            duration: "116".to_string(),
            release_year: "2016".to_string(),
            trailer_url: "https://youtu.be/tFMo3UJ4B4g".to_string(),
            genres: vec![2],
            actors: vec![3, 4],
            poster: None,
        }
    }

    #[test]
    fn test_valid_form_produces_new_movie() {
        let movie = valid_form().validated().expect("form should be valid");
        assert_eq!(movie.title, "Arrival");
        assert_eq!(movie.duration, 116);
        assert_eq!(movie.release_year, 2016);
        assert_eq!(movie.trailer_url.as_deref(), Some("https://youtu.be/tFMo3UJ4B4g"));
        assert_eq!(movie.genres, vec![2]);
        assert_eq!(movie.actors, vec![3, 4]);
    }

    #[test]
    fn test_empty_form_reports_exactly_the_required_fields() {
        let errors = MovieForm::default().validated().unwrap_err();
        let keys: Vec<&str> = errors.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "actors",
                "description",
                "duration",
                "genres",
                "release_year",
                "title"
            ]
        );
    }

    #[test]
    fn test_missing_trailer_is_not_an_error() {
        let mut form = valid_form();
        form.trailer_url = String::new();
        let movie = form.validated().expect("trailer is optional");
        assert!(movie.trailer_url.is_none());
    }

    #[test]
    fn test_malformed_trailer_url_is_rejected() {
        let mut form = valid_form();
        form.trailer_url = "not a url".to_string();
        let errors = form.validated().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.contains_key("trailer_url"));
    }

    #[test]
    fn test_duration_must_be_a_positive_integer() {
        for bad in ["abc", "0", "-10", "12.5"] {
            let mut form = valid_form();
            form.duration = bad.to_string();
            let errors = form.validated().unwrap_err();
            assert!(errors.contains_key("duration"), "duration {bad:?} accepted");
        }
    }

    #[test]
    fn test_release_year_bounds() {
        let max_year = Utc::now().year() + 5;

        let mut form = valid_form();
        form.release_year = "1899".to_string();
        assert!(form.validated().unwrap_err().contains_key("release_year"));

        form.release_year = (max_year + 1).to_string();
        assert!(form.validated().unwrap_err().contains_key("release_year"));

        form.release_year = MIN_RELEASE_YEAR.to_string();
        assert!(form.validated().is_ok());

        form.release_year = max_year.to_string();
        assert!(form.validated().is_ok());
    }

    #[test]
    fn test_selections_require_at_least_one_of_each() {
        let mut form = valid_form();
        form.genres.clear();
        assert!(form.validated().unwrap_err().contains_key("genres"));

        let mut form = valid_form();
        form.actors.clear();
        assert!(form.validated().unwrap_err().contains_key("actors"));
    }

    #[test]
    fn test_whitespace_only_fields_are_rejected() {
        let mut form = valid_form();
        form.title = "   ".to_string();
        assert!(form.validated().unwrap_err().contains_key("title"));
    }
}
