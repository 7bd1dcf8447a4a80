//! Client for the upstream movie-catalog endpoints.

use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::info;

use super::{ClientError, decode, exchange};
use crate::fetch::CancelToken;
use crate::models::{Actor, Genre, Movie, MovieList, NewMovie};

/// `{ "data": [...] }` envelope used by the actor and genre listings.
#[derive(Debug, Deserialize)]
struct ListEnvelope<T> {
    data: Vec<T>,
}

#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: reqwest::Client,
    base_url: String,
}

impl CatalogClient {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Absolute URL for an upstream-hosted asset path such as a poster.
    #[must_use]
    pub fn asset_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    /// GET /movies: paginated listing. Page and limit are the authoritative
    /// contract and are sent on every request.
    pub async fn list_movies(
        &self,
        page: u32,
        limit: u32,
        search: Option<&str>,
        cancel: &CancelToken,
    ) -> Result<MovieList, ClientError> {
        let mut url = format!("{}/movies?page={page}&limit={limit}", self.base_url);
        if let Some(term) = search
            && !term.is_empty()
        {
            url.push_str(&format!("&search={}", urlencoding::encode(term)));
        }

        let body = exchange(cancel, self.client.get(&url)).await?;
        decode(&body)
    }

    /// GET /movies/{id}. A missing movie is `Ok(None)`, not an error.
    pub async fn get_movie(
        &self,
        id: i64,
        cancel: &CancelToken,
    ) -> Result<Option<Movie>, ClientError> {
        let url = format!("{}/movies/{id}", self.base_url);

        match exchange(cancel, self.client.get(&url)).await {
            Ok(body) => Ok(Some(decode(&body)?)),
            Err(ClientError::Status { status, .. }) if status == StatusCode::NOT_FOUND => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// POST /movies: multipart create. Scalar fields plus JSON-stringified
    /// id arrays for genres and actors, plus the raw poster file if one was
    /// chosen.
    pub async fn create_movie(
        &self,
        access_token: &str,
        movie: &NewMovie,
        cancel: &CancelToken,
    ) -> Result<(), ClientError> {
        let url = format!("{}/movies", self.base_url);

        let genres =
            serde_json::to_string(&movie.genres).map_err(|e| ClientError::Decode(e.to_string()))?;
        let actors =
            serde_json::to_string(&movie.actors).map_err(|e| ClientError::Decode(e.to_string()))?;

        let mut form = Form::new()
            .text("title", movie.title.clone())
            .text("release_year", movie.release_year.to_string())
            .text("duration", movie.duration.to_string())
            .text("description", movie.description.clone())
            .text("trailer_url", movie.trailer_url.clone().unwrap_or_default())
            .text("genres", genres)
            .text("actors", actors);

        if let Some(poster) = &movie.poster {
            let mime = mime_guess::from_path(&poster.file_name).first_or_octet_stream();
            let part = Part::bytes(poster.bytes.clone())
                .file_name(poster.file_name.clone())
                .mime_str(mime.as_ref())
                .map_err(|e| ClientError::Decode(e.to_string()))?;
            form = form.part("poster", part);
        }

        let request = self
            .client
            .post(&url)
            .bearer_auth(access_token)
            .multipart(form);

        exchange(cancel, request).await?;
        info!(title = %movie.title, "Created movie");
        Ok(())
    }

    /// DELETE /movies/{id}
    pub async fn delete_movie(
        &self,
        access_token: &str,
        id: i64,
        cancel: &CancelToken,
    ) -> Result<(), ClientError> {
        let url = format!("{}/movies/{id}", self.base_url);
        let request = self.client.delete(&url).bearer_auth(access_token);

        exchange(cancel, request).await?;
        info!(id, "Deleted movie");
        Ok(())
    }

    /// GET /actors: populate the selection list on the create form.
    pub async fn list_actors(&self, cancel: &CancelToken) -> Result<Vec<Actor>, ClientError> {
        let url = format!("{}/actors", self.base_url);
        let body = exchange(cancel, self.client.get(&url)).await?;
        let envelope: ListEnvelope<Actor> = decode(&body)?;
        Ok(envelope.data)
    }

    /// GET /genres
    pub async fn list_genres(&self, cancel: &CancelToken) -> Result<Vec<Genre>, ClientError> {
        let url = format!("{}/genres", self.base_url);
        let body = exchange(cancel, self.client.get(&url)).await?;
        let envelope: ListEnvelope<Genre> = decode(&body)?;
        Ok(envelope.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> CatalogClient {
        CatalogClient::new(reqwest::Client::new(), "http://catalog.test")
    }

    #[test]
    fn test_asset_url_joins_relative_paths() {
        let client = test_client();
        assert_eq!(
            client.asset_url("/uploads/poster.jpg"),
            "http://catalog.test/uploads/poster.jpg"
        );
    }

    #[test]
    fn test_asset_url_passes_absolute_urls_through() {
        let client = test_client();
        assert_eq!(
            client.asset_url("https://cdn.example.com/p.jpg"),
            "https://cdn.example.com/p.jpg"
        );
    }
}
