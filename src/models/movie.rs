use serde::{Deserialize, Serialize};

/// Catalog root entity. Actors and genres arrive as embedded objects on
/// reads; writes send lists of numeric ids instead (see [`NewMovie`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// Minutes, string-encoded by the upstream API.
    pub duration: String,
    pub release_year: i32,
    #[serde(default)]
    pub trailer_url: String,
    #[serde(default)]
    pub poster_url: String,
    #[serde(default)]
    pub actors: Vec<Actor>,
    #[serde(default)]
    pub genres: Vec<Genre>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

/// Paginated listing envelope returned by `GET /movies`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieList {
    pub data: Vec<Movie>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    #[serde(rename = "totalPages")]
    pub total_pages: u32,
}

/// A validated create-movie submission, ready to be forwarded upstream as a
/// multipart body. Genre and actor membership is tracked by numeric id for
/// both lists.
#[derive(Debug, Clone)]
pub struct NewMovie {
    pub title: String,
    pub description: String,
    pub duration: u32,
    pub release_year: i32,
    pub trailer_url: Option<String>,
    pub genres: Vec<i64>,
    pub actors: Vec<i64>,
    pub poster: Option<PosterUpload>,
}

/// Raw poster file as received from the browser form.
#[derive(Debug, Clone)]
pub struct PosterUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}
