//! Movie catalog pages: paginated list, detail, create form, delete.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_sessions::Session;
use tracing::warn;

use super::forms::{FORM_FLASH_KEY, FormFlash, MovieForm};
use super::{AppState, WebError, require_user, views};
use crate::clients::ClientError;
use crate::models::{Actor, Genre, Movie, PosterUpload};
use crate::parser::youtube_embed_url;
use crate::session;

const DEFAULT_LIMIT: u32 = 10;
const MAX_LIMIT: u32 = 100;

#[derive(Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
}

/// GET /dashboard/movies
pub async fn list(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(query): Query<ListQuery>,
) -> Result<Response, WebError> {
    let cancel = state.cancel_token();
    let user = match require_user(&state, &session, &cancel).await? {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect.into_response()),
    };

    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    match state.catalog.list_movies(page, limit, search, &cancel).await {
        Ok(listing) => {
            let table = if listing.data.is_empty() {
                r#"<div class="state">No movies found</div>"#.to_string()
            } else {
                movie_table(&state, &listing.data)
            };

            let body = format!(
                r#"{search_form}
{table}
{pagination}"#,
                search_form = search_form(search),
                pagination = views::pagination(page, listing.total_pages, limit, search),
            );

            Ok(Html(views::page("Movies", Some(&user), &body)).into_response())
        }
        Err(e) => {
            warn!("Failed to list movies: {e}");
            let body = format!(
                r#"{}
<div class="state state-error">Couldn't load movies from the catalog API. Try again in a moment.</div>"#,
                search_form(search)
            );
            Ok((
                StatusCode::BAD_GATEWAY,
                Html(views::page("Movies", Some(&user), &body)),
            )
                .into_response())
        }
    }
}

fn search_form(search: Option<&str>) -> String {
    format!(
        r#"<div style="display:flex;justify-content:space-between;margin-bottom:1rem">
<form method="get" action="/dashboard/movies">
  <input type="text" name="search" placeholder="Search movies..." value="{}">
  <button type="submit">Search</button>
</form>
<a href="/dashboard/movies/create">Add movie</a>
</div>"#,
        views::attr(search.unwrap_or_default())
    )
}

fn movie_table(state: &AppState, movies: &[Movie]) -> String {
    let mut rows = String::new();
    for movie in movies {
        let genres: String = movie
            .genres
            .iter()
            .map(|g| format!(r#"<span class="chip">{}</span> "#, views::esc(&g.name)))
            .collect();

        let mut actors: String = movie
            .actors
            .iter()
            .take(2)
            .map(|a| views::esc(&a.name))
            .collect::<Vec<_>>()
            .join(", ");
        if movie.actors.len() > 2 {
            actors.push_str(&format!(" +{} more", movie.actors.len() - 2));
        }

        rows.push_str(&format!(
            r#"<tr>
  <td><img class="poster-thumb" src="{poster}" alt="{title}"></td>
  <td><a href="/dashboard/movies/{id}">{title}</a></td>
  <td>{year}</td>
  <td>{duration} min</td>
  <td>{genres}</td>
  <td>{actors}</td>
  <td>{delete}</td>
</tr>"#,
            poster = views::attr(&state.catalog.asset_url(&movie.poster_url)),
            title = views::esc(&movie.title),
            id = movie.id,
            year = movie.release_year,
            duration = views::esc(&movie.duration),
            delete = delete_form(movie.id),
        ));
    }

    format!(
        r#"<table>
<thead><tr><th>Poster</th><th>Title</th><th>Year</th><th>Duration</th><th>Genres</th><th>Actors</th><th>Actions</th></tr></thead>
<tbody>{rows}</tbody>
</table>"#
    )
}

fn delete_form(id: i64) -> String {
    format!(
        r#"<form method="post" action="/dashboard/movies/{id}/delete" onsubmit="return confirm('Are you sure you want to delete this movie?')"><button type="submit">Delete</button></form>"#
    )
}

/// GET /dashboard/movies/{id}
pub async fn detail(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<i64>,
) -> Result<Response, WebError> {
    let cancel = state.cancel_token();
    let user = match require_user(&state, &session, &cancel).await? {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect.into_response()),
    };

    match state.catalog.get_movie(id, &cancel).await {
        Ok(Some(movie)) => {
            let body = detail_body(&state, &movie);
            Ok(Html(views::page(&movie.title, Some(&user), &body)).into_response())
        }
        Ok(None) => {
            let body = r#"<div class="state">Movie not found</div>
<p><a href="/dashboard/movies">Back to the movie list</a></p>"#;
            Ok((
                StatusCode::NOT_FOUND,
                Html(views::page("Movie not found", Some(&user), body)),
            )
                .into_response())
        }
        Err(e) => {
            warn!("Failed to fetch movie {id}: {e}");
            let body = r#"<div class="state state-error">Couldn't load this movie from the catalog API.</div>
<p><a href="/dashboard/movies">Back to the movie list</a></p>"#;
            Ok((
                StatusCode::BAD_GATEWAY,
                Html(views::page("Movie", Some(&user), body)),
            )
                .into_response())
        }
    }
}

fn detail_body(state: &AppState, movie: &Movie) -> String {
    let genres: String = movie
        .genres
        .iter()
        .map(|g| format!(r#"<span class="chip">{}</span> "#, views::esc(&g.name)))
        .collect();

    let actors: String = movie
        .actors
        .iter()
        .map(|a| format!("<li>{}</li>", views::esc(&a.name)))
        .collect();

    let trailer = match youtube_embed_url(&movie.trailer_url) {
        Some(embed) => format!(
            r#"<h2>Trailer</h2>
<iframe width="560" height="315" src="{}" title="Trailer" allowfullscreen></iframe>"#,
            views::attr(&embed)
        ),
        None => String::new(),
    };

    format!(
        r#"<p><a href="/dashboard/movies">Back to the movie list</a></p>
<div style="display:flex;gap:1.5rem">
  <img style="width:220px" src="{poster}" alt="{title}">
  <div>
    <p>{year} &middot; {duration} min</p>
    <p>{genres}</p>
    <p>{description}</p>
    <h2>Cast</h2>
    <ul>{actors}</ul>
    {delete}
  </div>
</div>
{trailer}"#,
        poster = views::attr(&state.catalog.asset_url(&movie.poster_url)),
        title = views::esc(&movie.title),
        year = movie.release_year,
        duration = views::esc(&movie.duration),
        description = views::esc(&movie.description),
        delete = delete_form(movie.id),
    )
}

/// GET /dashboard/movies/create
pub async fn create_form(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Response, WebError> {
    let cancel = state.cancel_token();
    let user = match require_user(&state, &session, &cancel).await? {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect.into_response()),
    };

    let flash: Option<FormFlash> = session.remove(FORM_FLASH_KEY).await?;

    // The two selection lists race independently into independent slots; no
    // ordering between them matters.
    let (actors, genres) = tokio::join!(
        state.catalog.list_actors(&cancel),
        state.catalog.list_genres(&cancel),
    );

    let (actors, genres) = match (actors, genres) {
        (Ok(actors), Ok(genres)) => (actors, genres),
        (actors, genres) => {
            if let Err(e) = &actors {
                warn!("Failed to fetch actors: {e}");
            }
            if let Err(e) = &genres {
                warn!("Failed to fetch genres: {e}");
            }
            let body = r#"<div class="state state-error">Couldn't load the actor and genre lists; the form can't be shown.</div>
<p><a href="/dashboard/movies/create">Try again</a></p>"#;
            return Ok((
                StatusCode::BAD_GATEWAY,
                Html(views::page("Add movie", Some(&user), body)),
            )
                .into_response());
        }
    };

    let flash = flash.unwrap_or_else(|| FormFlash {
        values: MovieForm::prefilled(),
        ..FormFlash::default()
    });

    let body = create_form_body(&flash, &actors, &genres);
    Ok(Html(views::page("Add movie", Some(&user), &body)).into_response())
}

fn checkbox_group(
    name: &str,
    options: &[(i64, &str)],
    selected: &[i64],
    error: Option<&str>,
) -> String {
    let mut boxes = String::new();
    for (id, label) in options {
        let checked = if selected.contains(id) { " checked" } else { "" };
        boxes.push_str(&format!(
            r#"<label><input type="checkbox" name="{name}" value="{id}"{checked}> {label}</label> "#,
            name = views::attr(name),
            label = views::esc(label),
        ));
    }

    let error_html = error.map_or(String::new(), |e| {
        format!(r#"<p class="field-error">{}</p>"#, views::esc(e))
    });

    format!(r#"<div class="field">{boxes}{error_html}</div>"#)
}

fn create_form_body(flash: &FormFlash, actors: &[Actor], genres: &[Genre]) -> String {
    let values = &flash.values;
    let errors = &flash.errors;
    let err = |key: &str| errors.get(key).map(String::as_str);

    let banner = flash.banner.as_deref().map_or(String::new(), |msg| {
        format!(r#"<div class="banner-error">{}</div>"#, views::esc(msg))
    });

    let genre_options: Vec<(i64, &str)> = genres.iter().map(|g| (g.id, g.name.as_str())).collect();
    let actor_options: Vec<(i64, &str)> = actors.iter().map(|a| (a.id, a.name.as_str())).collect();

    format!(
        r#"<p><a href="/dashboard/movies">Back to the movie list</a></p>
{banner}
<form method="post" action="/dashboard/movies/create" enctype="multipart/form-data">
  {title}
  {description}
  {duration}
  {release_year}
  {trailer_url}
  <h2>Genres</h2>
  {genres}
  <h2>Actors</h2>
  {actors}
  <div class="field">
    <label for="poster">Poster</label>
    <input type="file" id="poster" name="poster" accept="image/*">
  </div>
  <button type="submit">Save movie</button>
</form>"#,
        title = views::text_field("Title", "title", &values.title, "text", err("title")),
        description = views::text_field(
            "Description",
            "description",
            &values.description,
            "text",
            err("description")
        ),
        duration = views::text_field(
            "Duration (minutes)",
            "duration",
            &values.duration,
            "number",
            err("duration")
        ),
        release_year = views::text_field(
            "Release year",
            "release_year",
            &values.release_year,
            "number",
            err("release_year")
        ),
        trailer_url = views::text_field(
            "Trailer URL",
            "trailer_url",
            &values.trailer_url,
            "url",
            err("trailer_url")
        ),
        genres = checkbox_group("genres", &genre_options, &values.genres, err("genres")),
        actors = checkbox_group("actors", &actor_options, &values.actors, err("actors")),
    )
}

/// POST /dashboard/movies/create
///
/// Invalid input never reaches the network: the entered values and the
/// field-keyed error map are stashed in the session and the browser is sent
/// back to the form.
pub async fn create_submit(
    State(state): State<Arc<AppState>>,
    session: Session,
    multipart: Multipart,
) -> Result<Response, WebError> {
    let cancel = state.cancel_token();
    if let Err(redirect) = require_user(&state, &session, &cancel).await? {
        return Ok(redirect.into_response());
    }

    let token = session::access_token(&session)
        .await?
        .ok_or(WebError::Upstream(ClientError::MissingCredential))?;

    let form = read_movie_form(multipart).await?;

    let movie = match form.validated() {
        Ok(movie) => movie,
        Err(errors) => {
            let flash = FormFlash {
                values: form,
                errors,
                banner: None,
            };
            session.insert(FORM_FLASH_KEY, &flash).await?;
            return Ok(Redirect::to("/dashboard/movies/create").into_response());
        }
    };

    match state.catalog.create_movie(&token, &movie, &cancel).await {
        Ok(()) => Ok(Redirect::to("/dashboard/movies").into_response()),
        Err(ClientError::Status { status, .. }) if status == StatusCode::UNAUTHORIZED => {
            Err(WebError::Upstream(ClientError::Status {
                status,
                body: String::new(),
            }))
        }
        Err(e) => {
            warn!("Failed to create movie: {e}");
            let flash = FormFlash {
                values: form,
                errors: BTreeMap::new(),
                banner: Some("Failed to create the movie. Please try again.".to_string()),
            };
            session.insert(FORM_FLASH_KEY, &flash).await?;
            Ok(Redirect::to("/dashboard/movies/create").into_response())
        }
    }
}

async fn read_movie_form(mut multipart: Multipart) -> Result<MovieForm, WebError> {
    let mut form = MovieForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| WebError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => form.title = field_text(field).await?,
            "description" => form.description = field_text(field).await?,
            "duration" => form.duration = field_text(field).await?,
            "release_year" => form.release_year = field_text(field).await?,
            "trailer_url" => form.trailer_url = field_text(field).await?,
            "genres" => form.genres.extend(field_text(field).await?.trim().parse::<i64>().ok()),
            "actors" => form.actors.extend(field_text(field).await?.trim().parse::<i64>().ok()),
            "poster" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| WebError::BadRequest(e.to_string()))?;
                if !file_name.is_empty() && !bytes.is_empty() {
                    form.poster = Some(PosterUpload {
                        file_name,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

async fn field_text(field: axum::extract::multipart::Field<'_>) -> Result<String, WebError> {
    field
        .text()
        .await
        .map_err(|e| WebError::BadRequest(e.to_string()))
}

/// POST /dashboard/movies/{id}/delete. The confirmation happens in the
/// browser; by the time this handler runs the operator already said yes.
pub async fn delete(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<i64>,
) -> Result<Response, WebError> {
    let cancel = state.cancel_token();
    if let Err(redirect) = require_user(&state, &session, &cancel).await? {
        return Ok(redirect.into_response());
    }

    let token = session::access_token(&session)
        .await?
        .ok_or(WebError::Upstream(ClientError::MissingCredential))?;

    state.catalog.delete_movie(&token, id, &cancel).await?;

    Ok(Redirect::to("/dashboard/movies").into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkbox_group_marks_selected_ids() {
        let html = checkbox_group(
            "genres",
            &[(1, "Drama"), (2, "Sci-Fi")],
            &[2],
            None,
        );
        assert!(html.contains(r#"value="2" checked"#));
        assert!(!html.contains(r#"value="1" checked"#));
    }

    #[test]
    fn test_checkbox_group_renders_error() {
        let html = checkbox_group("actors", &[(1, "Amy Adams")], &[], Some("Select at least one actor"));
        assert!(html.contains("Select at least one actor"));
    }
}
