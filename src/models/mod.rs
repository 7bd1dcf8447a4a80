pub mod movie;
pub mod user;

pub use movie::{Actor, Genre, Movie, MovieList, NewMovie, PosterUpload};
pub use user::{SessionTokens, User};
