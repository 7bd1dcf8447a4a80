pub mod trailer;

pub use trailer::youtube_embed_url;
