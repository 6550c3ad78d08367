use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Genre {
    Action,
    Adventure,
    Comedy,
    Drama,
    Fantasy,
    Horror,
    Thriller,
    #[serde(rename = "Sci-fi")]
    SciFi,
}

impl Genre {
    pub const ALL: [Genre; 8] = [
        Genre::Action,
        Genre::Adventure,
        Genre::Comedy,
        Genre::Drama,
        Genre::Fantasy,
        Genre::Horror,
        Genre::Thriller,
        Genre::SciFi,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Genre::Action => "Action",
            Genre::Adventure => "Adventure",
            Genre::Comedy => "Comedy",
            Genre::Drama => "Drama",
            Genre::Fantasy => "Fantasy",
            Genre::Horror => "Horror",
            Genre::Thriller => "Thriller",
            Genre::SciFi => "Sci-fi",
        }
    }

    /// Exact, case-sensitive lookup by wire name.
    pub fn from_name(name: &str) -> Option<Genre> {
        Genre::ALL.iter().copied().find(|g| g.as_str() == name)
    }

    pub fn matches(self, filter: &str) -> bool {
        self.as_str().to_lowercase() == filter.to_lowercase()
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A movie that has passed full validation but has no id yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMovie {
    pub title: String,
    pub year: u16,
    pub director: String,
    pub duration: u64,
    /// Kept as the client sent it, so `8` is echoed as `8` and `8.5` as `8.5`.
    pub rate: Number,
    pub poster: String,
    pub genre: Vec<Genre>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Movie {
    pub id: String,
    pub title: String,
    pub year: u16,
    pub director: String,
    pub duration: u64,
    pub rate: Number,
    pub poster: String,
    pub genre: Vec<Genre>,
}

/// Validated subset of fields for a partial update. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoviePatch {
    pub title: Option<String>,
    pub year: Option<u16>,
    pub director: Option<String>,
    pub duration: Option<u64>,
    pub rate: Option<Number>,
    pub poster: Option<String>,
    pub genre: Option<Vec<Genre>>,
}

impl Movie {
    pub fn new(id: String, movie: NewMovie) -> Movie {
        Movie {
            id,
            title: movie.title,
            year: movie.year,
            director: movie.director,
            duration: movie.duration,
            rate: movie.rate,
            poster: movie.poster,
            genre: movie.genre,
        }
    }

    pub fn has_genre(&self, filter: &str) -> bool {
        self.genre.iter().any(|g| g.matches(filter))
    }

    /// Shallow merge: fields set in the patch overwrite, the rest are kept.
    pub fn merged(self, patch: MoviePatch) -> Movie {
        Movie {
            id: self.id,
            title: patch.title.unwrap_or(self.title),
            year: patch.year.unwrap_or(self.year),
            director: patch.director.unwrap_or(self.director),
            duration: patch.duration.unwrap_or(self.duration),
            rate: patch.rate.unwrap_or(self.rate),
            poster: patch.poster.unwrap_or(self.poster),
            genre: patch.genre.unwrap_or(self.genre),
        }
    }
}
