use crate::model::*;
use crate::schema::validate_movie;
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use uuid::Uuid;

/// Seed bundled into the binary, used when no seed file is configured.
pub const BUNDLED_SEED: &str = include_str!("../movies.json");

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("movie store lock poisoned during {0}")]
    LockPoisoned(&'static str),
    #[error("could not read seed file: {0}")]
    SeedIo(#[from] std::io::Error),
    #[error("seed is not valid JSON: {0}")]
    SeedJson(#[from] serde_json::Error),
    #[error("invalid seed: {0}")]
    Seed(String),
}

pub trait MovieDb {
    type Error;
    fn list(&self, genre: Option<&str>) -> Result<Vec<Movie>, Self::Error>;
    fn find(&self, id: &str) -> Result<Option<Movie>, Self::Error>;
    fn insert(&self, movie: NewMovie) -> Result<Movie, Self::Error>;
    fn remove(&self, id: &str) -> Result<bool, Self::Error>;
    /// Merges `patch` over the stored movie and swaps the whole record in place.
    fn replace(&self, id: &str, patch: MoviePatch) -> Result<Option<Movie>, Self::Error>;
}

/// Process-lifetime movie collection behind a single exclusive lock.
#[derive(Debug, Default)]
pub struct MovieStore {
    movies: Mutex<Vec<Movie>>,
}

impl MovieStore {
    pub fn new(movies: Vec<Movie>) -> Self {
        MovieStore {
            movies: Mutex::new(movies),
        }
    }

    pub fn from_seed_file<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let seed = std::fs::read_to_string(path)?;
        Self::from_seed_str(&seed)
    }

    /// Parses a JSON array of movies. Every record must carry a string `id`
    /// and pass full validation; ids must be unique.
    pub fn from_seed_str(seed: &str) -> Result<Self, StoreError> {
        let records: Vec<Value> = serde_json::from_str(seed)?;
        let mut ids = HashSet::new();
        let mut movies = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            let id = record
                .get("id")
                .and_then(Value::as_str)
                .ok_or_else(|| StoreError::Seed(format!("record {} has no string id", index)))?;
            if !ids.insert(id.to_owned()) {
                return Err(StoreError::Seed(format!("duplicate id {}", id)));
            }
            let movie = validate_movie(record).map_err(|errors| {
                let details = errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                StoreError::Seed(format!("record {} ({}): {}", index, id, details))
            })?;
            movies.push(Movie::new(id.to_owned(), movie));
        }
        Ok(Self::new(movies))
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock("len")?.len())
    }

    fn lock(&self, operation: &'static str) -> Result<MutexGuard<'_, Vec<Movie>>, StoreError> {
        self.movies
            .lock()
            .map_err(|_| StoreError::LockPoisoned(operation))
    }
}

fn generate_id(movies: &[Movie]) -> String {
    loop {
        let id = Uuid::new_v4().to_string();
        if !movies.iter().any(|m| m.id == id) {
            return id;
        }
    }
}

impl MovieDb for MovieStore {
    type Error = StoreError;

    fn list(&self, genre: Option<&str>) -> Result<Vec<Movie>, StoreError> {
        let movies = self.lock("list")?;
        Ok(match genre {
            Some(genre) => movies
                .iter()
                .filter(|movie| movie.has_genre(genre))
                .cloned()
                .collect(),
            None => movies.clone(),
        })
    }

    fn find(&self, id: &str) -> Result<Option<Movie>, StoreError> {
        let movies = self.lock("find")?;
        Ok(movies.iter().find(|movie| movie.id == id).cloned())
    }

    fn insert(&self, movie: NewMovie) -> Result<Movie, StoreError> {
        let mut movies = self.lock("insert")?;
        let movie = Movie::new(generate_id(&movies), movie);
        movies.push(movie.clone());
        Ok(movie)
    }

    fn remove(&self, id: &str) -> Result<bool, StoreError> {
        let mut movies = self.lock("remove")?;
        if let Some(index) = movies.iter().position(|movie| movie.id == id) {
            movies.remove(index);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn replace(&self, id: &str, patch: MoviePatch) -> Result<Option<Movie>, StoreError> {
        let mut movies = self.lock("replace")?;
        let index = match movies.iter().position(|movie| movie.id == id) {
            Some(index) => index,
            None => return Ok(None),
        };
        let updated = movies[index].clone().merged(patch);
        movies[index] = updated.clone();
        Ok(Some(updated))
    }
}
