use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::movie::{MovieId, MovieSummary};
use crate::domain::showtime::Showtime;
use crate::errors::ApplicationError;
use crate::store::Inventory;

pub const SHOWTIMES_NOT_FOUND: &str = "no showtimes found";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieListing {
    pub movies: Vec<MovieSummary>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowtimeListing {
    pub movie_id: MovieId,
    pub name: String,
    pub location: String,
    pub showtimes: Vec<Showtime>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShowtimeLookup {
    Found(ShowtimeListing),
    NotFound,
}

/// Read-only queries over the inventory.
#[derive(Clone)]
pub struct CatalogService {
    inventory: Arc<Inventory>,
}

impl CatalogService {
    pub fn new(inventory: Arc<Inventory>) -> Self {
        Self { inventory }
    }

    pub async fn list_movies(&self, location: &str) -> Result<MovieListing, ApplicationError> {
        let movies = self.inventory.snapshot().await?;
        let movies = movies
            .iter()
            .filter(|movie| movie.is_in(location))
            .map(|movie| movie.summary())
            .collect::<Vec<_>>();

        debug!(location, matches = movies.len(), "listed movies");
        Ok(MovieListing { movies })
    }

    /// First movie (in store order) whose name and location match.
    pub async fn get_showtimes(
        &self,
        movie_name: &str,
        location: &str,
    ) -> Result<ShowtimeLookup, ApplicationError> {
        let movies = self.inventory.snapshot().await?;
        let lookup = movies
            .into_iter()
            .find(|movie| movie.matches(movie_name, location))
            .map(|movie| {
                ShowtimeLookup::Found(ShowtimeListing {
                    movie_id: movie.movie_id,
                    name: movie.name,
                    location: movie.location,
                    showtimes: movie.showtimes,
                })
            })
            .unwrap_or(ShowtimeLookup::NotFound);

        debug!(
            movie_name,
            location,
            found = matches!(lookup, ShowtimeLookup::Found(_)),
            "looked up showtimes"
        );
        Ok(lookup)
    }
}
