//! Demo inventory used by `marquee seed` and by tests.

use marquee_core::domain::movie::{Movie, MovieId};
use marquee_core::domain::showtime::{SeatCount, ShowId, Showtime};
use marquee_core::store::{Inventory, StoreError};
use thiserror::Error;
use tracing::info;

/// Movie id, name, genre, location.
const MOVIES: &[(&str, &str, &str, &str)] = &[
    ("M1", "Inception", "Sci-Fi", "Delhi"),
    ("M2", "Jawan", "Action", "Delhi"),
    ("M3", "Interstellar", "Sci-Fi", "Mumbai"),
    ("M4", "Kantara", "Thriller", "Bengaluru"),
    ("M5", "3 Idiots", "Comedy", "Bengaluru"),
];

/// Movie id, show id, time, theatre, available, total.
const SHOWTIMES: &[(&str, &str, &str, &str, u32, u32)] = &[
    ("M1", "S1", "10:00 AM", "PVR Select City Saket", 40, 40),
    ("M1", "S2", "07:30 PM", "INOX Nehru Place", 2, 60),
    ("M2", "S3", "01:15 PM", "PVR Plaza Connaught Place", 25, 30),
    ("M3", "S4", "11:00 AM", "PVR Phoenix Lower Parel", 80, 120),
    ("M3", "S5", "09:45 PM", "Cinepolis Andheri", 0, 90),
    ("M4", "S6", "06:00 PM", "PVR Forum Koramangala", 55, 70),
    ("M5", "S7", "03:30 PM", "INOX Garuda Mall", 12, 50),
];

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("inventory already holds {movies} movies; pass --force to overwrite")]
    AlreadySeeded { movies: usize },
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedResult {
    pub movies: usize,
    pub showtimes: usize,
    pub replaced: usize,
}

pub struct DemoDataset;

impl DemoDataset {
    pub fn movies() -> Vec<Movie> {
        MOVIES
            .iter()
            .map(|(movie_id, name, genre, location)| Movie {
                movie_id: MovieId((*movie_id).to_string()),
                name: (*name).to_string(),
                genre: (*genre).to_string(),
                location: (*location).to_string(),
                showtimes: SHOWTIMES
                    .iter()
                    .filter(|showtime| showtime.0 == *movie_id)
                    .map(|(_, show_id, time, theatre, available, total)| Showtime {
                        show_id: ShowId((*show_id).to_string()),
                        time: (*time).to_string(),
                        theatre_name: (*theatre).to_string(),
                        seats: SeatCount::new(*available, *total),
                    })
                    .collect(),
            })
            .collect()
    }

    /// Writes the demo inventory. Existing data is only replaced with `force`.
    pub async fn seed(inventory: &Inventory, force: bool) -> Result<SeedResult, SeedError> {
        let result = inventory
            .update(|movies| -> Result<SeedResult, SeedError> {
                if !movies.is_empty() && !force {
                    return Err(SeedError::AlreadySeeded { movies: movies.len() });
                }

                let replaced = movies.len();
                *movies = Self::movies();
                Ok(SeedResult { movies: MOVIES.len(), showtimes: SHOWTIMES.len(), replaced })
            })
            .await?;

        info!(
            event_name = "store.seeded",
            movies = result.movies,
            showtimes = result.showtimes,
            replaced = result.replaced,
            "demo inventory written"
        );
        Ok(result)
    }
}
