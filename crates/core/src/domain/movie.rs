use serde::{Deserialize, Serialize};

use crate::domain::showtime::Showtime;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovieId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    pub movie_id: MovieId,
    pub name: String,
    pub genre: String,
    pub location: String,
    #[serde(default)]
    pub showtimes: Vec<Showtime>,
}

impl Movie {
    pub fn is_in(&self, location: &str) -> bool {
        eq_ignore_case(&self.location, location)
    }

    pub fn matches(&self, name: &str, location: &str) -> bool {
        eq_ignore_case(&self.name, name) && self.is_in(location)
    }

    pub fn summary(&self) -> MovieSummary {
        MovieSummary {
            movie_id: self.movie_id.clone(),
            name: self.name.clone(),
            genre: self.genre.clone(),
            location: self.location.clone(),
        }
    }
}

/// Movie projection without its showtimes, as returned by catalog listings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieSummary {
    pub movie_id: MovieId,
    pub name: String,
    pub genre: String,
    pub location: String,
}

pub(crate) fn eq_ignore_case(left: &str, right: &str) -> bool {
    left.to_lowercase() == right.to_lowercase()
}
