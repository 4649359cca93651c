use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, Row};

use marquee_core::domain::movie::{Movie, MovieId};
use marquee_core::domain::showtime::{SeatCount, ShowId, Showtime};
use marquee_core::store::{InventoryStore, StoreError};

use crate::DbPool;

/// Inventory in the `movie` and `showtime` tables. Row order follows the
/// `position` columns, so a reload returns movies in the order committed.
pub struct SqlInventoryStore {
    pool: DbPool,
}

impl SqlInventoryStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

pub(crate) fn database_error(error: sqlx::Error) -> StoreError {
    StoreError::Database(error.to_string())
}

#[async_trait]
impl InventoryStore for SqlInventoryStore {
    async fn load_all(&self) -> Result<Vec<Movie>, StoreError> {
        let movie_rows = sqlx::query(
            "SELECT movie_id, name, genre, location
             FROM movie
             ORDER BY position",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        let showtime_rows = sqlx::query(
            "SELECT s.movie_id, s.show_id, s.time, s.theatre_name, s.seats_available, s.seats_total
             FROM showtime s
             JOIN movie m ON m.movie_id = s.movie_id
             ORDER BY m.position, s.position",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        let mut movies = movie_rows.iter().map(movie_from_row).collect::<Result<Vec<_>, _>>()?;
        for row in &showtime_rows {
            let movie_id: String = row.try_get("movie_id").map_err(database_error)?;
            let showtime = showtime_from_row(row)?;
            let owner = movies.iter_mut().find(|movie| movie.movie_id.0 == movie_id).ok_or_else(
                || StoreError::Decode(format!("showtime {} has no movie", showtime.show_id)),
            )?;
            owner.showtimes.push(showtime);
        }

        Ok(movies)
    }

    async fn commit(&self, movies: &[Movie]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(database_error)?;

        sqlx::query("DELETE FROM showtime").execute(&mut *tx).await.map_err(database_error)?;
        sqlx::query("DELETE FROM movie").execute(&mut *tx).await.map_err(database_error)?;

        for (movie_position, movie) in movies.iter().enumerate() {
            sqlx::query(
                "INSERT INTO movie (movie_id, position, name, genre, location)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(&movie.movie_id.0)
            .bind(position(movie_position)?)
            .bind(&movie.name)
            .bind(&movie.genre)
            .bind(&movie.location)
            .execute(&mut *tx)
            .await
            .map_err(database_error)?;

            for (showtime_position, showtime) in movie.showtimes.iter().enumerate() {
                sqlx::query(
                    "INSERT INTO showtime
                        (show_id, movie_id, position, time, theatre_name, seats_available, seats_total)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                )
                .bind(&showtime.show_id.0)
                .bind(&movie.movie_id.0)
                .bind(position(showtime_position)?)
                .bind(&showtime.time)
                .bind(&showtime.theatre_name)
                .bind(i64::from(showtime.seats.available))
                .bind(i64::from(showtime.seats.total))
                .execute(&mut *tx)
                .await
                .map_err(database_error)?;
            }
        }

        tx.commit().await.map_err(database_error)?;
        Ok(())
    }
}

fn position(index: usize) -> Result<i64, StoreError> {
    i64::try_from(index).map_err(|_| StoreError::Decode(format!("position {index} overflows")))
}

fn movie_from_row(row: &SqliteRow) -> Result<Movie, StoreError> {
    Ok(Movie {
        movie_id: MovieId(row.try_get("movie_id").map_err(database_error)?),
        name: row.try_get("name").map_err(database_error)?,
        genre: row.try_get("genre").map_err(database_error)?,
        location: row.try_get("location").map_err(database_error)?,
        showtimes: Vec::new(),
    })
}

fn showtime_from_row(row: &SqliteRow) -> Result<Showtime, StoreError> {
    let show_id: String = row.try_get("show_id").map_err(database_error)?;
    let available = seat_column(row, "seats_available", &show_id)?;
    let total = seat_column(row, "seats_total", &show_id)?;

    Ok(Showtime {
        show_id: ShowId(show_id),
        time: row.try_get("time").map_err(database_error)?,
        theatre_name: row.try_get("theatre_name").map_err(database_error)?,
        seats: SeatCount::new(available, total),
    })
}

fn seat_column(row: &SqliteRow, column: &str, show_id: &str) -> Result<u32, StoreError> {
    let value: i64 = row.try_get(column).map_err(database_error)?;
    u32::try_from(value)
        .map_err(|_| StoreError::Decode(format!("{column} for show {show_id} is out of range: {value}")))
}
