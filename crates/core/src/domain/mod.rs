pub mod intent;
pub mod movie;
pub mod showtime;
