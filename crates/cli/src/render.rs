//! Console rendering of dispatch results.

use marquee_core::dispatch::DispatchResult;

pub fn render(result: &DispatchResult) -> String {
    match result {
        DispatchResult::Movies(listing) => {
            if listing.movies.is_empty() {
                return "🎬 No movies found.".to_string();
            }
            let mut lines = vec!["🎬 Movies:".to_string()];
            lines.extend(listing.movies.iter().map(|movie| {
                format!(
                    "- {} ({}) [{}] in {}",
                    movie.name, movie.genre, movie.movie_id.0, movie.location
                )
            }));
            lines.join("\n")
        }
        DispatchResult::Showtimes(listing) => {
            if listing.showtimes.is_empty() {
                return "🎭 No showtimes found.".to_string();
            }
            let mut lines = vec!["🎭 Showtimes:".to_string()];
            lines.extend(listing.showtimes.iter().map(|showtime| {
                format!(
                    "- [{}] {} @ {}  — seats {}/{}",
                    showtime.show_id,
                    showtime.time,
                    showtime.theatre_name,
                    showtime.seats.available,
                    showtime.seats.total
                )
            }));
            lines.join("\n")
        }
        DispatchResult::Booked(receipt) => {
            format!("✅ {} ({} seats left)", receipt.message, receipt.remaining)
        }
        DispatchResult::Rejected { error } => format!("❌ {error}"),
        DispatchResult::Failed { error, attempts, last_error } => {
            format!("❌ {error} ({attempts} attempts, last error: {last_error})")
        }
    }
}
