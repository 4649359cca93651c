use marquee_db::{DemoDataset, SeedError};

use crate::commands::{
    build_runtime, load_config, open_inventory, store_target, CommandResult, EXIT_SEED_CONFLICT,
    EXIT_STORE,
};

pub fn run(force: bool) -> CommandResult {
    let config = match load_config("seed") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match build_runtime("seed") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let inventory = open_inventory("seed", &config).await?;
        DemoDataset::seed(&inventory, force).await.map_err(|error| match error {
            SeedError::AlreadySeeded { .. } => CommandResult::failure(
                "seed",
                "seed_conflict",
                error.to_string(),
                EXIT_SEED_CONFLICT,
            ),
            SeedError::Store(_) => {
                CommandResult::failure("seed", "store_write", error.to_string(), EXIT_STORE)
            }
        })
    });

    match result {
        Ok(seeded) => {
            let mut message = format!(
                "seeded {} movies and {} showtimes into {}",
                seeded.movies,
                seeded.showtimes,
                store_target(&config)
            );
            if seeded.replaced > 0 {
                message.push_str(&format!(" (replaced {} existing movies)", seeded.replaced));
            }
            CommandResult::success("seed", message)
        }
        Err(failure) => failure,
    }
}
