use crate::commands::CommandResult;
use snapshop_core::config::{AppConfig, LoadOptions};
use snapshop_db::{connect, migrations, DemoSeedDataset};

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let seed_result = DemoSeedDataset::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let verification = DemoSeedDataset::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        let run_result: Result<SeedOutput, (&'static str, String, u8)> =
            if !verification.all_present {
                Err(("seed_verification", verification_failure_message(&verification.checks), 6u8))
            } else {
                Ok(SeedOutput {
                    users_seeded: seed_result.users_seeded,
                    line_items_seeded: seed_result.line_items_seeded,
                })
            };

        pool.close().await;
        run_result
    });

    match result {
        Ok(output) => {
            let message = if output.users_seeded == 0 && output.line_items_seeded == 0 {
                format!(
                    "demo dataset already present; sign in as `{}` / `{}`",
                    snapshop_db::fixtures::DEMO_USERNAME,
                    snapshop_db::fixtures::DEMO_PASSWORD,
                )
            } else {
                format!(
                    "demo dataset loaded ({} user, {} collection items); sign in as `{}` / `{}`",
                    output.users_seeded,
                    output.line_items_seeded,
                    snapshop_db::fixtures::DEMO_USERNAME,
                    snapshop_db::fixtures::DEMO_PASSWORD,
                )
            };
            CommandResult::success("seed", message)
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

struct SeedOutput {
    users_seeded: u32,
    line_items_seeded: u32,
}

fn verification_failure_message(checks: &[(&'static str, bool)]) -> String {
    let failed_checks =
        checks.iter().filter_map(|(check, passed)| (!passed).then_some(*check)).collect::<Vec<_>>();

    if failed_checks.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for checks: {}", failed_checks.join(", "))
    }
}
