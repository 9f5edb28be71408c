//! Migrate command handler

use super::utils::{load_records, write_records};
use crate::cli::MigrateArgs;
use crate::config::Config;
use crate::error::Result;
use crate::logging::timing::Timer;
use crate::output::{format_value_compact, OutputWriter};
use serde_json::Value;

/// Handle the migrate command
///
/// A file holding a JSON array is migrated as a batch, which stops at the
/// first record that cannot be migrated; anything else is a single record.
pub async fn handle_migrate(
    args: MigrateArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    let registry = config.registry()?;
    let (from, to) = (args.from, args.to);
    let _timer = Timer::with_details("migrate", &format!("{}->{}", from, to));

    output.info(&format!("Migrating {} from {} to {}", args.input.display(), from, to))?;
    let input = load_records(&args.input)?;

    if from != to && !registry.compatibility().are_versions_compatible(from, to) {
        output.warning(&format!(
            "{} -> {} is a downgrade; fields introduced after {} may not survive",
            from, to, to
        ))?;
    }

    let migrated = match input {
        Value::Array(items) => {
            let count = items.len();
            let migrated = registry.batch_migrate_data(items, from, to)?;
            output.success(&format!("✓ Migrated {} record(s)", count))?;
            Value::Array(migrated)
        }
        record => {
            let migrated = registry.migrate_data(record, from, to)?;
            output.success("✓ Migrated 1 record")?;
            migrated
        }
    };

    match &args.save_to {
        Some(path) => {
            write_records(path, &migrated)?;
            output.success(&format!("✓ Saved migrated records to {}", path.display()))?;
            output.field("Result", &format_value_compact(&migrated))?;
        }
        None => output.data(&migrated)?,
    }

    Ok(())
}
