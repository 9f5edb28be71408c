//! Read-only catalog inspection: versions, compatibility and features

use crate::cli::{CompatArgs, FeaturesArgs};
use crate::config::Config;
use crate::error::Result;
use crate::output::{version_row, OutputWriter};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use versa_core::{ApiVersion, MigrationStep};

/// Handle the versions command
pub async fn handle_versions(config: &Config, output: &mut OutputWriter) -> Result<()> {
    let registry = config.registry()?;
    let versions = registry.versions();
    let default = registry.default_version();

    if !output.is_human() {
        let entries: Vec<_> = versions.iter().collect();
        return output.data(&json!({ "default": default, "versions": entries }));
    }

    output.section("API Versions")?;
    let rows = versions
        .iter()
        .map(|metadata| version_row(metadata, metadata.version == default))
        .collect();
    output.table(
        &["Version", "Rank", "Supported", "Deprecated", "Deprecated at", "Sunset at"],
        rows,
    )?;

    let now = Utc::now();
    for metadata in versions.iter().filter(|m| m.supported && m.is_sunset_at(now)) {
        output.warning(&format!(
            "{} is past its sunset date and still being served",
            metadata.version
        ))?;
    }

    Ok(())
}

/// Compatibility between two versions
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompatReport {
    from: ApiVersion,
    to: ApiVersion,
    compatible: bool,
    upgrade_path: Vec<ApiVersion>,
    steps: Vec<MigrationStep>,
    direct_transform: bool,
}

/// Handle the compat command
pub async fn handle_compat(
    args: CompatArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    let registry = config.registry()?;
    let resolver = registry.compatibility();

    let report = CompatReport {
        from: args.from,
        to: args.to,
        compatible: resolver.are_versions_compatible(args.from, args.to),
        upgrade_path: resolver.get_upgrade_path(args.from, args.to),
        steps: resolver.migration_steps(args.from, args.to),
        direct_transform: registry.migrations().has_migration(args.from, args.to),
    };

    if !output.is_human() {
        return output.data(&report);
    }

    let verdict = if report.compatible { "yes" } else { "no" };
    output.field(&format!("{} -> {} compatible", report.from, report.to), verdict)?;

    if report.upgrade_path.is_empty() {
        output.field("Upgrade path", "none")?;
    } else {
        let path: Vec<_> = report.upgrade_path.iter().map(|v| v.as_str()).collect();
        output.field("Upgrade path", &path.join(" -> "))?;
    }

    for step in &report.steps {
        let status = if step.has_transform {
            "transform registered"
        } else {
            "no direct transform"
        };
        output.field(&format!("  {} -> {}", step.from, step.to), status)?;
    }

    if !report.compatible && report.direct_transform {
        output.warning(&format!(
            "A {} -> {} transform exists, but downgrades are never treated as compatible",
            report.from, report.to
        ))?;
    }

    Ok(())
}

/// Handle the features command
pub async fn handle_features(
    args: FeaturesArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    let registry = config.registry()?;
    let features = registry.features();

    if let Some(path) = &args.path {
        let enabled = features.has_feature(args.version, path);
        if output.is_human() {
            output.field(path, if enabled { "enabled" } else { "disabled" })?;
            return Ok(());
        }
        return output.data(&json!({ "version": args.version, "path": path, "enabled": enabled }));
    }

    let Some(tree) = features.get_version_features(args.version) else {
        output.warning(&format!("No capability tree registered for {}", args.version))?;
        if !output.is_human() {
            output.data(&json!({ "version": args.version, "enabled": [], "tree": null }))?;
        }
        return Ok(());
    };

    let enabled = features.enabled_features(args.version);
    if !output.is_human() {
        return output.data(&json!({ "version": args.version, "enabled": enabled, "tree": tree }));
    }

    output.section(&format!("Features enabled in {}", args.version))?;
    if enabled.is_empty() {
        output.info("No features enabled")?;
    }
    for path in &enabled {
        output.writeln(&format!("  ✓ {}", path))?;
    }

    Ok(())
}
