// src/config/validate.rs

use anyhow::{Context, Result, anyhow};

use crate::config::model::ConfigFile;

/// Run semantic validation against a loaded configuration.
///
/// This checks:
/// - the view name is non-empty
/// - `max_retries` stays within a sane bound
/// - `retry_delay` parses as a duration string
/// - every source path is non-empty
///
/// Graph-level invariants (unknown dependencies, cycles) are validated on the
/// built `TaskGraph`, not here.
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    validate_pipeline(cfg)?;
    validate_sources(cfg)?;
    Ok(())
}

fn validate_pipeline(cfg: &ConfigFile) -> Result<()> {
    if cfg.pipeline.view.trim().is_empty() {
        return Err(anyhow!("[pipeline].view must not be empty"));
    }

    // An hourly pipeline retrying hundreds of times would overlap its own
    // next run; treat that as a configuration mistake.
    if cfg.pipeline.max_retries > 100 {
        return Err(anyhow!(
            "[pipeline].max_retries = {} is unreasonably large",
            cfg.pipeline.max_retries
        ));
    }

    cfg.pipeline
        .retry_policy()
        .map_err(|e| anyhow!(e))
        .context("invalid [pipeline].retry_delay")?;

    Ok(())
}

fn validate_sources(cfg: &ConfigFile) -> Result<()> {
    let sources = [
        ("orders", &cfg.source.orders),
        ("order_items", &cfg.source.order_items),
        ("products", &cfg.source.products),
    ];
    for (name, path) in sources {
        if path.trim().is_empty() {
            return Err(anyhow!("[source].{name} must not be empty"));
        }
    }
    Ok(())
}
