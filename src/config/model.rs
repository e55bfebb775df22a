// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::exec::RetryPolicy;

/// Top-level configuration as read from a TOML file:
///
/// ```toml
/// [pipeline]
/// name = "product_status"
/// view = "v_product_status_track"
/// max_retries = 1
/// retry_delay = "5s"
/// fail_fast = false
///
/// [source]
/// orders = "/tmp/orders_{ts}.csv"
/// order_items = "/tmp/order_items_{ts}.csv"
/// products = "/tmp/products_{ts}.csv"
/// ```
///
/// The `[pipeline]` section is optional and has reasonable defaults; the
/// `[source]` section is required since the extract locations cannot be
/// guessed. A `{ts}` placeholder in a source path is replaced with the run's
/// logical timestamp.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub pipeline: PipelineSection,

    pub source: SourceSection,
}

/// `[pipeline]` section: view name and retry/failure policy.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSection {
    /// Pipeline name, used in logs only.
    #[serde(default = "default_name")]
    pub name: String,

    /// Name of the denormalized view to (re)build.
    #[serde(default = "default_view")]
    pub view: String,

    /// Additional attempts after a node's first failure.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Fixed delay between attempts, e.g. `"500ms"`, `"5s"`, `"1m"`.
    #[serde(default = "default_retry_delay")]
    pub retry_delay: String,

    /// Abort all later layers once any node terminally fails.
    #[serde(default)]
    pub fail_fast: bool,
}

fn default_name() -> String {
    "product_status".to_string()
}

fn default_view() -> String {
    "v_product_status_track".to_string()
}

fn default_max_retries() -> u32 {
    1
}

fn default_retry_delay() -> String {
    "5s".to_string()
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            name: default_name(),
            view: default_view(),
            max_retries: default_max_retries(),
            retry_delay: default_retry_delay(),
            fail_fast: false,
        }
    }
}

impl PipelineSection {
    /// Build the executor policy from this section.
    ///
    /// `retry_delay` is kept as a string in the model (so serde stays dumb)
    /// and parsed here; [`crate::config::validate`] guarantees it parses for
    /// validated configs.
    pub fn retry_policy(&self) -> Result<RetryPolicy, String> {
        Ok(RetryPolicy {
            max_retries: self.max_retries,
            retry_delay: parse_duration(&self.retry_delay)?,
            fail_fast: self.fail_fast,
        })
    }
}

/// `[source]` section: one extract path per staged record set.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceSection {
    pub orders: String,
    pub order_items: String,
    pub products: String,
}

/// Parse duration strings of the form `<number><unit>` with units
/// `ms`, `s`, `m`, `h`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let split = s
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| format!("duration '{s}' is missing a unit (ms/s/m/h)"))?;

    let (digits, unit) = s.split_at(split);
    let value: u64 = digits
        .parse()
        .map_err(|_| format!("invalid duration value in '{s}'"))?;

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => Ok(Duration::from_secs(value * 60)),
        "h" => Ok(Duration::from_secs(value * 60 * 60)),
        other => Err(format!("unknown duration unit '{other}' in '{s}'")),
    }
}
