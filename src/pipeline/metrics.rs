//! Metric extraction: find named numbers in free card text.
//!
//! Each [`MetricSpec`] carries one regex whose first capture group is the
//! value. The first match wins; a metric that does not match is simply left
//! out. Nothing here is an error: a bad pattern or an unparsable capture is
//! reported as a [`Degradation`] and the metric is dropped.

use crate::config::MetricSpec;
use crate::error::Degradation;
use crate::record::Metric;
use regex::Regex;
use tracing::debug;

/// Apply every spec to `text`, keeping at most one metric per name.
pub fn extract_metrics(text: &str, specs: &[MetricSpec]) -> (Vec<Metric>, Vec<Degradation>) {
    let mut metrics: Vec<Metric> = Vec::with_capacity(specs.len());
    let mut degradations = Vec::new();

    for spec in specs {
        if metrics.iter().any(|m| m.name == spec.name) {
            continue;
        }

        let re = match Regex::new(&spec.pattern) {
            Ok(re) => re,
            Err(e) => {
                degradations.push(Degradation::ParseDegradation {
                    what: format!("metric pattern for '{}'", spec.name),
                    detail: e.to_string(),
                });
                continue;
            }
        };

        let Some(caps) = re.captures(text) else {
            debug!("Metric '{}' not found", spec.name);
            continue;
        };
        let raw = caps
            .get(1)
            .or_else(|| caps.get(0))
            .map(|m| m.as_str())
            .unwrap_or_default();

        match raw.parse::<f64>() {
            Ok(value) => metrics.push(Metric {
                name: spec.name.clone(),
                value,
                description: spec.description.clone(),
            }),
            Err(e) => degradations.push(Degradation::ParseDegradation {
                what: format!("value of metric '{}'", spec.name),
                detail: format!("'{raw}': {e}"),
            }),
        }
    }

    (metrics, degradations)
}
