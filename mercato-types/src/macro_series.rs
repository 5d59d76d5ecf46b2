use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single dated observation of a macro series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacroObservation {
    /// Observation date.
    pub date: NaiveDate,
    /// Observed value, in `units`.
    pub value: f64,
}

/// Macroeconomic time series (rates, inflation, GDP, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroSeries {
    /// Provider series identifier, upper-cased (e.g. "DGS10").
    pub series_id: String,
    /// Human-readable title.
    pub title: Option<String>,
    /// Units of `value`.
    pub units: Option<String>,
    /// Observations in ascending date order.
    pub observations: Vec<MacroObservation>,
    /// Name of the provider that produced this envelope.
    pub source: String,
}
