//! Visualization model and the store that owns it

mod store;

pub use store::{VisualizationStore, ACTIVE_DATA_SOURCE_KEY, DATA_SOURCES_KEY, VISUALIZATIONS_KEY};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::StateError;

/// Chart colour palette. New visualizations take the first entry.
pub const PALETTE: [&str; 6] = [
    "#5b47fb", "#3b82f6", "#10b981", "#f59e0b", "#ef4444", "#8b5cf6",
];

/// Supported chart types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Line,
    Bar,
    Area,
    Pie,
    Metric,
    Table,
}

impl ChartType {
    pub const ALL: [ChartType; 6] = [
        ChartType::Line,
        ChartType::Bar,
        ChartType::Area,
        ChartType::Pie,
        ChartType::Metric,
        ChartType::Table,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Line => "line",
            ChartType::Bar => "bar",
            ChartType::Area => "area",
            ChartType::Pie => "pie",
            ChartType::Metric => "metric",
            ChartType::Table => "table",
        }
    }

    /// Capitalized name used in default titles
    pub fn display_name(&self) -> &'static str {
        match self {
            ChartType::Line => "Line",
            ChartType::Bar => "Bar",
            ChartType::Area => "Area",
            ChartType::Pie => "Pie",
            ChartType::Metric => "Metric",
            ChartType::Table => "Table",
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartType {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        ChartType::ALL
            .into_iter()
            .find(|t| t.as_str() == lowered)
            .ok_or_else(|| StateError::UnknownChartType(s.to_string()))
    }
}

/// Display settings for a visualization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationConfig {
    /// Hex colour (`#rgb` or `#rrggbb`)
    pub color: String,
    pub show_grid: bool,
    pub show_legend: bool,
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            color: PALETTE[0].to_string(),
            show_grid: true,
            show_legend: true,
        }
    }
}

/// A user-configured chart bound to columns of the active data source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visualization {
    pub id: String,

    #[serde(rename = "type")]
    pub chart_type: ChartType,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_axis: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_axis: Option<String>,

    pub config: VisualizationConfig,
}

impl Visualization {
    /// New visualization with a generated id, default title and config, and
    /// no axis mapping
    pub fn new(chart_type: ChartType) -> Self {
        Self {
            id: format!("viz-{}", uuid::Uuid::new_v4().simple()),
            chart_type,
            title: format!("New {} Chart", chart_type.display_name()),
            x_axis: None,
            y_axis: None,
            config: VisualizationConfig::default(),
        }
    }

    pub fn has_axes(&self) -> bool {
        self.x_axis.is_some() && self.y_axis.is_some()
    }
}

/// Partial update merged into an existing visualization.
///
/// `None` leaves a field untouched. For axes, `Some(None)` clears the
/// mapping. The id can never be changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisualizationUpdate {
    pub title: Option<String>,
    pub chart_type: Option<ChartType>,
    pub x_axis: Option<Option<String>>,
    pub y_axis: Option<Option<String>>,
    pub config: Option<VisualizationConfig>,
}

impl VisualizationUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn chart_type(mut self, chart_type: ChartType) -> Self {
        self.chart_type = Some(chart_type);
        self
    }

    pub fn x_axis(mut self, column: impl Into<String>) -> Self {
        self.x_axis = Some(Some(column.into()));
        self
    }

    pub fn y_axis(mut self, column: impl Into<String>) -> Self {
        self.y_axis = Some(Some(column.into()));
        self
    }

    pub fn axes(self, x: impl Into<String>, y: impl Into<String>) -> Self {
        self.x_axis(x).y_axis(y)
    }

    pub fn clear_axes(mut self) -> Self {
        self.x_axis = Some(None);
        self.y_axis = Some(None);
        self
    }

    pub fn config(mut self, config: VisualizationConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Axis columns this update would set
    pub(crate) fn axis_columns(&self) -> impl Iterator<Item = &str> {
        [&self.x_axis, &self.y_axis]
            .into_iter()
            .filter_map(|axis| axis.as_ref().and_then(|a| a.as_deref()))
    }

    pub(crate) fn apply(self, viz: &mut Visualization) {
        if let Some(title) = self.title {
            viz.title = title;
        }
        if let Some(chart_type) = self.chart_type {
            viz.chart_type = chart_type;
        }
        if let Some(x_axis) = self.x_axis {
            viz.x_axis = x_axis;
        }
        if let Some(y_axis) = self.y_axis {
            viz.y_axis = y_axis;
        }
        if let Some(config) = self.config {
            viz.config = config;
        }
    }
}

/// `#rgb` or `#rrggbb`
pub fn is_hex_color(value: &str) -> bool {
    match value.strip_prefix('#') {
        Some(digits) => {
            matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => false,
    }
}
