//! Chart data preparation for dashboard visualizations
//!
//! Turns a [`Visualization`] plus its filtered rows into the data a chart
//! renderer draws. Axes are checked here, against the columns the rows
//! actually have; a visualization whose axes are missing or stale renders
//! as [`ChartData::Unconfigured`] instead of failing.

mod axes;
pub mod plots;
pub mod tables;

pub use axes::{resolve_axes, Axes};
pub use plots::{MetricValue, PieSlice, SeriesData, SeriesPoint};
pub use tables::TableData;

use dash_core::{ChartType, Row, Visualization};
use serde::Serialize;
use tracing::debug;

/// Rows considered by any chart
pub const MAX_CHART_ROWS: usize = 20;

/// Slices drawn by a pie chart
pub const MAX_PIE_SLICES: usize = 6;

/// Renderable data for one visualization
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ChartData {
    /// Axes are not set or name columns the data does not have
    Unconfigured,
    /// Line, bar and area charts
    Series(SeriesData),
    Pie { slices: Vec<PieSlice> },
    Metric(MetricValue),
    Table(TableData),
}

impl ChartData {
    pub fn is_configured(&self) -> bool {
        !matches!(self, ChartData::Unconfigured)
    }
}

/// Prepare chart data for `viz` from already filtered `rows`
pub fn chart_data(viz: &Visualization, rows: &[Row], columns: &[String]) -> ChartData {
    let Some(axes) = resolve_axes(viz, columns) else {
        debug!("Visualization {} has no usable axes", viz.id);
        return ChartData::Unconfigured;
    };

    let rows = &rows[..rows.len().min(MAX_CHART_ROWS)];
    debug!(
        "Preparing {} chart {} from {} rows ({} x {})",
        viz.chart_type, viz.id, rows.len(), axes.x, axes.y
    );

    match viz.chart_type {
        ChartType::Line | ChartType::Bar | ChartType::Area => {
            ChartData::Series(plots::series(viz, &axes, rows))
        }
        ChartType::Pie => ChartData::Pie {
            slices: plots::pie_slices(&axes, rows),
        },
        ChartType::Metric => ChartData::Metric(plots::metric(&axes, rows)),
        ChartType::Table => ChartData::Table(tables::two_column_table(&axes, rows)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dash_core::{CellValue, VisualizationConfig};

    fn columns() -> Vec<String> {
        vec!["Month".into(), "Revenue".into()]
    }

    fn rows(n: usize) -> Vec<Row> {
        (0..n)
            .map(|i| {
                [
                    ("Month".to_string(), CellValue::from(format!("m{}", i))),
                    ("Revenue".to_string(), CellValue::from(i as i64)),
                ]
                .into_iter()
                .collect()
            })
            .collect()
    }

    fn viz(chart_type: ChartType) -> Visualization {
        let mut viz = Visualization::new(chart_type);
        viz.x_axis = Some("Month".into());
        viz.y_axis = Some("Revenue".into());
        viz
    }

    #[test]
    fn test_missing_axes_are_unconfigured() {
        let mut v = viz(ChartType::Bar);
        v.y_axis = None;
        assert_eq!(chart_data(&v, &rows(3), &columns()), ChartData::Unconfigured);
    }

    #[test]
    fn test_stale_axes_are_unconfigured() {
        let mut v = viz(ChartType::Line);
        v.x_axis = Some("Deleted".into());
        let data = chart_data(&v, &rows(3), &columns());
        assert!(!data.is_configured());
    }

    #[test]
    fn test_series_limited_to_first_rows() {
        let data = chart_data(&viz(ChartType::Area), &rows(50), &columns());
        match data {
            ChartData::Series(series) => {
                assert_eq!(series.points.len(), MAX_CHART_ROWS);
                assert_eq!(series.points[19].label, "m19");
                assert_eq!(series.color, VisualizationConfig::default().color);
            }
            other => panic!("expected series, got {:?}", other),
        }
    }

    #[test]
    fn test_metric_sums_only_charted_rows() {
        // 0 + 1 + ... + 19
        let data = chart_data(&viz(ChartType::Metric), &rows(50), &columns());
        assert_eq!(
            data,
            ChartData::Metric(MetricValue {
                label: "Revenue".into(),
                value: 190.0,
            })
        );
    }

    #[test]
    fn test_serialized_shape() {
        let data = chart_data(&viz(ChartType::Pie), &rows(1), &columns());
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["kind"], "pie");
        assert_eq!(json["slices"][0]["label"], "m0");

        let json = serde_json::to_value(ChartData::Unconfigured).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "unconfigured"}));
    }
}
