//! Plot data for the chart types
//!
//! Cells are read as numbers with [`CellValue::as_f64`]. Series keep
//! non-numeric values as gaps; pie and metric count them as zero.

use dash_core::data::cell_text;
use dash_core::{CellValue, Row, Visualization, PALETTE};
use serde::Serialize;

use crate::{Axes, MAX_PIE_SLICES};

/// One x/y point of a line, bar or area chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub label: String,
    pub value: Option<f64>,
}

/// Line, bar or area chart data
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesData {
    pub x_axis: String,
    pub y_axis: String,
    pub color: String,
    pub show_grid: bool,
    pub show_legend: bool,
    pub points: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub label: String,
    pub value: f64,
    pub color: String,
}

/// A single aggregated number
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricValue {
    /// The y axis column
    pub label: String,
    pub value: f64,
}

fn number(row: &Row, column: &str) -> Option<f64> {
    row.get(column).and_then(CellValue::as_f64)
}

pub fn series(viz: &Visualization, axes: &Axes, rows: &[Row]) -> SeriesData {
    SeriesData {
        x_axis: axes.x.clone(),
        y_axis: axes.y.clone(),
        color: viz.config.color.clone(),
        show_grid: viz.config.show_grid,
        show_legend: viz.config.show_legend,
        points: rows
            .iter()
            .map(|row| SeriesPoint {
                label: cell_text(row, &axes.x),
                value: number(row, &axes.y),
            })
            .collect(),
    }
}

/// Slices for the first rows; colours cycle through the palette
pub fn pie_slices(axes: &Axes, rows: &[Row]) -> Vec<PieSlice> {
    rows.iter()
        .take(MAX_PIE_SLICES)
        .enumerate()
        .map(|(i, row)| PieSlice {
            label: cell_text(row, &axes.x),
            value: number(row, &axes.y).unwrap_or(0.0),
            color: PALETTE[i % PALETTE.len()].to_string(),
        })
        .collect()
}

pub fn metric(axes: &Axes, rows: &[Row]) -> MetricValue {
    MetricValue {
        label: axes.y.clone(),
        value: rows.iter().filter_map(|row| number(row, &axes.y)).sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dash_core::ChartType;

    fn axes() -> Axes {
        Axes {
            x: "Team".into(),
            y: "Score".into(),
        }
    }

    fn row(team: &str, score: CellValue) -> Row {
        [
            ("Team".to_string(), CellValue::from(team)),
            ("Score".to_string(), score),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_series_keeps_gaps() {
        let rows = vec![
            row("a", CellValue::from(1.5)),
            row("b", CellValue::from("n/a")),
            row("c", CellValue::from(" 4 ")),
        ];
        let mut viz = Visualization::new(ChartType::Line);
        viz.config.show_grid = false;

        let data = series(&viz, &axes(), &rows);
        let values: Vec<_> = data.points.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![Some(1.5), None, Some(4.0)]);
        assert!(!data.show_grid);
    }

    #[test]
    fn test_pie_takes_six_and_cycles_colors() {
        let rows: Vec<Row> = (0..8)
            .map(|i| row(&format!("t{}", i), CellValue::from(i as i64)))
            .collect();
        let slices = pie_slices(&axes(), &rows);

        assert_eq!(slices.len(), MAX_PIE_SLICES);
        assert_eq!(slices[0].color, PALETTE[0]);
        assert_eq!(slices[5].color, PALETTE[5]);
        assert_eq!(slices[5].label, "t5");
    }

    #[test]
    fn test_pie_and_metric_treat_text_as_zero() {
        let rows = vec![
            row("a", CellValue::from("oops")),
            row("b", CellValue::Null),
            row("c", CellValue::from(2i64)),
        ];
        assert_eq!(pie_slices(&axes(), &rows)[0].value, 0.0);
        assert_eq!(metric(&axes(), &rows).value, 2.0);
        assert_eq!(metric(&axes(), &[]).value, 0.0);
    }
}
