//! Table visualization data

use dash_core::data::cell_text;
use dash_core::Row;
use serde::Serialize;

use crate::Axes;

/// The x and y columns as text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableData {
    pub headers: [String; 2],
    pub rows: Vec<[String; 2]>,
}

pub fn two_column_table(axes: &Axes, rows: &[Row]) -> TableData {
    TableData {
        headers: [axes.x.clone(), axes.y.clone()],
        rows: rows
            .iter()
            .map(|row| [cell_text(row, &axes.x), cell_text(row, &axes.y)])
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dash_core::CellValue;

    #[test]
    fn test_two_column_table() {
        let row: Row = [
            ("Name".to_string(), CellValue::from("Ada")),
            ("Age".to_string(), CellValue::from(36i64)),
            ("Notes".to_string(), CellValue::Null),
        ]
        .into_iter()
        .collect();
        let axes = Axes {
            x: "Name".into(),
            y: "Notes".into(),
        };

        let table = two_column_table(&axes, &[row]);
        assert_eq!(table.headers, ["Name".to_string(), "Notes".to_string()]);
        assert_eq!(table.rows, vec![["Ada".to_string(), String::new()]]);
    }
}
