use dash_core::Visualization;

/// Axis columns that exist in the data being charted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Axes {
    pub x: String,
    pub y: String,
}

/// Resolve a visualization's axes against `columns`.
///
/// Returns `None` when either axis is unset or names a column that is not
/// present, e.g. after the active data source changed.
pub fn resolve_axes(viz: &Visualization, columns: &[String]) -> Option<Axes> {
    let x = viz.x_axis.as_ref()?;
    let y = viz.y_axis.as_ref()?;

    if columns.contains(x) && columns.contains(y) {
        Some(Axes {
            x: x.clone(),
            y: y.clone(),
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dash_core::ChartType;

    #[test]
    fn test_resolve_axes() {
        let columns = vec!["a".to_string(), "b".to_string()];
        let mut viz = Visualization::new(ChartType::Table);
        assert_eq!(resolve_axes(&viz, &columns), None);

        viz.x_axis = Some("a".into());
        viz.y_axis = Some("a".into());
        assert_eq!(
            resolve_axes(&viz, &columns),
            Some(Axes {
                x: "a".into(),
                y: "a".into()
            })
        );

        viz.y_axis = Some("c".into());
        assert_eq!(resolve_axes(&viz, &columns), None);
    }
}
