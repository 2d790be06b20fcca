use std::sync::Arc;

use ahash::AHashSet;
use serde::de::DeserializeOwned;

use super::{is_hex_color, ChartType, Visualization, VisualizationUpdate};
use crate::data::DataSource;
use crate::events::events::{
    ActiveDataSourceChanged, DataSourceAdded, DataSourceRemoved, VisualizationAdded,
    VisualizationDeleted, VisualizationSelected, VisualizationUpdated,
};
use crate::events::EventBus;
use crate::persist::{load_json, save_json, KeyValueStore, MemoryStore};
use crate::StateError;

/// Storage key for the list of known data sources
pub const DATA_SOURCES_KEY: &str = "dataSources";
/// Storage key for the id of the active data source
pub const ACTIVE_DATA_SOURCE_KEY: &str = "activeDataSource";
/// Storage key for the list of visualizations
pub const VISUALIZATIONS_KEY: &str = "visualizations";

/// Owns the known data sources, the active one, the user's
/// visualizations and the visualization open for configuration.
///
/// Every mutation is written through to the backing [`KeyValueStore`].
pub struct VisualizationStore {
    data_sources: Vec<DataSource>,
    active_data_source: Option<String>,
    visualizations: Vec<Visualization>,
    selected: Option<String>,
    storage: Arc<dyn KeyValueStore>,
    event_bus: Option<Arc<EventBus>>,
}

impl VisualizationStore {
    /// Create a store and rehydrate it from `storage`.
    ///
    /// Each key is restored independently; an absent or corrupt value
    /// leaves that part empty. Within a list, invalid entries and repeated
    /// ids are dropped and the rest is kept.
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        let data_sources: Vec<DataSource> =
            rehydrate_list(storage.as_ref(), DATA_SOURCES_KEY, |s: &DataSource| s.id());
        let visualizations: Vec<Visualization> =
            rehydrate_list(storage.as_ref(), VISUALIZATIONS_KEY, |v: &Visualization| {
                v.id.as_str()
            });

        let active_data_source = rehydrate::<String>(storage.as_ref(), ACTIVE_DATA_SOURCE_KEY)
            .filter(|id| {
                let known = data_sources.iter().any(|s| s.id() == id);
                if !known {
                    tracing::warn!("Saved active data source '{}' no longer exists", id);
                }
                known
            });

        tracing::info!(
            "Restored {} data sources and {} visualizations",
            data_sources.len(),
            visualizations.len()
        );

        Self {
            data_sources,
            active_data_source,
            visualizations,
            selected: None,
            storage,
            event_bus: None,
        }
    }

    /// Store backed by process memory only
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn data_sources(&self) -> &[DataSource] {
        &self.data_sources
    }

    pub fn data_source(&self, id: &str) -> Option<&DataSource> {
        self.data_sources.iter().find(|s| s.id() == id)
    }

    pub fn active_data_source(&self) -> Option<&DataSource> {
        self.active_data_source
            .as_deref()
            .and_then(|id| self.data_source(id))
    }

    pub fn visualizations(&self) -> &[Visualization] {
        &self.visualizations
    }

    pub fn visualization(&self, id: &str) -> Option<&Visualization> {
        self.visualizations.iter().find(|v| v.id == id)
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_visualization(&self) -> Option<&Visualization> {
        self.selected.as_deref().and_then(|id| self.visualization(id))
    }

    /// Add a data source and make it active. A source with the same id is
    /// replaced in place.
    pub fn add_data_source(&mut self, source: DataSource) {
        let event = DataSourceAdded {
            source_id: source.id().to_string(),
            name: source.name().to_string(),
            row_count: source.row_count(),
            column_count: source.columns().len(),
            replaced: false,
        };

        let id = source.id().to_string();
        let replaced = match self.data_sources.iter_mut().find(|s| s.id() == id) {
            Some(existing) => {
                *existing = source;
                true
            }
            None => {
                self.data_sources.push(source);
                false
            }
        };

        tracing::info!(
            "{} data source '{}' ({} rows, {} columns)",
            if replaced { "Refreshed" } else { "Added" },
            event.name,
            event.row_count,
            event.column_count
        );

        self.active_data_source = Some(id.clone());
        self.save_data_sources();
        self.save_active();

        self.publish(DataSourceAdded { replaced, ..event });
        self.publish(ActiveDataSourceChanged { source_id: Some(id) });
    }

    /// Make the source with `id` active
    pub fn set_active_data_source(&mut self, id: &str) -> Result<(), StateError> {
        if self.data_source(id).is_none() {
            tracing::warn!("Cannot activate unknown data source '{}'", id);
            return Err(StateError::UnknownDataSource(id.to_string()));
        }

        self.active_data_source = Some(id.to_string());
        self.save_active();
        self.publish(ActiveDataSourceChanged {
            source_id: Some(id.to_string()),
        });
        Ok(())
    }

    /// Remove a data source; clears the active source if it was this one
    pub fn remove_data_source(&mut self, id: &str) -> Result<DataSource, StateError> {
        let index = self
            .data_sources
            .iter()
            .position(|s| s.id() == id)
            .ok_or_else(|| {
                tracing::warn!("Cannot remove unknown data source '{}'", id);
                StateError::UnknownDataSource(id.to_string())
            })?;

        let removed = self.data_sources.remove(index);
        self.save_data_sources();
        self.publish(DataSourceRemoved {
            source_id: id.to_string(),
        });

        if self.active_data_source.as_deref() == Some(id) {
            self.active_data_source = None;
            self.save_active();
            self.publish(ActiveDataSourceChanged { source_id: None });
        }

        Ok(removed)
    }

    /// Create a visualization of the given type, append it and select it.
    /// Returns the new id.
    pub fn add_visualization(&mut self, chart_type: ChartType) -> String {
        let viz = Visualization::new(chart_type);
        let id = viz.id.clone();

        tracing::info!("Added {} visualization '{}'", chart_type, id);
        self.visualizations.push(viz);
        self.selected = Some(id.clone());
        self.save_visualizations();

        self.publish(VisualizationAdded {
            viz_id: id.clone(),
            chart_type,
        });
        self.publish(VisualizationSelected {
            viz_id: Some(id.clone()),
        });
        id
    }

    /// Merge `update` into the visualization with `id`.
    ///
    /// Axis columns are checked against the active data source when there
    /// is one; the colour must be a hex colour.
    pub fn update_visualization(
        &mut self,
        id: &str,
        update: VisualizationUpdate,
    ) -> Result<&Visualization, StateError> {
        if let Some(source) = self.active_data_source() {
            if let Some(column) = update.axis_columns().find(|c| !source.has_column(c)) {
                return Err(StateError::UnknownColumn(column.to_string()));
            }
        }
        if let Some(config) = &update.config {
            if !is_hex_color(&config.color) {
                return Err(StateError::InvalidColor(config.color.clone()));
            }
        }

        let index = self.position(id)?;
        update.apply(&mut self.visualizations[index]);
        self.save_visualizations();
        self.publish(VisualizationUpdated {
            viz_id: id.to_string(),
        });

        Ok(&self.visualizations[index])
    }

    /// Delete a visualization; clears the selection if it was selected
    pub fn delete_visualization(&mut self, id: &str) -> Result<Visualization, StateError> {
        let index = self.position(id)?;
        let removed = self.visualizations.remove(index);
        self.save_visualizations();
        self.publish(VisualizationDeleted {
            viz_id: id.to_string(),
        });

        if self.selected.as_deref() == Some(id) {
            self.selected = None;
            self.publish(VisualizationSelected { viz_id: None });
        }

        tracing::info!("Deleted visualization '{}'", id);
        Ok(removed)
    }

    /// Select a visualization for configuration; `None` closes the panel
    pub fn select_visualization(&mut self, id: Option<&str>) -> Result<(), StateError> {
        if let Some(id) = id {
            self.position(id)?;
        }
        self.selected = id.map(str::to_string);
        self.publish(VisualizationSelected {
            viz_id: self.selected.clone(),
        });
        Ok(())
    }

    fn position(&self, id: &str) -> Result<usize, StateError> {
        self.visualizations
            .iter()
            .position(|v| v.id == id)
            .ok_or_else(|| {
                tracing::warn!("Unknown visualization '{}'", id);
                StateError::UnknownVisualization(id.to_string())
            })
    }

    fn save_data_sources(&self) {
        if let Err(e) = save_json(self.storage.as_ref(), DATA_SOURCES_KEY, &self.data_sources) {
            tracing::warn!("Failed to persist {}: {}", DATA_SOURCES_KEY, e);
        }
    }

    fn save_active(&self) {
        let result = match &self.active_data_source {
            Some(id) => save_json(self.storage.as_ref(), ACTIVE_DATA_SOURCE_KEY, id),
            None => self.storage.remove(ACTIVE_DATA_SOURCE_KEY),
        };
        if let Err(e) = result {
            tracing::warn!("Failed to persist {}: {}", ACTIVE_DATA_SOURCE_KEY, e);
        }
    }

    fn save_visualizations(&self) {
        if let Err(e) = save_json(self.storage.as_ref(), VISUALIZATIONS_KEY, &self.visualizations)
        {
            tracing::warn!("Failed to persist {}: {}", VISUALIZATIONS_KEY, e);
        }
    }

    fn publish<E: crate::events::Event>(&self, event: E) {
        if let Some(bus) = &self.event_bus {
            bus.publish(event);
        }
    }
}

fn rehydrate<T: DeserializeOwned>(storage: &dyn KeyValueStore, key: &str) -> Option<T> {
    match load_json(storage, key) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Ignoring saved '{}': {}", key, e);
            None
        }
    }
}

/// Restore a list entry by entry, keeping the first entry for each id.
fn rehydrate_list<T, F>(storage: &dyn KeyValueStore, key: &str, id_of: F) -> Vec<T>
where
    T: DeserializeOwned,
    F: Fn(&T) -> &str,
{
    let entries: Vec<serde_json::Value> = rehydrate(storage, key).unwrap_or_default();

    let mut seen = AHashSet::with_capacity(entries.len());
    let mut restored = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let item: T = match serde_json::from_value(entry) {
            Ok(item) => item,
            Err(e) => {
                tracing::warn!("Dropping saved '{}' entry {}: {}", key, index, e);
                continue;
            }
        };
        if !seen.insert(id_of(&item).to_string()) {
            tracing::warn!(
                "Dropping saved '{}' entry {}: duplicate id '{}'",
                key,
                index,
                id_of(&item)
            );
            continue;
        }
        restored.push(item);
    }
    restored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CellValue, Row};
    use crate::visualization::VisualizationConfig;

    fn sales_source(id: &str) -> DataSource {
        let rows: Vec<Row> = vec![
            [
                ("Region".to_string(), CellValue::from("US")),
                ("Sales".to_string(), CellValue::from(10i64)),
            ]
            .into_iter()
            .collect(),
        ];
        DataSource::new(id, "sales.csv", vec!["Region".into(), "Sales".into()], rows).unwrap()
    }

    #[test]
    fn test_add_bar_then_set_axes() {
        let mut store = VisualizationStore::in_memory();
        let id = store.add_visualization(ChartType::Bar);
        assert_eq!(store.selected_id(), Some(id.as_str()));

        let viz = store
            .update_visualization(&id, VisualizationUpdate::new().axes("Region", "Sales"))
            .unwrap();
        assert_eq!(viz.id, id);
        assert_eq!(viz.chart_type, ChartType::Bar);
        assert_eq!(viz.x_axis.as_deref(), Some("Region"));
        assert_eq!(viz.y_axis.as_deref(), Some("Sales"));
    }

    #[test]
    fn test_delete_selected_clears_selection() {
        let mut store = VisualizationStore::in_memory();
        let first = store.add_visualization(ChartType::Line);
        let second = store.add_visualization(ChartType::Pie);

        store.delete_visualization(&first).unwrap();
        assert_eq!(store.selected_id(), Some(second.as_str()));

        store.delete_visualization(&second).unwrap();
        assert_eq!(store.selected_id(), None);
        assert!(store.visualizations().is_empty());
    }

    #[test]
    fn test_unknown_ids_are_reported() {
        let mut store = VisualizationStore::in_memory();
        assert_eq!(
            store.set_active_data_source("nope").unwrap_err(),
            StateError::UnknownDataSource("nope".into())
        );
        assert!(matches!(
            store.update_visualization("nope", VisualizationUpdate::new().title("x")),
            Err(StateError::UnknownVisualization(_))
        ));
        assert!(store.delete_visualization("nope").is_err());
        assert!(store.select_visualization(Some("nope")).is_err());
        assert!(store.select_visualization(None).is_ok());
    }

    #[test]
    fn test_axes_validated_against_active_source() {
        let mut store = VisualizationStore::in_memory();
        store.add_data_source(sales_source("ds-1"));
        let id = store.add_visualization(ChartType::Bar);

        let err = store
            .update_visualization(&id, VisualizationUpdate::new().axes("Region", "Profit"))
            .unwrap_err();
        assert_eq!(err, StateError::UnknownColumn("Profit".into()));
        assert!(store.visualization(&id).unwrap().x_axis.is_none());
    }

    #[test]
    fn test_color_validated() {
        let mut store = VisualizationStore::in_memory();
        let id = store.add_visualization(ChartType::Area);
        let config = VisualizationConfig {
            color: "purple".into(),
            ..VisualizationConfig::default()
        };
        assert!(matches!(
            store.update_visualization(&id, VisualizationUpdate::new().config(config)),
            Err(StateError::InvalidColor(_))
        ));
    }

    #[test]
    fn test_same_id_replaces_source() {
        let mut store = VisualizationStore::in_memory();
        store.add_data_source(sales_source("ds-1"));
        store.add_data_source(sales_source("ds-2"));
        store.add_data_source(sales_source("ds-1").with_row_count(99));

        assert_eq!(store.data_sources().len(), 2);
        assert_eq!(store.data_sources()[0].row_count(), 99);
        assert_eq!(store.active_data_source().unwrap().id(), "ds-1");
    }

    #[test]
    fn test_remove_active_source() {
        let mut store = VisualizationStore::in_memory();
        store.add_data_source(sales_source("ds-1"));
        store.remove_data_source("ds-1").unwrap();
        assert!(store.active_data_source().is_none());
        assert!(store.remove_data_source("ds-1").is_err());
    }

    #[test]
    fn test_state_survives_reload() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let id = {
            let mut store = VisualizationStore::new(storage.clone());
            store.add_data_source(sales_source("ds-1"));
            store.add_data_source(sales_source("ds-2"));
            store.set_active_data_source("ds-1").unwrap();
            store.add_visualization(ChartType::Metric)
        };

        let store = VisualizationStore::new(storage);
        assert_eq!(store.data_sources().len(), 2);
        assert_eq!(store.active_data_source().unwrap().id(), "ds-1");
        assert_eq!(store.visualization(&id).unwrap().chart_type, ChartType::Metric);
        // Selection is session-only
        assert!(store.selected_id().is_none());
    }

    #[test]
    fn test_corrupt_snapshot_falls_back_to_empty() {
        let storage = Arc::new(MemoryStore::new());
        storage.set(VISUALIZATIONS_KEY, "{not json").unwrap();
        save_json(storage.as_ref(), DATA_SOURCES_KEY, &vec![sales_source("ds-1")]).unwrap();
        save_json(storage.as_ref(), ACTIVE_DATA_SOURCE_KEY, "ds-gone").unwrap();

        let store = VisualizationStore::new(storage);
        assert!(store.visualizations().is_empty());
        assert_eq!(store.data_sources().len(), 1);
        assert!(store.active_data_source().is_none());
    }

    #[test]
    fn test_invalid_saved_entries_are_dropped() {
        let storage = Arc::new(MemoryStore::new());
        let sources = serde_json::json!([
            {"id": "a", "name": "a.csv", "rowCount": 0, "columns": ["x", "x"], "rows": []},
            {"id": "b", "name": "b.csv", "rowCount": 0, "columns": ["x"], "rows": [], "dateColumn": "nope"},
            sales_source("ds-1"),
            sales_source("ds-1"),
        ]);
        save_json(storage.as_ref(), DATA_SOURCES_KEY, &sources).unwrap();

        let first = Visualization::new(ChartType::Bar);
        let mut second = Visualization::new(ChartType::Pie);
        second.id = first.id.clone();
        save_json(storage.as_ref(), VISUALIZATIONS_KEY, &vec![first.clone(), second]).unwrap();
        save_json(storage.as_ref(), ACTIVE_DATA_SOURCE_KEY, "a").unwrap();

        let store = VisualizationStore::new(storage);
        let ids: Vec<&str> = store.data_sources().iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec!["ds-1"]);
        assert!(store.active_data_source().is_none());
        assert_eq!(store.visualizations(), &[first][..]);
    }

    #[test]
    fn test_events_published() {
        let bus = Arc::new(EventBus::new());
        let log = Arc::new(parking_lot::Mutex::new(Vec::new()));

        let sink = log.clone();
        bus.on::<VisualizationAdded, _>(move |e| sink.lock().push(format!("added {}", e.chart_type)));
        let sink = log.clone();
        bus.on::<VisualizationSelected, _>(move |e| {
            sink.lock().push(format!("selected {}", e.viz_id.is_some()))
        });

        let mut store = VisualizationStore::in_memory().with_event_bus(bus);
        let id = store.add_visualization(ChartType::Table);
        store.delete_visualization(&id).unwrap();

        assert_eq!(
            *log.lock(),
            vec!["added table", "selected true", "selected false"]
        );
    }
}
