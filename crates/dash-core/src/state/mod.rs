use std::sync::Arc;
use parking_lot::RwLock;

use crate::data::DataSource;
use crate::events::EventBus;
use crate::filters::FilterStore;
use crate::persist::{KeyValueStore, MemoryStore};
use crate::visualization::VisualizationStore;
use crate::StateError;

/// The dashboard's shared state
///
/// Handed to every surface explicitly; nothing here is global. Changing the
/// active data source re-binds the filter store to that source's columns.
pub struct DashboardState {
    /// The event bus
    pub event_bus: Arc<EventBus>,

    /// The shared filter context
    pub filters: FilterStore,

    /// Data sources and visualizations
    pub visualizations: Arc<RwLock<VisualizationStore>>,
}

impl DashboardState {
    /// Create the dashboard state, rehydrating from `storage`
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        let event_bus = Arc::new(EventBus::new());
        let filters = FilterStore::new().with_event_bus(event_bus.clone());
        let store = VisualizationStore::new(storage).with_event_bus(event_bus.clone());

        let state = Self {
            event_bus,
            filters,
            visualizations: Arc::new(RwLock::new(store)),
        };
        state.rebind_filters();
        state
    }

    /// State that lives only as long as the process
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Copy of the active data source
    pub fn active_data_source(&self) -> Option<DataSource> {
        self.visualizations.read().active_data_source().cloned()
    }

    /// Add (or refresh) a data source and make it active
    pub fn add_data_source(&self, source: DataSource) {
        self.visualizations.write().add_data_source(source);
        self.rebind_filters();
    }

    /// Switch the active data source
    pub fn set_active_data_source(&self, id: &str) -> Result<(), StateError> {
        self.visualizations.write().set_active_data_source(id)?;
        self.rebind_filters();
        Ok(())
    }

    /// Remove a data source
    pub fn remove_data_source(&self, id: &str) -> Result<DataSource, StateError> {
        let removed = self.visualizations.write().remove_data_source(id)?;
        self.rebind_filters();
        Ok(removed)
    }

    fn rebind_filters(&self) {
        let columns = self
            .visualizations
            .read()
            .active_data_source()
            .map(|s| s.columns().to_vec());

        match columns {
            Some(columns) => self.filters.bind_columns(&columns),
            None => self.filters.unbind_columns(),
        }
    }
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Row;

    fn source(id: &str, columns: &[&str]) -> DataSource {
        let columns = columns.iter().map(|c| c.to_string()).collect();
        DataSource::new(id, format!("{}.csv", id), columns, Vec::<Row>::new()).unwrap()
    }

    #[test]
    fn test_switching_source_prunes_filters() {
        let state = DashboardState::in_memory();
        state.add_data_source(source("sales", &["Region", "Sales"]));
        state.add_data_source(source("staff", &["Region", "Team"]));
        state.set_active_data_source("sales").unwrap();

        state.filters.set_category("Region", ["US"]).unwrap();
        state.filters.set_numeric_range("Sales", 0.0, 100.0).unwrap();
        assert!(state.filters.set_category("Team", ["Ops"]).is_err());

        state.set_active_data_source("staff").unwrap();
        let filters = state.filters.snapshot();
        assert!(filters.categories.contains_key("Region"));
        assert!(filters.numeric_ranges.is_empty());
        assert!(state.filters.set_category("Team", ["Ops"]).is_ok());
    }

    #[test]
    fn test_removing_active_source_unbinds_filters() {
        let state = DashboardState::in_memory();
        state.add_data_source(source("sales", &["Region"]));
        state.remove_data_source("sales").unwrap();

        assert!(state.active_data_source().is_none());
        assert!(state.filters.set_category("Anything", ["x"]).is_ok());
    }
}
