use std::sync::Arc;
use parking_lot::Mutex;
use ahash::AHashMap;

/// Dashboard-wide event bus
///
/// Stores publish after each successful mutation so that consumers can
/// re-filter or re-render. Handlers run synchronously on the publishing
/// thread and must not publish from inside `handle`.
pub struct EventBus {
    handlers: Arc<Mutex<AHashMap<std::any::TypeId, Vec<Box<dyn EventHandler>>>>>,
}

/// Event trait that all events must implement
pub trait Event: Send + Sync + 'static {
    fn as_any(&self) -> &dyn std::any::Any;
}

/// Handler trait for event handlers
pub trait EventHandler: Send + Sync {
    fn handle(&mut self, event: &dyn Event);
}

/// Dashboard events
pub mod events {
    use super::Event;
    use crate::filters::FilterState;
    use crate::visualization::ChartType;

    /// A data source was added, or replaced under the same id
    #[derive(Debug, Clone)]
    pub struct DataSourceAdded {
        pub source_id: String,
        pub name: String,
        pub row_count: usize,
        pub column_count: usize,
        pub replaced: bool,
    }

    /// The active data source changed
    #[derive(Debug, Clone)]
    pub struct ActiveDataSourceChanged {
        pub source_id: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct DataSourceRemoved {
        pub source_id: String,
    }

    #[derive(Debug, Clone)]
    pub struct VisualizationAdded {
        pub viz_id: String,
        pub chart_type: ChartType,
    }

    #[derive(Debug, Clone)]
    pub struct VisualizationUpdated {
        pub viz_id: String,
    }

    #[derive(Debug, Clone)]
    pub struct VisualizationDeleted {
        pub viz_id: String,
    }

    /// The visualization open in the configuration panel changed
    #[derive(Debug, Clone)]
    pub struct VisualizationSelected {
        pub viz_id: Option<String>,
    }

    /// The shared filter state changed
    #[derive(Debug, Clone)]
    pub struct FiltersChanged {
        pub filters: FilterState,
    }

    // Implement Event trait for all event types
    macro_rules! impl_event {
        ($($t:ty),*) => {
            $(
                impl Event for $t {
                    fn as_any(&self) -> &dyn std::any::Any {
                        self
                    }
                }
            )*
        }
    }

    impl_event!(
        DataSourceAdded,
        ActiveDataSourceChanged,
        DataSourceRemoved,
        VisualizationAdded,
        VisualizationUpdated,
        VisualizationDeleted,
        VisualizationSelected,
        FiltersChanged
    );
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Mutex::new(AHashMap::new())),
        }
    }

    /// Subscribe to events of a specific type
    pub fn subscribe<E: Event>(&self, handler: Box<dyn EventHandler>) {
        let type_id = std::any::TypeId::of::<E>();
        let mut handlers = self.handlers.lock();
        handlers.entry(type_id).or_insert_with(Vec::new).push(handler);
    }

    /// Subscribe with a closure that receives the concrete event type
    pub fn on<E, F>(&self, mut f: F)
    where
        E: Event,
        F: FnMut(&E) + Send + Sync + 'static,
    {
        self.subscribe::<E>(handler_from_fn(move |event: &dyn Event| {
            if let Some(event) = event.as_any().downcast_ref::<E>() {
                f(event);
            }
        }));
    }

    /// Publish an event
    pub fn publish<E: Event>(&self, event: E) {
        let type_id = std::any::TypeId::of::<E>();
        let mut handlers = self.handlers.lock();

        if let Some(event_handlers) = handlers.get_mut(&type_id) {
            for handler in event_handlers.iter_mut() {
                handler.handle(&event);
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper struct for creating event handlers from closures
pub struct ClosureEventHandler<F> {
    handler: F,
}

impl<F> EventHandler for ClosureEventHandler<F>
where
    F: FnMut(&dyn Event) + Send + Sync,
{
    fn handle(&mut self, event: &dyn Event) {
        (self.handler)(event);
    }
}

/// Create an event handler from a closure
pub fn handler_from_fn<F>(f: F) -> Box<dyn EventHandler>
where
    F: FnMut(&dyn Event) + Send + Sync + 'static,
{
    Box::new(ClosureEventHandler { handler: f })
}

#[cfg(test)]
mod tests {
    use super::events::{VisualizationAdded, VisualizationDeleted};
    use super::*;
    use crate::visualization::ChartType;

    #[test]
    fn test_typed_subscription() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        bus.on::<VisualizationAdded, _>(move |e| sink.lock().push(e.viz_id.clone()));

        bus.publish(VisualizationAdded {
            viz_id: "viz-1".to_string(),
            chart_type: ChartType::Bar,
        });
        // Different type, not delivered
        bus.publish(VisualizationDeleted {
            viz_id: "viz-1".to_string(),
        });

        assert_eq!(*seen.lock(), vec!["viz-1".to_string()]);
    }
}
