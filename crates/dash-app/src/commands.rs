//! Command execution over the persisted dashboard state

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDateTime;
use dash_core::data::cell_text;
use dash_core::events::events::DataSourceAdded;
use dash_core::{
    DashboardState, DataSource, DateRange, FileStore, Poller, Row, VisualizationUpdate,
};
use dash_data::config::{FileConfig, NullConfig};
use dash_data::dates::parse_datetime;
use dash_data::{filter_source, CategoryOptionDeriver, ColumnProfiler, CsvSource};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::cli::{Command, FilterArgs, NullArgs, OutputFormat, VizCommand, VizUpdateArgs};
use crate::config::AppConfig;

/// The CLI application: configuration plus shared dashboard state
pub struct App {
    config: AppConfig,
    state: Arc<DashboardState>,
}

impl App {
    /// Open the state persisted under the configured state directory
    pub fn open(config: AppConfig) -> Result<Self> {
        let store = FileStore::open(&config.state_dir).with_context(|| {
            format!("Failed to open state directory {}", config.state_dir.display())
        })?;
        let state = DashboardState::new(Arc::new(store));
        Ok(Self::with_state(config, state))
    }

    pub fn with_state(config: AppConfig, state: DashboardState) -> Self {
        Self {
            config,
            state: Arc::new(state),
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    /// Execute one command, writing its output to `out`
    pub async fn run<W: Write>(&self, command: Command, out: &mut W) -> Result<()> {
        match command {
            Command::Load {
                path,
                date_column,
                nulls,
            } => self.load(&path, date_column, &nulls, out).await,
            Command::Sources => self.list_sources(out),
            Command::Activate { id } => {
                self.state.set_active_data_source(&id)?;
                writeln!(out, "Active data source: {}", id)?;
                Ok(())
            }
            Command::RemoveSource { id } => {
                let removed = self.state.remove_data_source(&id)?;
                writeln!(out, "Removed {} ({})", removed.id(), removed.name())?;
                Ok(())
            }
            Command::Options => self.options(out),
            Command::Filter(args) => self.filter(args, out),
            Command::Viz(command) => self.viz(command, out),
            Command::Watch {
                path,
                interval,
                nulls,
            } => self.watch(&path, interval, &nulls).await,
        }
    }

    fn active_source(&self) -> Result<DataSource> {
        self.state
            .active_data_source()
            .ok_or_else(|| anyhow!("No active data source; load a CSV file first"))
    }

    fn file_config(&self, path: &Path, nulls: &NullArgs) -> FileConfig {
        FileConfig::new(path)
            .with_preview_limit(self.config.preview_limit)
            .with_null_config(null_config(nulls))
    }

    async fn load<W: Write>(
        &self,
        path: &Path,
        date_column: Option<String>,
        nulls: &NullArgs,
        out: &mut W,
    ) -> Result<()> {
        let mut file_config = self.file_config(path, nulls);
        if let Some(column) = date_column {
            file_config = file_config.with_date_column(column);
        }

        let source = CsvSource::new(file_config)
            .load()
            .await
            .with_context(|| format!("Failed to load {}", path.display()))?;
        writeln!(
            out,
            "Loaded {} as {} ({} rows, {} columns)",
            source.name(),
            source.id(),
            source.row_count(),
            source.columns().len()
        )?;
        self.state.add_data_source(source);
        Ok(())
    }

    fn list_sources<W: Write>(&self, out: &mut W) -> Result<()> {
        let store = self.state.visualizations.read();
        let active = store.active_data_source().map(|s| s.id().to_string());

        if store.data_sources().is_empty() {
            writeln!(out, "No data sources")?;
        }
        for source in store.data_sources() {
            let marker = if active.as_deref() == Some(source.id()) { "*" } else { " " };
            writeln!(
                out,
                "{} {}  {}  {} rows",
                marker,
                source.id(),
                source.name(),
                source.row_count()
            )?;
        }
        Ok(())
    }

    fn options<W: Write>(&self, out: &mut W) -> Result<()> {
        let source = self.active_source()?;
        let categories = CategoryOptionDeriver::new()
            .with_sample_size(self.config.category_sample_size)
            .derive(&source);
        let profiles = ColumnProfiler::new().profile(&source);

        let report = json!({
            "categories": categories,
            "numericColumns": ColumnProfiler::numeric_columns(&profiles),
            "dateColumn": source.date_column(),
        });
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
        Ok(())
    }

    fn filter<W: Write>(&self, args: FilterArgs, out: &mut W) -> Result<()> {
        let source = self.active_source()?;
        let filters = &self.state.filters;

        if let Some(search) = args.search {
            filters.set_search(search);
        }
        let start = args.from.as_deref().map(parse_date).transpose()?;
        let end = args.to.as_deref().map(parse_date).transpose()?;
        filters.set_date_range(DateRange::new(start, end))?;

        for (column, values) in args.categories {
            filters.set_category(&column, values)?;
        }
        for (column, min, max) in args.ranges {
            filters.set_numeric_range(&column, min, max)?;
        }

        let rows = filter_source(&source, &filters.snapshot());
        info!("{} of {} preview rows match", rows.len(), source.rows().len());
        write_rows(out, source.columns(), &rows, args.format)
    }

    fn viz<W: Write>(&self, command: VizCommand, out: &mut W) -> Result<()> {
        match command {
            VizCommand::Add { chart_type } => {
                let id = self.state.visualizations.write().add_visualization(chart_type);
                writeln!(out, "{}", id)?;
            }
            VizCommand::List => {
                let store = self.state.visualizations.read();
                if store.visualizations().is_empty() {
                    writeln!(out, "No visualizations")?;
                }
                for viz in store.visualizations() {
                    let marker = if store.selected_id() == Some(viz.id.as_str()) { "*" } else { " " };
                    writeln!(
                        out,
                        "{} {}  {:<6}  {}  x={} y={}",
                        marker,
                        viz.id,
                        viz.chart_type.as_str(),
                        viz.title,
                        viz.x_axis.as_deref().unwrap_or("-"),
                        viz.y_axis.as_deref().unwrap_or("-"),
                    )?;
                }
            }
            VizCommand::Update(args) => self.update_viz(args, out)?,
            VizCommand::Delete { id } => {
                let removed = self.state.visualizations.write().delete_visualization(&id)?;
                writeln!(out, "Deleted {} ({})", removed.id, removed.title)?;
            }
            VizCommand::Select { id } => {
                self.state
                    .visualizations
                    .write()
                    .select_visualization(id.as_deref())?;
                match id {
                    Some(id) => writeln!(out, "Selected {}", id)?,
                    None => writeln!(out, "Selection cleared")?,
                }
            }
            VizCommand::Show { id } => {
                let viz = self
                    .state
                    .visualizations
                    .read()
                    .visualization(&id)
                    .cloned()
                    .ok_or_else(|| anyhow!("Unknown visualization '{}'", id))?;

                let data = match self.state.active_data_source() {
                    Some(source) => dash_views::chart_data(&viz, source.rows(), source.columns()),
                    None => dash_views::chart_data(&viz, &[], &[]),
                };
                writeln!(out, "{}", serde_json::to_string_pretty(&data)?)?;
            }
        }
        Ok(())
    }

    fn update_viz<W: Write>(&self, args: VizUpdateArgs, out: &mut W) -> Result<()> {
        let mut store = self.state.visualizations.write();
        let current = store
            .visualization(&args.id)
            .cloned()
            .ok_or_else(|| anyhow!("Unknown visualization '{}'", args.id))?;

        let mut update = VisualizationUpdate::new();
        if let Some(title) = args.title {
            update = update.title(title);
        }
        if let Some(chart_type) = args.chart_type {
            update = update.chart_type(chart_type);
        }
        if let Some(x) = args.x {
            update = update.x_axis(x);
        }
        if let Some(y) = args.y {
            update = update.y_axis(y);
        }
        if args.color.is_some() || args.grid.is_some() || args.legend.is_some() {
            let mut config = current.config;
            if let Some(color) = args.color {
                config.color = color;
            }
            if let Some(grid) = args.grid {
                config.show_grid = grid;
            }
            if let Some(legend) = args.legend {
                config.show_legend = legend;
            }
            update = update.config(config);
        }

        let viz = store.update_visualization(&args.id, update)?;
        writeln!(out, "Updated {} ({})", viz.id, viz.title)?;
        Ok(())
    }

    async fn watch(&self, path: &Path, interval: Option<u64>, nulls: &NullArgs) -> Result<()> {
        let interval = Duration::from_secs(interval.unwrap_or(self.config.refresh_interval_secs));
        let mut file_config = self.file_config(path, nulls);

        // Refresh the source loaded from the same file, if any
        let existing = self
            .state
            .visualizations
            .read()
            .data_sources()
            .iter()
            .find(|s| s.name() == file_config.file_name())
            .map(|s| s.id().to_string());
        if let Some(id) = existing {
            file_config = file_config.with_source_id(id);
        }

        let source = CsvSource::new(file_config);
        let source_id = source.id().to_string();
        let poller = Poller::new(source)
            .with_interval(interval)
            .with_context(|| format!("Cannot watch {}", path.display()))?;
        info!("Watching {} as {} every {:?}", path.display(), source_id, interval);

        self.state.event_bus.on(|event: &DataSourceAdded| {
            if event.replaced {
                debug!(
                    "Source {} replaced: {} rows, {} columns",
                    event.source_id, event.row_count, event.column_count
                );
            }
        });

        let state = Arc::clone(&self.state);
        let handle = poller.spawn(move |data_source: DataSource| {
            let id = data_source.id().to_string();
            state.add_data_source(data_source);
            match state.active_data_source() {
                Some(active) => {
                    let matching = filter_source(&active, &state.filters.snapshot()).len();
                    info!("Refreshed {}: {} rows match filters", id, matching);
                }
                None => warn!("Refreshed {} but no source is active", id),
            }
        });

        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for ctrl-c")?;
        handle.stop();
        info!("Stopped watching {}", path.display());
        Ok(())
    }
}

fn null_config(nulls: &NullArgs) -> NullConfig {
    let mut config = if nulls.only_empty {
        NullConfig::empty_only()
    } else {
        NullConfig::default()
    };
    for pattern in &nulls.keep {
        config.remove_pattern(pattern);
    }
    for pattern in &nulls.extra {
        config.add_pattern(pattern.as_str());
    }
    config
}

fn parse_date(raw: &str) -> Result<NaiveDateTime> {
    parse_datetime(raw).ok_or_else(|| anyhow!("Invalid date '{}'", raw))
}

/// Write rows as a JSON array or as CSV with a header row
pub fn write_rows<W: Write>(
    out: &mut W,
    columns: &[String],
    rows: &[Row],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(rows)?)?;
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(out);
            writer.write_record(columns)?;
            for row in rows {
                writer.write_record(columns.iter().map(|c| cell_text(row, c)))?;
            }
            writer.flush()?;
        }
    }
    Ok(())
}
