use std::fs::File;
use std::io::{BufReader, Read};

use async_trait::async_trait;
use csv::{ReaderBuilder, StringRecord};
use dash_core::{CellValue, DataSource, Fetch, Row};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::FileConfig;
use crate::schema::ColumnProfiler;
use crate::DataError;

/// CSV file loaded into a [`DataSource`] preview
///
/// The id is fixed when the source is created, so every read of the same
/// `CsvSource` produces a data source that replaces the previous one.
pub struct CsvSource {
    config: FileConfig,
    id: String,
}

impl CsvSource {
    /// Create a new CSV source from a file configuration
    pub fn new(config: FileConfig) -> Self {
        let id = config
            .source_id
            .clone()
            .unwrap_or_else(|| format!("ds-{}", Uuid::new_v4()));
        Self { config, id }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &FileConfig {
        &self.config
    }

    /// Read the file on a blocking thread
    pub async fn load(&self) -> Result<DataSource, DataError> {
        let config = self.config.clone();
        let id = self.id.clone();
        tokio::task::spawn_blocking(move || {
            let file = File::open(&config.path)?;
            read_csv(BufReader::new(file), &config, id)
        })
        .await?
    }

    /// Read the file on the current thread
    pub fn read(&self) -> Result<DataSource, DataError> {
        let file = File::open(&self.config.path)?;
        read_csv(BufReader::new(file), &self.config, self.id.clone())
    }
}

#[async_trait]
impl Fetch for CsvSource {
    type Output = DataSource;

    async fn fetch(&self) -> anyhow::Result<DataSource> {
        Ok(self.load().await?)
    }

    fn name(&self) -> &str {
        &self.id
    }
}

/// Parse CSV from `reader` into a data source with id `id`
pub fn read_csv<R: Read>(reader: R, config: &FileConfig, id: String) -> Result<DataSource, DataError> {
    info!("Reading CSV {:?}", config.path);

    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(config.delimiter)
        .from_reader(reader);

    // Skip lines before header
    let mut record = StringRecord::new();
    for _ in 0..config.header_line {
        if !csv_reader.read_record(&mut record)? {
            return Err(DataError::Csv(format!(
                "file ends before header line {}",
                config.header_line
            )));
        }
    }

    // Read header
    if !csv_reader.read_record(&mut record)? {
        return Err(DataError::Csv("missing header row".to_string()));
    }
    let columns: Vec<String> = record.iter().map(|h| h.trim().to_string()).collect();

    let mut rows: Vec<Row> = Vec::new();
    let mut row_count = 0;
    while csv_reader.read_record(&mut record)? {
        row_count += 1;
        if rows.len() >= config.preview_limit {
            continue;
        }
        let row = columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                let cell = record
                    .get(idx)
                    .map(|raw| config.infer_cell(column, raw))
                    .unwrap_or(CellValue::Null);
                (column.clone(), cell)
            })
            .collect();
        rows.push(row);
    }

    let date_column = match &config.date_column {
        Some(column) => Some(column.clone()),
        None => {
            let profiles = ColumnProfiler::new()
                .with_sample_size(config.sample_size)
                .profile_rows(&columns, &rows);
            ColumnProfiler::suggest_date_column(&profiles)
        }
    };
    debug!("Date column for {}: {:?}", id, date_column);

    let mut source =
        DataSource::new(id, config.file_name(), columns, rows)?.with_row_count(row_count);
    if let Some(column) = date_column {
        source = source.with_date_column(column)?;
    }

    info!(
        "Loaded {} rows ({} in preview) from {}",
        row_count,
        source.rows().len(),
        source.name()
    );
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dash_core::StateError;
    use std::io::Write;

    const SALES: &str = "Region,Sales,Sale_Date\nUS,10,2024-01-01\nEU,20,2024-02-01\nAPAC,,2024-03-01\n";

    fn parse(data: &str, config: &FileConfig) -> Result<DataSource, DataError> {
        read_csv(data.as_bytes(), config, "ds-test".to_string())
    }

    #[test]
    fn test_reads_rows_and_guesses_date_column() {
        let source = parse(SALES, &FileConfig::new("sales.csv")).unwrap();

        assert_eq!(source.id(), "ds-test");
        assert_eq!(source.name(), "sales.csv");
        assert_eq!(source.columns(), &["Region", "Sales", "Sale_Date"]);
        assert_eq!(source.row_count(), 3);
        assert_eq!(source.date_column(), Some("Sale_Date"));
        assert_eq!(source.rows()[0]["Sales"], CellValue::Number(10.0));
        assert_eq!(source.rows()[2]["Sales"], CellValue::Null);
    }

    #[test]
    fn test_preview_limit_keeps_exact_count() {
        let config = FileConfig::new("sales.csv").with_preview_limit(2);
        let source = parse(SALES, &config).unwrap();
        assert_eq!(source.rows().len(), 2);
        assert_eq!(source.row_count(), 3);
    }

    #[test]
    fn test_header_line_and_short_rows() {
        let data = "exported by tool\nA,B\n1\n";
        let config = FileConfig {
            header_line: 1,
            ..FileConfig::new("t.csv")
        };
        let source = parse(data, &config).unwrap();
        assert_eq!(source.columns(), &["A", "B"]);
        assert_eq!(source.rows()[0]["B"], CellValue::Null);
    }

    #[test]
    fn test_bad_headers_rejected() {
        let config = FileConfig::new("t.csv");
        assert!(matches!(parse("", &config), Err(DataError::Csv(_))));
        assert!(matches!(
            parse("A,A\n1,2\n", &config),
            Err(DataError::State(StateError::DuplicateColumn(_)))
        ));
        let config = config.with_date_column("Missing");
        assert!(matches!(
            parse(SALES, &config),
            Err(DataError::State(StateError::UnknownColumn(_)))
        ));
    }

    #[tokio::test]
    async fn test_load_from_file_keeps_id() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SALES.as_bytes()).unwrap();

        let source = CsvSource::new(FileConfig::new(file.path()));
        let first = source.load().await.unwrap();
        let second = source.fetch().await.unwrap();

        assert!(first.id().starts_with("ds-"));
        assert_eq!(first.id(), second.id());
        assert_eq!(first.row_count(), 3);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let source = CsvSource::new(FileConfig::new("/definitely/not/here.csv").with_source_id("x"));
        assert_eq!(source.id(), "x");
        assert!(matches!(source.read(), Err(DataError::Io(_))));
    }
}
