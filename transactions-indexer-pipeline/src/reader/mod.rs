//! Reader module for the transactions indexer pipeline.
//!
//! Loads gzip-compressed CSV objects from object storage into in-memory
//! tables.

use std::sync::Arc;

use csv::ReaderBuilder;
use flate2::read::MultiGzDecoder;
use futures::TryStreamExt;
use object_store::path::Path;
use object_store::{ObjectMeta, ObjectStore};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::errors::PipelineError;

/// One source CSV object, fully decoded.
///
/// Headers are kept alongside the rows because column positions can differ
/// between objects; the mapper resolves its projection per table.
#[derive(Debug, Clone)]
pub struct SourceTable {
    /// Object path the table was read from.
    pub path: String,
    /// Header row of the CSV file.
    pub headers: Vec<String>,
    /// Data rows, in file order.
    pub rows: Vec<Vec<String>>,
}

/// Reader that loads every object under a storage prefix.
///
/// Listing is recursive: all objects below the prefix are read, each one
/// treated as a gzip-compressed CSV file with a header row. The reader adds
/// no validation of its own; schema checks belong to the mapper.
pub struct StorageReader {
    store: Arc<dyn ObjectStore>,
    prefix: Path,
    location: String,
}

impl StorageReader {
    /// Create a reader over an already-constructed store.
    pub fn new(store: Arc<dyn ObjectStore>, prefix: Path) -> Self {
        let location = format!("{}", prefix);
        Self {
            store,
            prefix,
            location,
        }
    }

    /// Create a reader from a storage URL, e.g. `s3://bucket/prefix/`.
    ///
    /// The store implementation is chosen from the URL scheme; S3 picks its
    /// credentials up from the environment.
    pub fn from_url(location: &str) -> Result<Self, PipelineError> {
        let url = Url::parse(location).map_err(|e| {
            PipelineError::storage(format!("invalid input location {:?}: {}", location, e))
        })?;

        let (store, prefix) = object_store::parse_url(&url)
            .map_err(|e| PipelineError::storage(e.to_string()))?;

        Ok(Self {
            store: Arc::from(store),
            prefix,
            location: location.to_string(),
        })
    }

    /// Read every object under the prefix into memory.
    ///
    /// Objects are processed in path order so repeated runs see the same
    /// sequence of rows.
    #[instrument(skip(self), fields(location = %self.location))]
    pub async fn read_all(&self) -> Result<Vec<SourceTable>, PipelineError> {
        let mut objects: Vec<ObjectMeta> = self
            .store
            .list(Some(&self.prefix))
            .try_collect()
            .await
            .map_err(|e| PipelineError::storage(e.to_string()))?;

        if objects.is_empty() {
            warn!("No objects found under input prefix");
            return Ok(Vec::new());
        }

        objects.sort_by(|a, b| a.location.as_ref().cmp(b.location.as_ref()));

        let mut tables = Vec::with_capacity(objects.len());
        for meta in &objects {
            let bytes = self
                .store
                .get(&meta.location)
                .await
                .map_err(|e| PipelineError::storage(format!("{}: {}", meta.location, e)))?
                .bytes()
                .await
                .map_err(|e| PipelineError::storage(format!("{}: {}", meta.location, e)))?;

            let table = decode_table(meta.location.as_ref(), bytes.as_ref())?;
            debug!(path = %table.path, rows = table.rows.len(), "Decoded source object");
            tables.push(table);
        }

        let total: usize = tables.iter().map(|t| t.rows.len()).sum();
        info!(objects = tables.len(), rows = total, "Finished reading input");
        Ok(tables)
    }
}

/// Decompress and parse one gzip CSV object.
///
/// Parsing is lenient: rows the CSV engine cannot yield are logged and
/// skipped rather than failing the file. An object that cannot be
/// decompressed or has no readable header fails the job.
fn decode_table(path: &str, compressed: &[u8]) -> Result<SourceTable, PipelineError> {
    let decoder = MultiGzDecoder::new(compressed);
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(b',')
        .quote(b'"')
        .flexible(true)
        .from_reader(decoder);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| PipelineError::csv(format!("{}: {}", path, e)))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        match record {
            Ok(record) => rows.push(record.iter().map(str::to_string).collect()),
            Err(e) => {
                warn!(path = %path, error = %e, "Skipping unreadable CSV record");
            }
        }
    }

    Ok(SourceTable {
        path: path.to_string(),
        headers,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use object_store::memory::InMemory;
    use std::io::Write;

    fn gzip(text: &str) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(text.as_bytes()).unwrap();
        encoder.finish().unwrap()
    }

    async fn store_with(objects: &[(&str, &str)]) -> Arc<dyn ObjectStore> {
        let store = InMemory::new();
        for (path, csv) in objects {
            store
                .put(&Path::from(*path), gzip(csv).into())
                .await
                .unwrap();
        }
        Arc::new(store)
    }

    #[tokio::test]
    async fn test_reads_gzip_csv_with_header() {
        let store = store_with(&[(
            "input/transactions.csv.gz",
            "sequence_number,amount\n100,12.50\n101,3.00\n",
        )])
        .await;
        let reader = StorageReader::new(store, Path::from("input"));

        let tables = reader.read_all().await.unwrap();

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].headers, vec!["sequence_number", "amount"]);
        assert_eq!(tables[0].rows.len(), 2);
        assert_eq!(tables[0].rows[0], vec!["100", "12.50"]);
    }

    #[tokio::test]
    async fn test_listing_is_recursive_and_ordered() {
        let store = store_with(&[
            ("input/2024/02/b.csv.gz", "sequence_number\n2\n"),
            ("input/2024/01/a.csv.gz", "sequence_number\n1\n"),
        ])
        .await;
        let reader = StorageReader::new(store, Path::from("input"));

        let tables = reader.read_all().await.unwrap();

        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].path, "input/2024/01/a.csv.gz");
        assert_eq!(tables[1].path, "input/2024/02/b.csv.gz");
    }

    #[tokio::test]
    async fn test_empty_prefix_yields_no_tables() {
        let store: Arc<dyn ObjectStore> = Arc::new(InMemory::new());
        let reader = StorageReader::new(store, Path::from("input"));

        let tables = reader.read_all().await.unwrap();

        assert!(tables.is_empty());
    }

    #[tokio::test]
    async fn test_objects_outside_prefix_are_ignored() {
        let store = store_with(&[
            ("input/a.csv.gz", "sequence_number\n1\n"),
            ("other/b.csv.gz", "sequence_number\n2\n"),
        ])
        .await;
        let reader = StorageReader::new(store, Path::from("input"));

        let tables = reader.read_all().await.unwrap();

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].path, "input/a.csv.gz");
    }

    #[tokio::test]
    async fn test_quoted_fields_keep_embedded_commas() {
        let store = store_with(&[(
            "input/a.csv.gz",
            "sequence_number,operation\n1,\"transfer, internal\"\n",
        )])
        .await;
        let reader = StorageReader::new(store, Path::from("input"));

        let tables = reader.read_all().await.unwrap();

        assert_eq!(tables[0].rows[0][1], "transfer, internal");
    }

    #[tokio::test]
    async fn test_undecodable_object_fails_the_read() {
        let store = InMemory::new();
        store
            .put(&Path::from("input/garbage.csv.gz"), b"not gzip".to_vec().into())
            .await
            .unwrap();
        let reader = StorageReader::new(Arc::new(store), Path::from("input"));

        let result = reader.read_all().await;

        assert!(matches!(result, Err(PipelineError::CsvError(_))));
    }
}
