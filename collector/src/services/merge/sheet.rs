use crate::coordinator::IoCoordinator;
use crate::error::{CollectorError, CollectorResult};
use crate::fs::FileStore;
use crate::services::merge::dedup::{dedup_rows, Row};
use crate::services::submissions::{group_by_identity, select_latest};
use common::model::merge::MergeResult;
use log::{info, warn};
use std::path::{Path, PathBuf};

/// Parameters of one merge run.
#[derive(Debug, Clone)]
pub struct MergeOptions {
    pub source_dir: PathBuf,
    pub output_path: PathBuf,
    pub remove_duplicates: bool,
    /// Columns forming the deduplication key, in key order.
    pub dedup_columns: Vec<String>,
    /// Separator joining the key components.
    pub dedup_separator: String,
    /// Optional spreadsheet whose header row defines the output columns.
    pub template_path: Option<PathBuf>,
    /// Physical index of the header row in every source file; rows above it
    /// are ignored.
    pub header_row_index: usize,
}

impl MergeOptions {
    pub fn new(source_dir: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        MergeOptions {
            source_dir: source_dir.into(),
            output_path: output_path.into(),
            remove_duplicates: false,
            dedup_columns: Vec::new(),
            dedup_separator: "|".to_string(),
            template_path: None,
            header_row_index: 0,
        }
    }
}

/// Folds the per-submission spreadsheets of a collection folder into one
/// output spreadsheet. See the module docs for the exact pass structure.
pub struct SheetMerger<F> {
    fs: F,
    lock: IoCoordinator,
}

impl<F: FileStore> SheetMerger<F> {
    pub fn new(fs: F, lock: IoCoordinator) -> Self {
        SheetMerger { fs, lock }
    }

    pub async fn merge(&self, opts: &MergeOptions) -> CollectorResult<MergeResult> {
        let _guard = self.lock.acquire().await;

        let files = self.fs.list_with_extension(&opts.source_dir, "csv")?;
        if files.is_empty() {
            return Err(CollectorError::EmptySourceFolder {
                path: opts.source_dir.clone(),
            });
        }

        // Template problems are configuration failures: raised before any
        // source file is read and before any output exists.
        let template_columns = match &opts.template_path {
            Some(path) => Some(self.read_template_header(path, opts.header_row_index)?),
            None => None,
        };

        let mut result = MergeResult::new();
        let mut source_columns: Vec<String> = Vec::new();
        let mut rows: Vec<Row> = Vec::new();

        for (identity, members) in group_by_identity(&files) {
            let names: Vec<&str> = members
                .iter()
                .map(|p| p.file_name().and_then(|n| n.to_str()).unwrap_or(""))
                .collect();
            let latest = select_latest(names.iter().copied())?
                .map(|name| name.to_string())
                .unwrap_or(identity);
            let Some(path) = members
                .iter()
                .find(|p| p.file_name().and_then(|n| n.to_str()) == Some(latest.as_str()))
            else {
                continue;
            };

            match self.read_rows(path, opts.header_row_index) {
                Ok((header, mut file_rows)) => {
                    for column in header {
                        if !source_columns.contains(&column) {
                            source_columns.push(column);
                        }
                    }
                    rows.append(&mut file_rows);
                    result.files_merged += 1;
                }
                Err(detail) => {
                    warn!("skipping {}: {}", path.display(), detail);
                    result.record_failure(format!("{}: {}", latest, detail));
                }
            }
        }

        if result.files_merged == 0 {
            return Err(CollectorError::NoReadableFiles {
                path: opts.source_dir.clone(),
            });
        }

        let output_columns = match template_columns {
            Some(template) => {
                if !template.iter().any(|c| source_columns.contains(c)) {
                    return Err(CollectorError::TemplateWithoutMatches {
                        path: opts
                            .template_path
                            .clone()
                            .unwrap_or_else(|| PathBuf::from("template")),
                    });
                }
                template
            }
            None => source_columns,
        };

        let (rows, removed) = if opts.remove_duplicates {
            dedup_rows(rows, &opts.dedup_columns, &opts.dedup_separator)
        } else {
            (rows, 0)
        };
        result.duplicates_removed = removed as u32;
        result.rows_merged = rows.len() as u32;

        self.write_sheet(&opts.output_path, &output_columns, &rows)?;
        result.success = true;
        info!(
            "merged {} files into {} ({} rows, {} duplicates removed, {} skipped)",
            result.files_merged,
            opts.output_path.display(),
            result.rows_merged,
            result.duplicates_removed,
            result.files_failed
        );
        Ok(result)
    }

    /// Reads one source file: the header row at `header_row_index`, then one
    /// `Row` per data record. Errors are strings because they end up in the
    /// result diagnostics, not in the error taxonomy.
    fn read_rows(&self, path: &Path, header_row_index: usize) -> Result<(Vec<String>, Vec<Row>), String> {
        let reader = self.fs.open_read(path).map_err(|e| e.to_string())?;
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut records = csv_reader.records();
        for _ in 0..header_row_index {
            match records.next() {
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.to_string()),
                None => return Err("file ends before the header row".to_string()),
            }
        }
        let header: Vec<String> = match records.next() {
            Some(Ok(record)) => record.iter().map(|c| c.trim().to_string()).collect(),
            Some(Err(e)) => return Err(e.to_string()),
            None => return Err("file ends before the header row".to_string()),
        };
        if header.iter().all(|c| c.is_empty()) {
            return Err("header row is empty".to_string());
        }

        let mut rows = Vec::new();
        for record in records {
            let record = record.map_err(|e| e.to_string())?;
            let mut row = Row::new();
            for (idx, cell) in record.iter().enumerate() {
                if let Some(column) = header.get(idx) {
                    row.insert(column.clone(), cell.to_string());
                }
            }
            rows.push(row);
        }
        Ok((header, rows))
    }

    fn read_template_header(
        &self,
        path: &Path,
        header_row_index: usize,
    ) -> CollectorResult<Vec<String>> {
        self.read_rows(path, header_row_index)
            .map(|(header, _)| header)
            .map_err(|detail| CollectorError::TemplateUnreadable {
                path: path.to_path_buf(),
                detail,
            })
    }

    fn write_sheet(&self, path: &Path, columns: &[String], rows: &[Row]) -> CollectorResult<()> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(columns)
            .map_err(|e| CollectorError::io(path, std::io::Error::other(e)))?;
        for row in rows {
            let record: Vec<&str> = columns
                .iter()
                .map(|c| row.get(c).map(String::as_str).unwrap_or(""))
                .collect();
            writer
                .write_record(&record)
                .map_err(|e| CollectorError::io(path, std::io::Error::other(e)))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| CollectorError::io(path, std::io::Error::other(e)))?;
        self.fs.write_atomic(path, &bytes)
    }
}
