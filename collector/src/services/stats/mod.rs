//! # JSON statistics aggregation service
//!
//! Folds the per-submission JSON documents of a data-collection task into
//! one statistical report, driven by the task's table schema.
//!
//! ## Workflow:
//!
//! 1. **Schema**: the schema document is loaded and per-column merge-mode
//!    overrides are applied. A `GroupBy` column without a group-by field is
//!    a configuration error raised before anything is read.
//!
//! 2. **Documents**: the source folder is enumerated (sorted, so category
//!    insertion order is reproducible). Each document must be a flat JSON
//!    object whose values match the schema's declared types; malformed
//!    documents are skipped and counted, never aborting the run.
//!
//! 3. **Folding**: `Accumulate` columns sum numbers and count occurrences
//!    of boolean/text values; `GroupBy` columns partition the documents by
//!    the group field's value and apply the same tally within each group.
//!    Missing values are excluded from the tallies, not coerced.
//!
//! 4. **Report**: one JSON object, keyed in schema column order, with
//!    group and category keys in first-seen order, written atomically.

use crate::coordinator::IoCoordinator;
use crate::error::{CollectorError, CollectorResult};
use crate::fs::FileStore;
use common::model::merge::MergeResult;
use common::model::schema::{ColumnType, MergeMode, TableSchema};
use log::{info, warn};
use serde_json::{Map as JsMap, Value as JsValue};
use std::collections::HashMap;
use std::path::PathBuf;

/// Parameters of one aggregation run.
#[derive(Debug, Clone)]
pub struct AggregateOptions {
    pub schema_path: PathBuf,
    pub source_dir: PathBuf,
    pub output_path: PathBuf,
    /// Per-column merge-mode overrides applied on top of the schema.
    pub merge_mode_overrides: HashMap<String, MergeMode>,
}

impl AggregateOptions {
    pub fn new(
        schema_path: impl Into<PathBuf>,
        source_dir: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        AggregateOptions {
            schema_path: schema_path.into(),
            source_dir: source_dir.into(),
            output_path: output_path.into(),
            merge_mode_overrides: HashMap::new(),
        }
    }
}

/// How one column is folded, after configuration validation.
enum ColumnPlan {
    Accumulate,
    GroupBy { field: String },
}

pub struct JsonStatisticsAggregator<F> {
    fs: F,
    lock: IoCoordinator,
}

impl<F: FileStore> JsonStatisticsAggregator<F> {
    pub fn new(fs: F, lock: IoCoordinator) -> Self {
        JsonStatisticsAggregator { fs, lock }
    }

    pub async fn aggregate(&self, opts: &AggregateOptions) -> CollectorResult<MergeResult> {
        let _guard = self.lock.acquire().await;

        let raw = self.fs.read_to_string(&opts.schema_path)?;
        let mut schema: TableSchema =
            serde_json::from_str(&raw).map_err(|e| CollectorError::SchemaParse {
                path: opts.schema_path.clone(),
                source: e,
            })?;
        for column in &mut schema.columns {
            if let Some(mode) = opts.merge_mode_overrides.get(&column.name) {
                column.merge_mode = *mode;
            }
        }
        let plans = plan_columns(&schema)?;

        let files = self.fs.list_with_extension(&opts.source_dir, "json")?;
        if files.is_empty() {
            return Err(CollectorError::EmptySourceFolder {
                path: opts.source_dir.clone(),
            });
        }

        let mut result = MergeResult::new();
        let mut documents: Vec<JsMap<String, JsValue>> = Vec::new();
        for path in &files {
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();
            match self
                .fs
                .read_to_string(path)
                .map_err(|e| e.to_string())
                .and_then(|text| parse_document(&text, &schema))
            {
                Ok(doc) => {
                    documents.push(doc);
                    result.files_merged += 1;
                }
                Err(detail) => {
                    warn!("skipping {}: {}", path.display(), detail);
                    result.record_failure(format!("{}: {}", name, detail));
                }
            }
        }
        if documents.is_empty() {
            return Err(CollectorError::NoReadableFiles {
                path: opts.source_dir.clone(),
            });
        }

        let mut report: JsMap<String, JsValue> = JsMap::new();
        for (column, plan) in schema.columns.iter().zip(&plans) {
            let value = match plan {
                ColumnPlan::Accumulate => {
                    tally_column(documents.iter(), &column.name, column.column_type)
                }
                ColumnPlan::GroupBy { field } => {
                    let mut grouped: JsMap<String, JsValue> = JsMap::new();
                    for (key, members) in partition_by(&documents, field) {
                        let tally =
                            tally_column(members.into_iter(), &column.name, column.column_type);
                        grouped.insert(key, tally);
                    }
                    JsValue::Object(grouped)
                }
            };
            report.insert(column.name.clone(), value);
        }

        let pretty = serde_json::to_string_pretty(&JsValue::Object(report))
            .map_err(|e| CollectorError::io(&opts.output_path, std::io::Error::other(e)))?;
        self.fs.write_atomic(&opts.output_path, pretty.as_bytes())?;

        result.rows_merged = documents.len() as u32;
        result.success = true;
        info!(
            "aggregated {} documents into {} ({} skipped)",
            result.files_merged,
            opts.output_path.display(),
            result.files_failed
        );
        Ok(result)
    }
}

/// Validates the configuration and pins down each column's fold strategy.
/// Exhaustive over [`MergeMode`], so a new mode will not compile until it is
/// handled here.
fn plan_columns(schema: &TableSchema) -> CollectorResult<Vec<ColumnPlan>> {
    schema
        .columns
        .iter()
        .map(|column| match column.merge_mode {
            MergeMode::Accumulate => Ok(ColumnPlan::Accumulate),
            MergeMode::GroupBy => match &column.group_by_field {
                Some(field) => Ok(ColumnPlan::GroupBy {
                    field: field.clone(),
                }),
                None => Err(CollectorError::GroupByMissingField {
                    column: column.name.clone(),
                }),
            },
        })
        .collect()
}

/// Parses and type-checks one submission document against the schema.
///
/// A parse failure, a non-object root or a value that contradicts a
/// column's declared type makes the whole document malformed; missing and
/// null values are fine.
fn parse_document(text: &str, schema: &TableSchema) -> Result<JsMap<String, JsValue>, String> {
    let value: JsValue = serde_json::from_str(text).map_err(|e| e.to_string())?;
    let object = match value {
        JsValue::Object(map) => map,
        _ => return Err("document is not a JSON object".to_string()),
    };
    for column in &schema.columns {
        if let Some(v) = object.get(&column.name) {
            if !value_matches(v, column.column_type) {
                return Err(format!(
                    "column '{}' has the wrong type for {:?}",
                    column.name, column.column_type
                ));
            }
        }
    }
    Ok(object)
}

fn value_matches(value: &JsValue, column_type: ColumnType) -> bool {
    match (column_type, value) {
        (_, JsValue::Null) => true,
        (ColumnType::Number, v) => v.is_number(),
        (ColumnType::Boolean, v) => v.is_boolean(),
        (ColumnType::Text | ColumnType::Date, v) => v.is_string(),
    }
}

/// Tally of one column over a set of documents: numbers sum, everything
/// else counts occurrences per distinct value (keys in first-seen order).
fn tally_column<'a, I>(documents: I, column: &str, column_type: ColumnType) -> JsValue
where
    I: Iterator<Item = &'a JsMap<String, JsValue>>,
{
    match column_type {
        ColumnType::Number => {
            let mut sum = 0.0f64;
            for doc in documents {
                if let Some(n) = doc.get(column).and_then(JsValue::as_f64) {
                    sum += n;
                }
            }
            number_value(sum)
        }
        ColumnType::Boolean | ColumnType::Text | ColumnType::Date => {
            let mut counts: JsMap<String, JsValue> = JsMap::new();
            for doc in documents {
                let Some(key) = doc.get(column).and_then(category_key) else {
                    continue;
                };
                let next = counts.get(&key).and_then(JsValue::as_u64).unwrap_or(0) + 1;
                counts.insert(key, JsValue::from(next));
            }
            JsValue::Object(counts)
        }
    }
}

/// Partitions documents by the group field's value, group keys in
/// first-seen order. Documents without a group value are excluded from the
/// breakdown, mirroring how missing values are excluded from tallies.
fn partition_by<'a>(
    documents: &'a [JsMap<String, JsValue>],
    field: &str,
) -> Vec<(String, Vec<&'a JsMap<String, JsValue>>)> {
    let mut groups: Vec<(String, Vec<&JsMap<String, JsValue>>)> = Vec::new();
    for doc in documents {
        let Some(key) = doc.get(field).and_then(category_key) else {
            continue;
        };
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(doc),
            None => groups.push((key, vec![doc])),
        }
    }
    groups
}

fn category_key(value: &JsValue) -> Option<String> {
    match value {
        JsValue::String(s) => Some(s.clone()),
        JsValue::Bool(b) => Some(b.to_string()),
        JsValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Sums that land on a whole number are reported as integers.
fn number_value(sum: f64) -> JsValue {
    if sum.fract() == 0.0 && sum.abs() < i64::MAX as f64 {
        JsValue::from(sum as i64)
    } else {
        serde_json::Number::from_f64(sum)
            .map(JsValue::Number)
            .unwrap_or(JsValue::Null)
    }
}
