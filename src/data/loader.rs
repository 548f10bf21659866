use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, Float32Array, Float64Array, Int32Array, Int64Array, LargeStringArray, StringArray};
use arrow::datatypes::{DataType, Schema};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use super::builder::build_table;
use super::model::{ComparisonTable, Interval, ModelEstimates, ParameterEstimate, ParameterRecord};
use crate::error::BuildError;

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------
//
// Canonical names come first. The remaining spellings are accepted on input
// only and never leave this module.

const MODEL: &[&str] = &["model", "models"];
const PARAM_NAME: &[&str] = &["param_name", "param_names", "parameter"];
const PARAM_VALUE: &[&str] = &["param_value", "params"];
const CI_LOWER: &[&str] = &["ci_lower", "lower", "conf_int_lower"];
const CI_UPPER: &[&str] = &["ci_upper", "upper", "conf_int_upper"];
const GROUP: &[&str] = &["group"];
const COLOR: &[&str] = &["color"];

/// `std` is derived on build, so an incoming one is dropped silently.
const IGNORED: &[&str] = &["std"];

/// Columns that are neither a known name nor an alias, each listed once.
fn unknown_columns<'a>(columns: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
    let known = [MODEL, PARAM_NAME, PARAM_VALUE, CI_LOWER, CI_UPPER, GROUP, COLOR, IGNORED];
    let mut unknown: Vec<&str> = Vec::new();
    for column in columns {
        if !known.iter().any(|names| names.contains(&column)) && !unknown.contains(&column) {
            unknown.push(column);
        }
    }
    unknown
}

fn warn_unknown_columns<'a>(source: &str, columns: impl IntoIterator<Item = &'a str>) {
    for column in unknown_columns(columns) {
        log::warn!("{source}: ignoring unknown column '{column}'");
    }
}

/// Keys of every object among `records`.
fn record_keys<'a>(records: impl IntoIterator<Item = &'a JsonValue>) -> impl Iterator<Item = &'a str> {
    records
        .into_iter()
        .filter_map(JsonValue::as_object)
        .flat_map(|record| record.keys().map(String::as_str))
}

/// One input record with every column optional; required columns are
/// checked when converting to a [`ParameterEstimate`].
#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(alias = "models")]
    model: Option<String>,
    #[serde(alias = "param_names", alias = "parameter")]
    param_name: Option<String>,
    #[serde(alias = "params")]
    param_value: Option<f64>,
    #[serde(alias = "lower", alias = "conf_int_lower")]
    ci_lower: Option<f64>,
    #[serde(alias = "upper", alias = "conf_int_upper")]
    ci_upper: Option<f64>,
    group: Option<String>,
    color: Option<String>,
}

impl RawRow {
    fn into_estimate(self, source: &str) -> Result<ParameterEstimate, BuildError> {
        let missing = |column| BuildError::MissingColumn {
            table: source.to_string(),
            column,
        };
        let model = self.model.ok_or_else(|| missing(MODEL[0]))?;
        let param_name = self.param_name.ok_or_else(|| missing(PARAM_NAME[0]))?;
        let param_value = self.param_value.ok_or_else(|| missing(PARAM_VALUE[0]))?;

        let mut row = ParameterEstimate::new(model, param_name, param_value);
        row.ci_lower = self.ci_lower;
        row.ci_upper = self.ci_upper;
        if let Some(group) = self.group.filter(|g| !g.is_empty()) {
            row = row.with_group(group);
        }
        if let Some(color) = self.color.filter(|c| !c.is_empty()) {
            row = row.with_color(color);
        }
        Ok(row)
    }

    /// Convert a per-model record; `model` and `param_name` come from the keys.
    fn into_record(self, model: &str, param: &str) -> Result<ParameterRecord, BuildError> {
        let value = self.param_value.ok_or_else(|| BuildError::MissingColumn {
            table: model.to_string(),
            column: PARAM_VALUE[0],
        })?;
        let interval = Interval::from_bounds(model, param, self.ci_lower, self.ci_upper)?;
        Ok(ParameterRecord {
            interval,
            ..ParameterRecord::new(param, value)
        })
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a comparison table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.json`    – either the model → parameter table mapping
///   (`{ "ols": { "beta": { "param_value": 1.0, "ci_lower": .. } } }`)
///   or an array of flat records
/// * `.csv`     – flat table with a header row
/// * `.parquet` – flat table
pub fn load_file(path: &Path) -> Result<ComparisonTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let source = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("input")
        .to_string();

    let table = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path, &source),
        "json" => {
            let text = std::fs::read_to_string(path).context("reading JSON file")?;
            parse_json(&text, &source)
        }
        "csv" => {
            let file = std::fs::File::open(path).context("opening CSV")?;
            parse_csv(file, &source)
        }
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::info!(
        "Loaded {} rows ({} models, {} groups) from {}",
        table.len(),
        table.models().len(),
        table.groups().len(),
        path.display()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Parse JSON text: an object is a model mapping, an array is flat records.
pub fn parse_json(text: &str, source: &str) -> Result<ComparisonTable> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;

    match root {
        JsonValue::Object(models) => {
            warn_unknown_columns(
                source,
                record_keys(
                    models
                        .values()
                        .filter_map(JsonValue::as_object)
                        .flat_map(|table| table.values()),
                ),
            );
            let estimates = mapping_from_json(&models)?;
            Ok(build_table(&estimates)?)
        }
        JsonValue::Array(records) => {
            warn_unknown_columns(source, record_keys(&records));
            let rows = records
                .into_iter()
                .enumerate()
                .map(|(i, rec)| {
                    let raw: RawRow = serde_json::from_value(rec)
                        .with_context(|| format!("Row {i}: not a valid record"))?;
                    Ok(raw.into_estimate(source)?)
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(ComparisonTable::from_rows(rows)?)
        }
        _ => bail!("Expected a JSON object (model mapping) or array (flat records)"),
    }
}

/// Read `{ model: { param: record } }`, keeping document order.
fn mapping_from_json(models: &Map<String, JsonValue>) -> Result<Vec<ModelEstimates>> {
    models
        .iter()
        .map(|(model, table)| {
            let table = table
                .as_object()
                .with_context(|| format!("Model '{model}': expected an object keyed by parameter"))?;

            let params = table
                .iter()
                .map(|(param, record)| {
                    let raw: RawRow = serde_json::from_value(record.clone())
                        .with_context(|| format!("Model '{model}', parameter '{param}'"))?;
                    Ok(raw.into_record(model, param)?)
                })
                .collect::<Result<Vec<_>>>()?;

            Ok(ModelEstimates::new(model.clone(), params))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one `(model, parameter)` per
/// line. Empty cells are missing values; unknown columns are ignored.
pub fn parse_csv<R: std::io::Read>(input: R, source: &str) -> Result<ComparisonTable> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader.headers().context("reading CSV headers")?.clone();
    warn_unknown_columns(source, headers.iter());
    for required in [MODEL, PARAM_NAME, PARAM_VALUE] {
        if !required.iter().any(|name| headers.iter().any(|h| h == *name)) {
            return Err(BuildError::MissingColumn {
                table: source.to_string(),
                column: required[0],
            }
            .into());
        }
    }

    let rows = reader
        .deserialize::<RawRow>()
        .enumerate()
        .map(|(row_no, result)| {
            let raw = result.with_context(|| format!("CSV row {row_no}"))?;
            Ok(raw.into_estimate(source)?)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ComparisonTable::from_rows(rows)?)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a flat comparison table from Parquet.
///
/// Name columns must be Utf8/LargeUtf8; numeric columns may be Float64,
/// Float32, Int64 or Int32. Nulls are missing values. Works with files
/// written by both **Pandas** (`df.to_parquet()`) and **Polars**.
fn load_parquet(path: &Path, source: &str) -> Result<ComparisonTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let schema = builder.schema().clone();
    warn_unknown_columns(source, schema.fields().iter().map(|f| f.name().as_str()));

    // Checked against the file schema so that a file without rows still
    // reports its missing columns.
    let required = |names: &[&'static str]| -> Result<usize> {
        find_column(&schema, names).ok_or_else(|| {
            BuildError::MissingColumn {
                table: source.to_string(),
                column: names[0],
            }
            .into()
        })
    };
    let model_idx = required(MODEL)?;
    let name_idx = required(PARAM_NAME)?;
    let value_idx = required(PARAM_VALUE)?;
    let lower_idx = find_column(&schema, CI_LOWER);
    let upper_idx = find_column(&schema, CI_UPPER);
    let group_idx = find_column(&schema, GROUP);
    let color_idx = find_column(&schema, COLOR);

    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;

        for row in 0..batch.num_rows() {
            let text = |idx: Option<usize>| -> Result<Option<String>> {
                idx.map(|i| string_at(batch.column(i), row))
                    .transpose()
                    .map(Option::flatten)
            };
            let number = |idx: Option<usize>| -> Result<Option<f64>> {
                idx.map(|i| f64_at(batch.column(i), row))
                    .transpose()
                    .map(Option::flatten)
            };

            let raw = RawRow {
                model: text(Some(model_idx))?,
                param_name: text(Some(name_idx))?,
                param_value: number(Some(value_idx))?,
                ci_lower: number(lower_idx)?,
                ci_upper: number(upper_idx)?,
                group: text(group_idx)?,
                color: text(color_idx)?,
            };
            let row_no = rows.len();
            rows.push(
                raw.into_estimate(source)
                    .with_context(|| format!("Row {row_no}"))?,
            );
        }
    }

    Ok(ComparisonTable::from_rows(rows)?)
}

// -- Parquet / Arrow helpers --

fn find_column(schema: &Schema, names: &[&str]) -> Option<usize> {
    names.iter().find_map(|name| schema.index_of(name).ok())
}

/// Extract an optional string from a Utf8 or LargeUtf8 column.
fn string_at(col: &Arc<dyn Array>, row: usize) -> Result<Option<String>> {
    if col.is_null(row) {
        return Ok(None);
    }
    let value = match col.data_type() {
        DataType::Utf8 => col
            .as_any()
            .downcast_ref::<StringArray>()
            .context("expected StringArray")?
            .value(row),
        DataType::LargeUtf8 => col
            .as_any()
            .downcast_ref::<LargeStringArray>()
            .context("expected LargeStringArray")?
            .value(row),
        other => bail!("Expected a string column, got {other:?}"),
    };
    Ok(Some(value.to_string()))
}

/// Extract an optional number from a float or integer column.
fn f64_at(col: &Arc<dyn Array>, row: usize) -> Result<Option<f64>> {
    if col.is_null(row) {
        return Ok(None);
    }
    let any = col.as_any();
    let value = match col.data_type() {
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .context("expected Float64Array")?
            .value(row),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .context("expected Float32Array")?
            .value(row) as f64,
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .context("expected Int64Array")?
            .value(row) as f64,
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .context("expected Int32Array")?
            .value(row) as f64,
        other => bail!("Expected a numeric column, got {other:?}"),
    };
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use arrow::datatypes::Field;
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    use super::*;
    use crate::data::model::RowId;

    fn build_error(err: &anyhow::Error) -> &BuildError {
        err.downcast_ref::<BuildError>()
            .unwrap_or_else(|| panic!("expected a BuildError, got {err:#}"))
    }

    #[test]
    fn json_mapping_keeps_document_order() {
        let text = r#"{
            "zeta": { "b": { "param_value": 2.0 }, "a": { "param_value": 1.0, "ci_lower": 0.5, "ci_upper": 1.5 } },
            "alpha": { "a": { "param_value": 1.2 } }
        }"#;
        let table = parse_json(text, "t.json").unwrap();

        assert_eq!(table.models(), ["zeta", "alpha"]);
        let names: Vec<&str> = table.rows().iter().map(|r| r.param_name.as_str()).collect();
        assert_eq!(names, ["b", "a", "a"]);
        assert_eq!(table.row(RowId(1)).unwrap().std, Some(0.25));
    }

    #[test]
    fn json_mapping_accepts_legacy_column_names() {
        let text = r#"{
            "m1": { "A": { "params": 1.0, "lower": 0.5, "upper": 1.5 } },
            "m2": { "A": { "params": 2.0, "conf_int_lower": 1.0, "conf_int_upper": 4.0 } }
        }"#;
        let table = parse_json(text, "t.json").unwrap();
        assert_eq!(table.rows()[0].ci_lower, Some(0.5));
        assert_eq!(table.rows()[1].std, Some(0.75));
    }

    #[test]
    fn json_null_bounds_are_absent() {
        let text = r#"{ "m": { "A": { "param_value": 1.0, "ci_lower": null, "ci_upper": null } } }"#;
        let table = parse_json(text, "t.json").unwrap();
        assert_eq!(table.rows()[0].interval(), None);
    }

    #[test]
    fn json_mapping_without_point_column_fails() {
        let text = r#"{ "m": { "A": { "ci_lower": 0.0, "ci_upper": 1.0 } } }"#;
        let err = parse_json(text, "t.json").unwrap_err();
        assert_eq!(
            build_error(&err),
            &BuildError::MissingColumn {
                table: "m".into(),
                column: "param_value"
            }
        );
    }

    #[test]
    fn json_empty_mapping_fails() {
        let err = parse_json("{}", "t.json").unwrap_err();
        assert_eq!(build_error(&err), &BuildError::EmptyInput);
    }

    #[test]
    fn json_flat_records() {
        let text = r#"[
            { "model": "m", "param_name": "a", "param_value": 1.0, "group": "g1", "color": "red" },
            { "model": "m", "param_name": "b", "param_value": 2.0, "ci_lower": 1.0, "ci_upper": 3.0 }
        ]"#;
        let table = parse_json(text, "t.json").unwrap();
        assert_eq!(table.groups(), ["g1", "all"]);
        assert_eq!(table.rows()[0].color.as_deref(), Some("red"));
        assert_eq!(table.rows()[1].std, Some(0.5));
    }

    #[test]
    fn json_scalar_is_rejected() {
        assert!(parse_json("42", "t.json").is_err());
    }

    #[test]
    fn csv_with_empty_cells() {
        let text = "\
model,param_name,param_value,ci_lower,ci_upper,group
ols,a,1.0,0.5,1.5,level
ols,b,2.0,,,
iv,a,1.1,0.9,1.3,level
";
        let table = parse_csv(text.as_bytes(), "t.csv").unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows()[1].interval(), None);
        assert_eq!(table.rows()[1].group, None);
        assert_eq!(table.groups(), ["level", "all"]);
    }

    #[test]
    fn csv_missing_required_column() {
        let text = "model,param_value\nols,1.0\n";
        let err = parse_csv(text.as_bytes(), "t.csv").unwrap_err();
        assert_eq!(
            build_error(&err),
            &BuildError::MissingColumn {
                table: "t.csv".into(),
                column: "param_name"
            }
        );
    }

    #[test]
    fn csv_half_interval_fails() {
        let text = "model,param_name,param_value,lower,upper\nols,a,1.0,0.5,\n";
        let err = parse_csv(text.as_bytes(), "t.csv").unwrap_err();
        assert!(matches!(build_error(&err), BuildError::UnpairedBound { .. }));
    }

    #[test]
    fn dispatch_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let csv_path = dir.path().join("estimates.csv");
        let mut f = std::fs::File::create(&csv_path).unwrap();
        writeln!(f, "models,param_names,params").unwrap();
        writeln!(f, "m,a,1.0").unwrap();
        drop(f);
        assert_eq!(load_file(&csv_path).unwrap().len(), 1);

        let txt_path = dir.path().join("estimates.txt");
        std::fs::write(&txt_path, "irrelevant").unwrap();
        let err = load_file(&txt_path).unwrap_err();
        assert!(format!("{err:#}").contains("Unsupported file extension: .txt"));
    }

    #[test]
    fn parquet_flat_table() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("model", DataType::Utf8, false),
            Field::new("param_name", DataType::Utf8, false),
            Field::new("param_value", DataType::Float64, false),
            Field::new("conf_int_lower", DataType::Float64, true),
            Field::new("conf_int_upper", DataType::Float64, true),
            Field::new("group", DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["ols", "iv"])),
                Arc::new(StringArray::from(vec!["a", "a"])),
                Arc::new(Float64Array::from(vec![1.0, 2.0])),
                Arc::new(Float64Array::from(vec![Some(0.0), None])),
                Arc::new(Float64Array::from(vec![Some(2.0), None])),
                Arc::new(StringArray::from(vec![Some("g"), None])),
            ],
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flat.parquet");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = load_file(&path).unwrap();
        assert_eq!(table.models(), ["ols", "iv"]);
        assert_eq!(table.rows()[0].std, Some(0.5));
        assert_eq!(table.rows()[1].interval(), None);
        assert_eq!(table.groups(), ["g", "all"]);
    }

    #[test]
    fn unknown_json_keys_are_reported_once() {
        let text = r#"{
            "ols": { "a": { "param_value": 1.0, "pvalue": 0.01 }, "b": { "params": 2.0, "pvalue": 0.2, "std": 9.0 } },
            "iv": { "a": { "param_value": 1.1, "lower": 0.9, "upper": 1.3, "tstat": 3.1 } }
        }"#;
        let root: JsonValue = serde_json::from_str(text).unwrap();
        let tables: Vec<&JsonValue> = root
            .as_object()
            .unwrap()
            .values()
            .flat_map(|t| t.as_object().unwrap().values())
            .collect();
        assert_eq!(unknown_columns(record_keys(tables)), ["pvalue", "tstat"]);

        let flat: JsonValue =
            serde_json::from_str(r#"[{ "model": "m", "param_name": "a", "param_value": 1.0, "pvalue": 0.5 }]"#)
                .unwrap();
        assert_eq!(
            unknown_columns(record_keys(flat.as_array().unwrap())),
            ["pvalue"]
        );

        // Extra keys are ignored, not rejected.
        assert_eq!(parse_json(text, "t.json").unwrap().len(), 3);
    }

    #[test]
    fn parquet_without_rows_still_reports_missing_column() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("model", DataType::Utf8, false),
            Field::new("param_name", DataType::Utf8, false),
        ]));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.parquet");
        let file = std::fs::File::create(&path).unwrap();
        let writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.close().unwrap();

        let err = load_file(&path).unwrap_err();
        assert_eq!(
            build_error(&err),
            &BuildError::MissingColumn {
                table: "empty.parquet".into(),
                column: "param_value"
            }
        );
    }
}
