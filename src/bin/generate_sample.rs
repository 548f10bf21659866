//! Writes demo estimates for `comparison-plot` in every supported format:
//! `sample_mapping.json`, `sample_flat.csv` and `sample_flat.parquet`.
//!
//! Usage: `generate_sample [OUTPUT_DIR]`

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde_json::{json, Map, Value};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// One generated `(model, parameter)` estimate.
struct Row {
    model: &'static str,
    param: &'static str,
    group: &'static str,
    value: f64,
    lower: f64,
    upper: f64,
}

// (parameter, group, true value, sampling std)
const PARAMETERS: [(&str, &str, f64, f64); 5] = [
    ("alpha", "intercepts", 0.8, 0.15),
    ("beta_income", "slopes", 1.4, 0.2),
    ("beta_age", "slopes", -0.3, 0.05),
    ("beta_educ", "slopes", 0.6, 0.1),
    ("sigma", "variances", 2.1, 0.3),
];

// (model, efficiency: multiplies the sampling std)
const MODELS: [(&str, f64); 4] = [("ols", 1.0), ("iv", 1.8), ("gmm", 1.4), ("bayes", 0.9)];

fn generate(rng: &mut SimpleRng) -> Vec<Row> {
    let mut rows = Vec::new();
    for &(model, efficiency) in &MODELS {
        for &(param, group, truth, sd) in &PARAMETERS {
            let se = sd * efficiency;
            let value = rng.gauss(truth, se);
            rows.push(Row {
                model,
                param,
                group,
                value,
                lower: value - 1.96 * se,
                upper: value + 1.96 * se,
            });
        }
    }
    rows
}

fn write_mapping(path: &PathBuf, rows: &[Row]) -> Result<()> {
    let mut models = Map::new();
    for row in rows {
        let table = models
            .entry(row.model)
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(table) = table {
            table.insert(
                row.param.to_string(),
                json!({ "params": row.value, "lower": row.lower, "upper": row.upper }),
            );
        }
    }
    let text = serde_json::to_string_pretty(&Value::Object(models))?;
    std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}

fn write_csv(path: &PathBuf, rows: &[Row]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(["model", "param_name", "param_value", "ci_lower", "ci_upper", "group"])?;
    for row in rows {
        writer.write_record([
            row.model.to_string(),
            row.param.to_string(),
            row.value.to_string(),
            row.lower.to_string(),
            row.upper.to_string(),
            row.group.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &PathBuf, rows: &[Row]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("model", DataType::Utf8, false),
        Field::new("param_name", DataType::Utf8, false),
        Field::new("param_value", DataType::Float64, false),
        Field::new("ci_lower", DataType::Float64, true),
        Field::new("ci_upper", DataType::Float64, true),
        Field::new("group", DataType::Utf8, true),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(rows.iter().map(|r| r.model).collect::<Vec<_>>())),
            Arc::new(StringArray::from(rows.iter().map(|r| r.param).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(rows.iter().map(|r| r.value).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(rows.iter().map(|r| r.lower).collect::<Vec<_>>())),
            Arc::new(Float64Array::from(rows.iter().map(|r| r.upper).collect::<Vec<_>>())),
            Arc::new(StringArray::from(rows.iter().map(|r| r.group).collect::<Vec<_>>())),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    let out_dir = PathBuf::from(std::env::args().nth(1).unwrap_or_else(|| ".".to_string()));
    std::fs::create_dir_all(&out_dir)?;

    let mut rng = SimpleRng::new(42);
    let rows = generate(&mut rng);

    write_mapping(&out_dir.join("sample_mapping.json"), &rows)?;
    write_csv(&out_dir.join("sample_flat.csv"), &rows)?;
    write_parquet(&out_dir.join("sample_flat.parquet"), &rows)?;

    println!(
        "Wrote {} estimates ({} models × {} parameters) to {}",
        rows.len(),
        MODELS.len(),
        PARAMETERS.len(),
        out_dir.display()
    );
    Ok(())
}
