use anyhow::{Result, bail};
use jsonify::Record;
use serde_json::Value;

/// Read exported rows: either a JSON array of objects, or one JSON object
/// per line.
pub fn parse_rows(input: &str) -> Result<Vec<Record>> {
    let trimmed = input.trim_start();

    if trimmed.starts_with('[') {
        let values: Vec<Value> = serde_json::from_str(trimmed)?;
        return values
            .into_iter()
            .enumerate()
            .map(|(i, value)| into_record(value, || format!("row {}", i + 1)))
            .collect();
    }

    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            let value: Value = serde_json::from_str(line)
                .map_err(|e| anyhow::anyhow!("line {}: {e}", i + 1))?;
            into_record(value, || format!("line {}", i + 1))
        })
        .collect()
}

fn into_record(value: Value, location: impl FnOnce() -> String) -> Result<Record> {
    match value {
        Value::Object(record) => Ok(record),
        other => bail!("{} is not a record: {other}", location()),
    }
}
