use serde_json::Value;

use crate::models::weather::{PeriodRecord, Reading};

/// Top-level field listing the sols present in the feed, oldest first.
pub const SOL_KEYS_FIELD: &str = "sol_keys";

const TEMPERATURE_GROUP: &str = "AT";
const PRESSURE_GROUP: &str = "PRE";
const WIND_SPEED_GROUP: &str = "HWS";

const AVG_FIELD: &str = "av";
const MIN_FIELD: &str = "mn";
const MAX_FIELD: &str = "mx";

const START_TIME_FIELD: &str = "First_UTC";
const END_TIME_FIELD: &str = "Last_UTC";

/// Value substituted for any sensor reading the feed omits.
pub const MISSING_READING: f64 = 0.0;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Malformed weather document: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Weather document has no usable 'sol_keys' list")]
    MissingIndex,
    #[error("No data object for sol {0}")]
    MissingPeriodData(String),
    #[error("Sol key '{0}' is not a base-10 integer")]
    InvalidPeriodNumber(String),
}

/// Numeric value of `value`, or `default` when it is absent or not a number.
pub fn number_or(value: Option<&Value>, default: f64) -> f64 {
    value.and_then(Value::as_f64).unwrap_or(default)
}

fn string_or_empty(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default()
}

fn read_group(sol: &Value, name: &str) -> Reading {
    let group = sol.get(name);
    let field = |key: &str| number_or(group.and_then(|g| g.get(key)), MISSING_READING);

    Reading {
        avg: field(AVG_FIELD),
        min: field(MIN_FIELD),
        max: field(MAX_FIELD),
    }
}

fn sol_keys(document: &Value) -> Result<Vec<&str>, ParseError> {
    document
        .get(SOL_KEYS_FIELD)
        .and_then(Value::as_array)
        .ok_or(ParseError::MissingIndex)?
        .iter()
        .map(|key| key.as_str().ok_or(ParseError::MissingIndex))
        .collect()
}

fn normalize_sol(document: &Value, key: &str) -> Result<PeriodRecord, ParseError> {
    let sol = document
        .get(key)
        .filter(|v| v.is_object())
        .ok_or_else(|| ParseError::MissingPeriodData(key.to_string()))?;

    let temperature = read_group(sol, TEMPERATURE_GROUP);
    let pressure = read_group(sol, PRESSURE_GROUP);
    let wind_speed = read_group(sol, WIND_SPEED_GROUP);

    let period = key
        .parse::<i64>()
        .map_err(|_| ParseError::InvalidPeriodNumber(key.to_string()))?;

    Ok(PeriodRecord::new(
        period,
        string_or_empty(sol.get(START_TIME_FIELD)),
        string_or_empty(sol.get(END_TIME_FIELD)),
        temperature,
        pressure,
        wind_speed,
    ))
}

/// Parses a raw InSight feed into one record per sol, in `sol_keys` order.
///
/// Missing sensor groups or readings become [`MISSING_READING`]; a missing
/// sol object or a non-integer sol key fails the whole document.
pub fn normalize(raw: &[u8]) -> Result<Vec<PeriodRecord>, ParseError> {
    let document: Value = serde_json::from_slice(raw)?;

    sol_keys(&document)?
        .into_iter()
        .map(|key| normalize_sol(&document, key))
        .collect()
}
