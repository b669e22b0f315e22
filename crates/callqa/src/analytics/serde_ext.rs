use serde::{Deserialize, Deserializer, Serializer};

/// Accepts `true`/`false`, `0`/`1` and their string spellings, as stored by the sync exports.
pub(crate) fn flexible_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Int(i64),
        Float(f64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(false),
        Some(Raw::Bool(value)) => Ok(value),
        Some(Raw::Int(value)) => Ok(value != 0),
        Some(Raw::Float(value)) => Ok(value != 0.0),
        Some(Raw::Text(value)) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "" | "0" | "false" | "no" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "expected a boolean flag, got '{other}'"
            ))),
        },
    }
}

/// Whole seconds from an integer, fractional or textual value. Fractions are
/// floored, negatives clamp to zero, and null or blank values read as `None`.
pub(crate) fn flexible_seconds<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
    }

    let secs = match Option::<Raw>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(Raw::Int(value)) => value as f64,
        Some(Raw::Float(value)) => value,
        Some(Raw::Text(value)) => match value.trim() {
            "" => return Ok(None),
            trimmed => trimmed.parse::<f64>().map_err(|_| {
                serde::de::Error::custom(format!("invalid duration '{trimmed}'"))
            })?,
        },
    };

    if !secs.is_finite() {
        return Ok(None);
    }
    Ok(Some(secs.max(0.0).min(f64::from(u32::MAX)).floor() as u32))
}

/// Reads `null` as the type's default instead of failing the record.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Serializes whole-number scores as JSON integers so display-mode payloads stay `66`, not `66.0`.
pub(crate) fn score<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let value = finite_or_zero(*value);
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        serializer.serialize_i64(value as i64)
    } else {
        serializer.serialize_f64(value)
    }
}

pub(crate) fn flag<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u8(u8::from(*value))
}

pub(crate) fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

/// Ratios and averages must never leak NaN or infinity into JSON payloads.
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// `numerator / denominator`, or zero when the denominator is zero.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        finite_or_zero(numerator / denominator)
    }
}
