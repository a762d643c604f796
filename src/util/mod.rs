pub mod text;

use serde::{Deserialize, Deserializer};

/// Deserialize a field that the API may send as `null`, falling back to the type's default.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Round to one decimal place, the precision every percentage and ideal-line value is reported at.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
