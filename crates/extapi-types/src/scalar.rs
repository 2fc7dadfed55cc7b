use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// A JSON scalar that tolerates the shapes API clients actually send.
///
/// Form-encoded clients stringify everything (`"hours": "2.5"`), JSON clients
/// send native numbers (`"hours": 2.5`). Both decode into a `Scalar`; the
/// record store decides how to coerce it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl Scalar {
    /// Integer view. Floats with no fractional part and numeric strings
    /// convert; anything else yields `None`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            Self::Float(_) | Self::Bool(_) => None,
            Self::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Floating-point view.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(n) => Some(*n as f64),
            Self::Float(f) => Some(*f),
            Self::Bool(_) => None,
            Self::Text(s) => s.trim().parse().ok().filter(|f: &f64| f.is_finite()),
        }
    }

    /// String view, as the host would see a form parameter.
    pub fn to_text(&self) -> String {
        match self {
            Self::Int(n) => n.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Bool(true) => "1".into(),
            Self::Bool(false) => "0".into(),
            Self::Text(s) => s.clone(),
        }
    }

    /// Boolean view: `true`/`false`, `1`/`0`, and their string forms.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Int(n) => Some(*n != 0),
            Self::Float(_) => None,
            Self::Text(s) => match s.trim() {
                "1" | "true" => Some(true),
                "0" | "false" | "" => Some(false),
                _ => None,
            },
        }
    }

    /// Blank means an empty or whitespace-only string.
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Text(s) if s.trim().is_empty())
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<f64> for Scalar {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

/// Decode an optional list of scalars into their string forms.
///
/// Use with `#[serde(default, deserialize_with = "text_list")]`.
pub fn text_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Scalar>>::deserialize(deserializer)?;
    Ok(raw.map(|items| items.iter().map(Scalar::to_text).collect()))
}

/// Distinguish an absent key from an explicit `null`.
///
/// Use with `#[serde(default, deserialize_with = "double_option")]`:
/// absent → `None`, `null` → `Some(None)`, value → `Some(Some(v))`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
