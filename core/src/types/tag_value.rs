use std::cmp::Ordering;
use std::fmt;

/// Normalized value of one DICOM field in one file
///
/// Multi-valued fields (VM > 1, e.g. ImageType) keep their elements in order
/// as a [`TagValue::Tuple`]; everything else collapses to its trimmed string
/// form as a [`TagValue::Scalar`]. Two files agree on a tag iff their values
/// compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "json", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "json", serde(untagged))]
pub enum TagValue {
    Scalar(String),
    Tuple(Vec<String>),
}

impl TagValue {
    /// Creates a scalar value
    pub fn scalar(value: impl Into<String>) -> Self {
        TagValue::Scalar(value.into())
    }

    /// Creates a tuple value from its elements, in order
    pub fn tuple<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TagValue::Tuple(values.into_iter().map(Into::into).collect())
    }

    /// Normalizes the raw string elements of a field
    ///
    /// More than one element yields a tuple, otherwise the single element
    /// (or the empty string for an empty field) becomes a scalar. Padding
    /// spaces and NUL bytes are stripped from every element.
    pub fn normalize<S: AsRef<str>>(values: &[S]) -> Self {
        let mut parts: Vec<String> = values
            .iter()
            .map(|v| clean(v.as_ref()).to_string())
            .collect();

        if parts.len() > 1 {
            TagValue::Tuple(parts)
        } else {
            TagValue::Scalar(parts.pop().unwrap_or_default())
        }
    }

    /// Returns the scalar string, if this is a scalar
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            TagValue::Scalar(s) => Some(s),
            TagValue::Tuple(_) => None,
        }
    }

    /// Interprets a scalar as an integer (IS/US/SS/UL values)
    pub fn as_int(&self) -> Option<i64> {
        self.as_scalar().and_then(|s| s.trim().parse::<i64>().ok())
    }

    /// Checks if the value carries `marker`
    ///
    /// For tuples the marker must equal one of the elements; for scalars a
    /// substring match is enough.
    pub fn contains(&self, marker: &str) -> bool {
        match self {
            TagValue::Scalar(s) => s.contains(marker),
            TagValue::Tuple(parts) => parts.iter().any(|p| p == marker),
        }
    }

    /// Orders values numerically when both are integers, falling back to
    /// the structural ordering otherwise
    pub fn numeric_cmp(&self, other: &TagValue) -> Ordering {
        match (self.as_int(), other.as_int()) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => self.cmp(other),
        }
    }
}

fn clean(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_whitespace() || c == '\0')
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Scalar(s) => write!(f, "{}", s),
            TagValue::Tuple(parts) => write!(f, "{}", parts.join("\\")),
        }
    }
}

impl From<&str> for TagValue {
    fn from(s: &str) -> Self {
        TagValue::scalar(s)
    }
}

impl From<i64> for TagValue {
    fn from(n: i64) -> Self {
        TagValue::Scalar(n.to_string())
    }
}
