use crate::error::{DcmCheckError, Result};
use dicom_core::Tag;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// A requested DICOM field
///
/// Either a data dictionary keyword (`SeriesNumber`) or an explicit
/// group/element pair (`0020,0011`, `(0020,0011)`). Keywords are resolved
/// against the standard dictionary only when a file is read, so unknown
/// keywords are not an error here; they simply never match any field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TagName {
    Keyword(String),
    Numeric(u16, u16),
}

impl TagName {
    /// Parses a tag name
    ///
    /// # Errors
    ///
    /// Returns [`DcmCheckError::InvalidTagName`] if the name is empty or is
    /// neither a keyword nor a hexadecimal group/element pair.
    pub fn parse(s: &str) -> Result<Self> {
        static NUMERIC: OnceLock<Regex> = OnceLock::new();
        static KEYWORD: OnceLock<Regex> = OnceLock::new();
        let numeric = NUMERIC.get_or_init(|| {
            Regex::new(r"^\(?([0-9A-Fa-f]{4}),\s*([0-9A-Fa-f]{4})\)?$")
                .expect("Failed to compile regex")
        });
        let keyword = KEYWORD
            .get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9]*$").expect("Failed to compile regex"));

        let s = s.trim();
        if let Some(caps) = numeric.captures(s) {
            let group = u16::from_str_radix(&caps[1], 16)
                .map_err(|_| DcmCheckError::InvalidTagName(s.to_string()))?;
            let element = u16::from_str_radix(&caps[2], 16)
                .map_err(|_| DcmCheckError::InvalidTagName(s.to_string()))?;
            return Ok(TagName::Numeric(group, element));
        }

        if keyword.is_match(s) {
            Ok(TagName::Keyword(s.to_string()))
        } else {
            Err(DcmCheckError::InvalidTagName(s.to_string()))
        }
    }

    /// Creates a keyword tag name without validation
    pub fn keyword(name: impl Into<String>) -> Self {
        TagName::Keyword(name.into())
    }

    /// Returns the numeric tag if one was given explicitly
    pub fn tag(&self) -> Option<Tag> {
        match self {
            TagName::Keyword(_) => None,
            TagName::Numeric(g, e) => Some(Tag(*g, *e)),
        }
    }

    /// Checks if this names the given keyword
    pub fn is(&self, keyword: &str) -> bool {
        matches!(self, TagName::Keyword(k) if k == keyword)
    }
}

impl fmt::Display for TagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagName::Keyword(k) => write!(f, "{}", k),
            TagName::Numeric(g, e) => write!(f, "({:04X},{:04X})", g, e),
        }
    }
}

impl std::str::FromStr for TagName {
    type Err = DcmCheckError;

    fn from_str(s: &str) -> Result<Self> {
        TagName::parse(s)
    }
}
