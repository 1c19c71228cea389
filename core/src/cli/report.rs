use crate::api::RetainedFileSet;
use crate::error::Result;
use crate::types::{ImageFile, TagName, TagValue};
use std::fmt;

/// Text report of the tags read from one file
pub struct TagReport<'a> {
    file: &'a ImageFile,
    entries: &'a [(TagName, Result<TagValue>)],
}

impl<'a> TagReport<'a> {
    /// Creates a new tag report
    pub fn new(file: &'a ImageFile, entries: &'a [(TagName, Result<TagValue>)]) -> Self {
        Self { file, entries }
    }
}

impl<'a> fmt::Display for TagReport<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.file)?;
        let width = self
            .entries
            .iter()
            .map(|(tag, _)| tag.to_string().len())
            .max()
            .unwrap_or(0);

        for (tag, value) in self.entries {
            let tag = tag.to_string();
            match value {
                Ok(value) => writeln!(f, "  {:width$}  {}", tag, value, width = width)?,
                Err(_) => writeln!(f, "  {:width$}  <missing>", tag, width = width)?,
            }
        }
        Ok(())
    }
}

/// Text report of one consolidation pass
pub struct ConsolidationReport<'a> {
    result: &'a RetainedFileSet,
}

impl<'a> ConsolidationReport<'a> {
    /// Creates a new consolidation report
    pub fn new(result: &'a RetainedFileSet) -> Self {
        Self { result }
    }

    fn write_files(f: &mut fmt::Formatter<'_>, label: &str, files: &[ImageFile]) -> fmt::Result {
        if files.is_empty() {
            return Ok(());
        }
        writeln!(f, "{} ({}):", label, files.len())?;
        for file in files {
            writeln!(f, "  {}", file)?;
        }
        Ok(())
    }
}

impl<'a> fmt::Display for ConsolidationReport<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.result;
        let title = format!("Folder: {}", result.source.display());
        writeln!(f, "{}", title)?;
        writeln!(f, "{}", "=".repeat(title.len()))?;
        writeln!(f)?;
        writeln!(f, "Discovered:     {}", result.discovered.len())?;
        writeln!(f, "Retained:       {}", result.retained.len())?;
        writeln!(f, "Selection:      {}", result.selection)?;
        writeln!(f)?;

        Self::write_files(f, "Malformed", &result.malformed)?;
        Self::write_files(f, "Duplicates", &result.duplicates)?;
        Self::write_files(f, "Excluded", &result.excluded)?;

        writeln!(f, "Tag Values")?;
        writeln!(f, "----------")?;
        for (tag, values) in result.tag_values() {
            let values: Vec<String> = values.iter().map(|v| v.to_string()).collect();
            writeln!(f, "{}: {}", tag, values.join(", "))?;
        }

        Ok(())
    }
}
