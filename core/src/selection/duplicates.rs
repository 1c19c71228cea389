use crate::types::{ImageFile, TagValue};
use log::info;
use std::collections::{BTreeSet, HashSet};

/// Checks if a folder holds one series emitted twice
///
/// The scanner occasionally writes two interleaved copies of the same
/// series: every instance number then shows up twice while there is a
/// single series number.
pub fn is_doubled_acquisition(
    instance_numbers: &[(ImageFile, TagValue)],
    series_numbers: &BTreeSet<&TagValue>,
) -> bool {
    let distinct: HashSet<&TagValue> = instance_numbers.iter().map(|(_, n)| n).collect();
    !instance_numbers.is_empty()
        && instance_numbers.len() == 2 * distinct.len()
        && series_numbers.len() == 1
}

/// Files to discard from a doubled acquisition
///
/// The `(file, instance number)` pairs are stable-sorted by instance number
/// and every other file is dropped, starting with the first and never
/// touching the last position (`sorted[0 : len-1 : 2]`). Returns nothing
/// when the folder is not a doubled acquisition.
pub fn find_duplicates(
    instance_numbers: &[(ImageFile, TagValue)],
    series_numbers: &BTreeSet<&TagValue>,
) -> Vec<ImageFile> {
    if !is_doubled_acquisition(instance_numbers, series_numbers) {
        return Vec::new();
    }

    let mut sorted: Vec<&(ImageFile, TagValue)> = instance_numbers.iter().collect();
    sorted.sort_by(|a, b| a.1.numeric_cmp(&b.1));

    let duplicates: Vec<ImageFile> = sorted
        .iter()
        .take(sorted.len() - 1)
        .step_by(2)
        .map(|(file, _)| file.clone())
        .collect();

    info!(
        "Doubled acquisition detected: discarding {} of {} files",
        duplicates.len(),
        instance_numbers.len()
    );

    duplicates
}
