use crate::error::{DcmCheckError, Result};
use crate::extraction::{discover_files, index_files, DicomTagReader, FolderTagIndex, TagReader};
use crate::selection::{find_duplicates, retain_selected, select_series, SeriesSelection};
use crate::types::{ConsolidationConfig, ImageFile, TagValue};
use log::info;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Reduces a folder of DICOM slices to one de-duplicated acquisition
///
/// A pass runs in three steps, each computing an explicit removal set:
/// 1. files lacking a required field are dropped (malformed)
/// 2. one copy of each instance is dropped from a doubled acquisition
/// 3. files outside the selected image type / series number are dropped
///
/// # Example
///
/// ```
/// use dcmcheck_core::{ConsolidationConfig, FolderConsolidator, InMemoryTagReader};
/// use dicom_core::{DataElement, PrimitiveValue, Tag, VR};
/// use dicom_object::InMemDicomObject;
///
/// let slice = |series: &str, instance: &str| {
///     let mut dcm = InMemDicomObject::new_empty();
///     dcm.put(DataElement::new(
///         Tag(0x0008, 0x0008), // ImageType
///         VR::CS,
///         PrimitiveValue::Strs(vec!["ORIGINAL".to_string(), "PRIMARY".to_string()].into()),
///     ));
///     dcm.put(DataElement::new(Tag(0x0020, 0x0011), VR::IS, PrimitiveValue::from(series)));
///     dcm.put(DataElement::new(Tag(0x0020, 0x0013), VR::IS, PrimitiveValue::from(instance)));
///     dcm
/// };
///
/// let reader = InMemoryTagReader::new()
///     .with_object("a.dcm", slice("3", "1"))
///     .with_object("b.dcm", slice("7", "1"))
///     .with_object("c.dcm", slice("7", "2"));
/// let files = reader.files();
///
/// let consolidator =
///     FolderConsolidator::with_reader(reader, ConsolidationConfig::permissive());
/// let result = consolidator.consolidate_files(files).unwrap();
///
/// // Only the latest series survives
/// assert_eq!(result.retained.len(), 2);
/// assert_eq!(result.excluded.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct FolderConsolidator<R = DicomTagReader> {
    reader: R,
    config: ConsolidationConfig,
}

impl FolderConsolidator<DicomTagReader> {
    /// Creates a consolidator reading DICOM files from disk
    pub fn new(config: ConsolidationConfig) -> Self {
        Self::with_reader(DicomTagReader, config)
    }
}

impl Default for FolderConsolidator<DicomTagReader> {
    fn default() -> Self {
        Self::new(ConsolidationConfig::default())
    }
}

impl<R: TagReader> FolderConsolidator<R> {
    /// Creates a consolidator with a custom tag source
    pub fn with_reader(reader: R, config: ConsolidationConfig) -> Self {
        Self { reader, config }
    }

    /// The active configuration
    pub fn config(&self) -> &ConsolidationConfig {
        &self.config
    }

    /// Consolidates the slices found in a folder
    ///
    /// # Errors
    ///
    /// - [`DcmCheckError::NoInputFiles`] if the folder has no slice files
    /// - [`DcmCheckError::NoRecoverableFiles`] if every file gets excluded
    /// - [`DcmCheckError::InvalidTagName`] if a required tag is malformed
    pub fn consolidate_folder(&self, directory: &Path) -> Result<RetainedFileSet> {
        info!("Processing folder: {}", directory.display());
        let files = discover_files(directory, &self.config.extensions)?;
        self.consolidate(directory.to_path_buf(), files)
    }

    /// Consolidates an explicit list of slices, kept in the given order
    ///
    /// The files are taken as-is, whatever their extension.
    pub fn consolidate_files(&self, files: Vec<ImageFile>) -> Result<RetainedFileSet> {
        let source = files
            .first()
            .and_then(|f| f.path().parent())
            .map(Path::to_path_buf)
            .unwrap_or_default();
        if files.is_empty() {
            return Err(DcmCheckError::NoInputFiles(source));
        }
        self.consolidate(source, files)
    }

    fn consolidate(&self, source: PathBuf, files: Vec<ImageFile>) -> Result<RetainedFileSet> {
        let tags = self.config.tag_names()?;
        info!("Found {} DICOM files", files.len());

        let (index, malformed) = index_files(&self.reader, &files, &tags);
        let candidates = difference(&files, &malformed);
        let index = index.restricted_to(&candidates);

        let duplicates = if self.config.remove_duplicates {
            let instance_numbers = index.instance_numbers().unwrap_or_default();
            find_duplicates(instance_numbers, &index.series_numbers())
        } else {
            Vec::new()
        };
        let working = difference(&candidates, &duplicates);
        if working.is_empty() {
            return Err(DcmCheckError::NoRecoverableFiles(source));
        }
        let index = index.restricted_to(&working);

        let selection = if self.config.select_series {
            select_series(
                &index.image_types(),
                &index.series_numbers(),
                &self.config.projection_marker,
            )
        } else {
            SeriesSelection::All
        };
        let retained = retain_selected(&self.reader, &working, &selection);
        if retained.is_empty() {
            return Err(DcmCheckError::NoRecoverableFiles(source));
        }
        let excluded = difference(&working, &retained);
        let index = index.restricted_to(&retained);

        info!(
            "Kept {} of {} files ({} malformed, {} duplicates, {} outside {})",
            retained.len(),
            files.len(),
            malformed.len(),
            duplicates.len(),
            excluded.len(),
            selection
        );

        Ok(RetainedFileSet {
            source,
            discovered: files,
            malformed,
            duplicates,
            excluded,
            selection,
            retained,
            index,
        })
    }
}

/// `files` minus `removed`, keeping the order of `files`
///
/// Each entry of `removed` drops one occurrence, the first one left, so a
/// path listed twice survives a single removal.
fn difference(files: &[ImageFile], removed: &[ImageFile]) -> Vec<ImageFile> {
    let mut pending: HashMap<&ImageFile, usize> = HashMap::new();
    for file in removed {
        *pending.entry(file).or_default() += 1;
    }
    files
        .iter()
        .filter(|file| match pending.get_mut(*file) {
            Some(count) if *count > 0 => {
                *count -= 1;
                false
            }
            _ => true,
        })
        .cloned()
        .collect()
}

/// Outcome of one consolidation pass
///
/// `retained` is `discovered` minus `malformed`, `duplicates` and
/// `excluded`, in discovery order.
#[derive(Debug, Clone, PartialEq)]
pub struct RetainedFileSet {
    /// Folder the files came from
    pub source: PathBuf,

    /// Every file considered, in discovery order
    pub discovered: Vec<ImageFile>,

    /// Files lacking at least one required field
    pub malformed: Vec<ImageFile>,

    /// Extra copies removed from a doubled acquisition
    pub duplicates: Vec<ImageFile>,

    /// Files outside the selected image type / series number
    pub excluded: Vec<ImageFile>,

    /// The acquisition that was kept
    pub selection: SeriesSelection,

    /// Files handed on to the conversion pipeline
    pub retained: Vec<ImageFile>,

    /// Tag values of the retained files
    pub index: FolderTagIndex,
}

impl RetainedFileSet {
    /// Paths of the retained files
    pub fn paths(&self) -> Vec<PathBuf> {
        self.retained
            .iter()
            .map(|f| f.path().to_path_buf())
            .collect()
    }

    /// Number of retained files
    pub fn len(&self) -> usize {
        self.retained.len()
    }

    /// Whether nothing was retained
    pub fn is_empty(&self) -> bool {
        self.retained.is_empty()
    }

    /// Number of files dropped for any reason
    pub fn removed_count(&self) -> usize {
        self.discovered.len() - self.retained.len()
    }

    /// Whether the pass dropped nothing
    pub fn is_unchanged(&self) -> bool {
        self.removed_count() == 0
    }

    /// Distinct values of each indexed tag across the retained files
    pub fn tag_values(&self) -> BTreeMap<String, Vec<TagValue>> {
        self.index.summary()
    }

    /// Copies the retained files into `destination`
    ///
    /// The directory is created if needed and file names are preserved, so
    /// the destination ends up holding exactly the retained series. Returns
    /// the paths of the copies, in retained order; a path retained twice is
    /// copied once.
    ///
    /// # Errors
    ///
    /// Returns [`DcmCheckError::ExportConflict`] if `destination` already
    /// holds entries, or if two different retained files share a file name.
    /// Nothing is copied in either case.
    pub fn export_to(&self, destination: &Path) -> Result<Vec<PathBuf>> {
        if destination.exists() && std::fs::read_dir(destination)?.next().is_some() {
            return Err(DcmCheckError::ExportConflict(destination.to_path_buf()));
        }

        let mut targets: Vec<(&Path, PathBuf)> = Vec::with_capacity(self.retained.len());
        let mut sources: HashMap<PathBuf, &Path> = HashMap::new();
        for file in &self.retained {
            let name = file.path().file_name().ok_or_else(|| {
                DcmCheckError::InvalidValue(format!("{} has no file name", file))
            })?;
            let target = destination.join(name);
            match sources.get(&target) {
                Some(source) if *source == file.path() => continue,
                Some(_) => return Err(DcmCheckError::ExportConflict(target)),
                None => {
                    sources.insert(target.clone(), file.path());
                    targets.push((file.path(), target));
                }
            }
        }

        std::fs::create_dir_all(destination)?;
        let mut exported = Vec::with_capacity(targets.len());
        for (source, target) in targets {
            std::fs::copy(source, &target)?;
            exported.push(target);
        }

        info!(
            "Exported {} files to {}",
            exported.len(),
            destination.display()
        );
        Ok(exported)
    }
}

/// Consolidates a folder read from disk with the default configuration
pub fn consolidate_folder(directory: &Path) -> Result<RetainedFileSet> {
    FolderConsolidator::default().consolidate_folder(directory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::tags::{
        ACQUISITION_TIME_TAG, IMAGE_TYPE_TAG, INSTANCE_NUMBER_TAG, SERIES_NUMBER_TAG,
    };
    use crate::extraction::InMemoryTagReader;
    use crate::types::TagName;
    use dicom_core::{DataElement, PrimitiveValue, VR};
    use dicom_object::InMemDicomObject;

    struct Slice {
        image_type: &'static [&'static str],
        series: Option<&'static str>,
        instance: &'static str,
    }

    fn slice(
        image_type: &'static [&'static str],
        series: &'static str,
        instance: &'static str,
    ) -> Slice {
        Slice {
            image_type,
            series: Some(series),
            instance,
        }
    }

    fn to_dicom(slice: &Slice) -> InMemDicomObject {
        let mut obj = InMemDicomObject::new_empty();
        obj.put(DataElement::new(
            IMAGE_TYPE_TAG,
            VR::CS,
            PrimitiveValue::Strs(slice.image_type.iter().map(|s| s.to_string()).collect()),
        ));
        if let Some(series) = slice.series {
            obj.put(DataElement::new(
                SERIES_NUMBER_TAG,
                VR::IS,
                PrimitiveValue::from(series),
            ));
        }
        obj.put(DataElement::new(
            INSTANCE_NUMBER_TAG,
            VR::IS,
            PrimitiveValue::from(slice.instance),
        ));
        obj.put(DataElement::new(
            ACQUISITION_TIME_TAG,
            VR::TM,
            PrimitiveValue::from("101500"),
        ));
        obj
    }

    const PRIMARY: &[&str] = &["ORIGINAL", "PRIMARY"];
    const LOCALIZER: &[&str] = &["DERIVED", "PROJECTION IMAGE"];

    fn run(slices: &[Slice]) -> (Vec<ImageFile>, Result<RetainedFileSet>) {
        run_with(slices, ConsolidationConfig::default())
    }

    fn run_with(
        slices: &[Slice],
        config: ConsolidationConfig,
    ) -> (Vec<ImageFile>, Result<RetainedFileSet>) {
        let mut reader = InMemoryTagReader::new();
        for (i, s) in slices.iter().enumerate() {
            reader.insert(format!("dir/f{:02}.dcm", i + 1), to_dicom(s));
        }
        let files = reader.files();
        let result =
            FolderConsolidator::with_reader(reader, config).consolidate_files(files.clone());
        (files, result)
    }

    fn instance_values(result: &RetainedFileSet) -> Vec<TagValue> {
        result
            .index
            .distinct(&TagName::keyword("InstanceNumber"))
            .into_iter()
            .cloned()
            .collect()
    }

    #[test]
    fn test_clean_folder_is_unchanged() {
        let slices: Vec<Slice> = ["1", "2", "3"]
            .iter()
            .map(|n| slice(PRIMARY, "5", *n))
            .collect();
        let (files, result) = run(&slices);
        let result = result.unwrap();

        assert_eq!(result.retained, files);
        assert!(result.is_unchanged());
        assert_eq!(result.selection, SeriesSelection::All);
        assert_eq!(result.source, PathBuf::from("dir"));
    }

    #[test]
    fn test_doubled_acquisition() {
        let slices: Vec<Slice> = ["1", "1", "2", "2", "3", "3", "4", "4"]
            .iter()
            .map(|n| slice(PRIMARY, "5", *n))
            .collect();
        let (files, result) = run(&slices);
        let result = result.unwrap();

        assert_eq!(result.duplicates.len(), 4);
        assert_eq!(result.len(), 4);
        assert_eq!(
            result.retained,
            vec![
                files[1].clone(),
                files[3].clone(),
                files[5].clone(),
                files[7].clone()
            ]
        );
        let expected: Vec<TagValue> = ["1", "2", "3", "4"]
            .iter()
            .map(|n| TagValue::scalar(*n))
            .collect();
        assert_eq!(instance_values(&result), expected);
    }

    #[test]
    fn test_duplicate_removal_can_be_disabled() {
        let slices = vec![slice(PRIMARY, "5", "1"), slice(PRIMARY, "5", "1")];
        let (files, result) =
            run_with(&slices, ConsolidationConfig::default().remove_duplicates(false));
        assert_eq!(result.unwrap().retained, files);
    }

    #[test]
    fn test_localizer_is_dropped() {
        let slices = vec![
            slice(LOCALIZER, "1", "1"),
            slice(PRIMARY, "2", "1"),
            slice(PRIMARY, "2", "2"),
            slice(LOCALIZER, "1", "2"),
        ];
        let (files, result) = run(&slices);
        let result = result.unwrap();

        assert_eq!(
            result.selection,
            SeriesSelection::ImageType(TagValue::tuple(["ORIGINAL", "PRIMARY"]))
        );
        assert_eq!(result.retained, vec![files[1].clone(), files[2].clone()]);
        assert_eq!(result.excluded, vec![files[0].clone(), files[3].clone()]);
        // Index only describes what is left
        assert_eq!(result.index.image_types().len(), 1);
        assert_eq!(result.index.series_numbers().len(), 1);
    }

    #[test]
    fn test_latest_series_is_kept() {
        let slices = vec![
            slice(PRIMARY, "3", "1"),
            slice(PRIMARY, "3", "2"),
            slice(PRIMARY, "7", "1"),
            slice(PRIMARY, "7", "2"),
        ];
        let (files, result) = run(&slices);
        let result = result.unwrap();

        assert_eq!(
            result.selection,
            SeriesSelection::SeriesNumber(TagValue::scalar("7"))
        );
        assert_eq!(result.retained, files[2..].to_vec());
    }

    #[test]
    fn test_series_selection_can_be_disabled() {
        let slices = vec![slice(PRIMARY, "3", "1"), slice(PRIMARY, "7", "2")];
        let (files, result) =
            run_with(&slices, ConsolidationConfig::default().select_series(false));
        assert_eq!(result.unwrap().retained, files);
    }

    #[test]
    fn test_file_without_series_number_is_malformed() {
        let slices = vec![
            slice(PRIMARY, "5", "1"),
            Slice {
                image_type: PRIMARY,
                series: None,
                instance: "2",
            },
            slice(PRIMARY, "5", "3"),
        ];
        let (files, result) = run(&slices);
        let result = result.unwrap();

        assert_eq!(result.malformed, vec![files[1].clone()]);
        assert_eq!(result.retained, vec![files[0].clone(), files[2].clone()]);
        assert_eq!(result.removed_count(), 1);
    }

    #[test]
    fn test_malformed_files_do_not_count_as_duplicates() {
        // Without the malformed file the instances are unique
        let slices = vec![
            slice(PRIMARY, "5", "1"),
            Slice {
                image_type: PRIMARY,
                series: None,
                instance: "1",
            },
        ];
        let (files, result) = run(&slices);
        let result = result.unwrap();

        assert!(result.duplicates.is_empty());
        assert_eq!(result.retained, vec![files[0].clone()]);
    }

    #[test]
    fn test_required_tag_missing_everywhere_is_fatal() {
        let slices = vec![slice(PRIMARY, "5", "1"), slice(PRIMARY, "5", "2")];
        let config = ConsolidationConfig::default().require_tag("EchoTime");
        let (_, result) = run_with(&slices, config);

        match result {
            Err(DcmCheckError::NoRecoverableFiles(dir)) => assert_eq!(dir, PathBuf::from("dir")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_empty_file_list() {
        let consolidator =
            FolderConsolidator::with_reader(InMemoryTagReader::new(), ConsolidationConfig::default());
        assert!(matches!(
            consolidator.consolidate_files(Vec::new()),
            Err(DcmCheckError::NoInputFiles(_))
        ));
    }

    #[test]
    fn test_invalid_required_tag() {
        let slices = vec![slice(PRIMARY, "5", "1")];
        let (_, result) = run_with(&slices, ConsolidationConfig::default().require_tag("no such"));
        assert!(matches!(result, Err(DcmCheckError::InvalidTagName(_))));
    }

    #[test]
    fn test_consolidation_is_idempotent() {
        let slices = vec![
            slice(LOCALIZER, "1", "1"),
            slice(PRIMARY, "4", "1"),
            slice(PRIMARY, "4", "2"),
            slice(PRIMARY, "4", "3"),
        ];
        let mut reader = InMemoryTagReader::new();
        for (i, s) in slices.iter().enumerate() {
            reader.insert(format!("dir/f{}.dcm", i + 1), to_dicom(s));
        }
        let files = reader.files();
        let consolidator = FolderConsolidator::with_reader(reader, ConsolidationConfig::default());

        let first = consolidator.consolidate_files(files.clone()).unwrap();
        assert_eq!(first.retained, files[1..].to_vec());

        let second = consolidator
            .consolidate_files(first.retained.clone())
            .unwrap();
        assert_eq!(second.retained, first.retained);
        assert_eq!(second.selection, SeriesSelection::All);
        assert!(second.is_unchanged());
    }

    #[test]
    fn test_repeated_paths_keep_one_copy() {
        let reader = InMemoryTagReader::new()
            .with_object("dir/a.dcm", to_dicom(&slice(PRIMARY, "5", "1")))
            .with_object("dir/b.dcm", to_dicom(&slice(PRIMARY, "5", "2")));
        let a = ImageFile::new("dir/a.dcm");
        let b = ImageFile::new("dir/b.dcm");
        let consolidator = FolderConsolidator::with_reader(reader, ConsolidationConfig::default());

        let result = consolidator
            .consolidate_files(vec![a.clone(), a.clone(), b.clone(), b.clone()])
            .unwrap();

        assert_eq!(result.duplicates, vec![a.clone(), b.clone()]);
        assert_eq!(result.retained, vec![a, b]);
        assert_eq!(result.index.instance_numbers().unwrap().len(), 2);
    }

    #[test]
    fn test_difference_removes_one_occurrence_per_entry() {
        let a = ImageFile::new("a.dcm");
        let b = ImageFile::new("b.dcm");
        let files = vec![a.clone(), a.clone(), b.clone()];

        assert_eq!(difference(&files, &[a.clone()]), vec![a.clone(), b.clone()]);
        assert_eq!(difference(&files, &[a.clone(), a.clone()]), vec![b.clone()]);
        assert_eq!(difference(&files, &[]), files);
    }

    #[test]
    fn test_tag_values_summary() {
        let slices = vec![slice(PRIMARY, "5", "1"), slice(PRIMARY, "5", "2")];
        let (_, result) = run(&slices);
        let values = result.unwrap().tag_values();

        assert_eq!(values["SeriesNumber"], vec![TagValue::scalar("5")]);
        assert_eq!(values["AcquisitionTime"], vec![TagValue::scalar("101500")]);
        assert_eq!(values["InstanceNumber"].len(), 2);
    }

    fn retained_only(source: &Path, retained: Vec<ImageFile>) -> RetainedFileSet {
        RetainedFileSet {
            source: source.to_path_buf(),
            discovered: retained.clone(),
            malformed: Vec::new(),
            duplicates: Vec::new(),
            excluded: Vec::new(),
            selection: SeriesSelection::All,
            retained,
            index: FolderTagIndex::default(),
        }
    }

    #[test]
    fn test_export_refuses_non_empty_destination() {
        let src = tempfile::TempDir::new().unwrap();
        let dst = tempfile::TempDir::new().unwrap();
        let new = src.path().join("new.dcm");
        std::fs::write(&new, b"new").unwrap();
        std::fs::write(dst.path().join("old.dcm"), b"old").unwrap();

        let result = retained_only(src.path(), vec![ImageFile::new(&new)]);
        let err = result.export_to(dst.path()).unwrap_err();

        match err {
            DcmCheckError::ExportConflict(path) => assert_eq!(path, dst.path()),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!dst.path().join("new.dcm").exists());
    }

    #[test]
    fn test_export_into_existing_empty_directory() {
        let src = tempfile::TempDir::new().unwrap();
        let dst = tempfile::TempDir::new().unwrap();
        let a = src.path().join("a.dcm");
        std::fs::write(&a, b"a").unwrap();

        let result = retained_only(src.path(), vec![ImageFile::new(&a), ImageFile::new(&a)]);
        let exported = result.export_to(dst.path()).unwrap();

        assert_eq!(exported, vec![dst.path().join("a.dcm")]);
    }

    #[test]
    fn test_export_refuses_name_collision() {
        let src = tempfile::TempDir::new().unwrap();
        let dst = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(src.path().join("s1")).unwrap();
        std::fs::create_dir(src.path().join("s2")).unwrap();
        let first = src.path().join("s1").join("f01.dcm");
        let second = src.path().join("s2").join("f01.dcm");
        std::fs::write(&first, b"s1").unwrap();
        std::fs::write(&second, b"s2").unwrap();

        let result = retained_only(
            src.path(),
            vec![ImageFile::new(&first), ImageFile::new(&second)],
        );
        let target = dst.path().join("T1");
        let err = result.export_to(&target).unwrap_err();

        assert!(matches!(err, DcmCheckError::ExportConflict(_)));
        assert!(!target.exists());
    }

    #[test]
    fn test_export_copies_retained_files() {
        let src = tempfile::TempDir::new().unwrap();
        let dst = tempfile::TempDir::new().unwrap();
        let a = src.path().join("a.dcm");
        let b = src.path().join("b.dcm");
        std::fs::write(&a, b"slice a").unwrap();
        std::fs::write(&b, b"slice b").unwrap();

        let retained = RetainedFileSet {
            source: src.path().to_path_buf(),
            discovered: vec![ImageFile::new(&a), ImageFile::new(&b)],
            malformed: Vec::new(),
            duplicates: Vec::new(),
            excluded: vec![ImageFile::new(&a)],
            selection: SeriesSelection::SeriesNumber(TagValue::scalar("7")),
            retained: vec![ImageFile::new(&b)],
            index: FolderTagIndex::default(),
        };

        let target = dst.path().join("T1");
        let exported = retained.export_to(&target).unwrap();

        assert_eq!(exported, vec![target.join("b.dcm")]);
        assert_eq!(std::fs::read(target.join("b.dcm")).unwrap(), b"slice b");
        assert!(!target.join("a.dcm").exists());
    }
}
