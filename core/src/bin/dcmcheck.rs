use clap::{Parser, ValueEnum};
use dcmcheck_core::cli::setup_logging;
use dcmcheck_core::{ConsolidationConfig, ConsolidationReport, FolderConsolidator, RetainedFileSet};
use log::{error, info};
use std::path::{Path, PathBuf};
use std::process;

/// CLI tool reducing DICOM folders to one de-duplicated acquisition
#[derive(Parser, Debug)]
#[command(name = "dcmcheck")]
#[command(about = "Reduce folders of DICOM slices to a single, de-duplicated series")]
#[command(version)]
struct Cli {
    /// Folders containing .dcm or .IMA slices
    #[arg(value_name = "DIRECTORY", required = true)]
    directories: Vec<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Copy the retained slices of each folder to DIR/<folder name>
    #[arg(short, long, value_name = "DIR")]
    export: Option<PathBuf>,

    /// JSON configuration file (requires the 'json' feature)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Only require the fields the decisions use (keep files without AcquisitionTime)
    #[arg(long)]
    permissive: bool,

    /// Additional required tag. May be repeated.
    #[arg(short, long = "require", value_name = "TAG")]
    require: Vec<String>,

    /// Keep both copies of a doubled acquisition
    #[arg(long)]
    keep_duplicates: bool,

    /// Keep every image type and series number
    #[arg(long)]
    keep_all_series: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable text format
    Text,
    /// JSON format
    Json,
    /// Retained file paths only (one per line)
    Paths,
}

fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    };
    if let Err(e) = config.tag_names() {
        eprintln!("Error: {}", e);
        process::exit(2);
    }

    let destinations: Vec<Option<PathBuf>> = match &cli.export {
        Some(export_root) => match export_destinations(&cli.directories, export_root) {
            Ok(destinations) => destinations.into_iter().map(Some).collect(),
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(2);
            }
        },
        None => vec![None; cli.directories.len()],
    };

    let consolidator = FolderConsolidator::new(config);
    let mut results = Vec::new();
    let mut failures = 0;

    // A failing folder never stops the batch
    for (directory, destination) in cli.directories.iter().zip(&destinations) {
        match consolidator.consolidate_folder(directory) {
            Ok(result) => {
                if let Some(destination) = destination {
                    if let Err(e) = result.export_to(destination) {
                        error!("Failed to export {}: {}", directory.display(), e);
                        failures += 1;
                    }
                }
                results.push(result);
            }
            Err(e) => {
                error!("Skipping {}: {}", directory.display(), e);
                failures += 1;
            }
        }
    }

    output_results(&results, cli.format);

    if failures > 0 {
        eprintln!(
            "Error: {} of {} folders failed",
            failures,
            cli.directories.len()
        );
        process::exit(1);
    }
}

fn build_config(cli: &Cli) -> dcmcheck_core::Result<ConsolidationConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None if cli.permissive => ConsolidationConfig::permissive(),
        None => ConsolidationConfig::default(),
    };

    for tag in &cli.require {
        config = config.require_tag(tag.as_str());
    }
    if cli.keep_duplicates {
        config = config.remove_duplicates(false);
    }
    if cli.keep_all_series {
        config = config.select_series(false);
    }

    info!("Required tags: {}", config.required_tags.join(", "));
    Ok(config)
}

#[cfg(feature = "json")]
fn load_config(path: &Path) -> dcmcheck_core::Result<ConsolidationConfig> {
    ConsolidationConfig::from_json_file(path)
}

#[cfg(not(feature = "json"))]
fn load_config(_path: &Path) -> dcmcheck_core::Result<ConsolidationConfig> {
    Err(dcmcheck_core::DcmCheckError::InvalidValue(
        "--config requires the 'json' feature".to_string(),
    ))
}

/// Export directory of each input folder: `export_root/<folder name>`
///
/// Fails before anything is processed when two folders share a name, since
/// their series would end up merged in one directory.
fn export_destinations(
    directories: &[PathBuf],
    export_root: &Path,
) -> dcmcheck_core::Result<Vec<PathBuf>> {
    let mut destinations: Vec<PathBuf> = Vec::with_capacity(directories.len());
    for directory in directories {
        let destination = match directory.file_name() {
            Some(name) => export_root.join(name),
            None => export_root.to_path_buf(),
        };
        if destinations.contains(&destination) {
            return Err(dcmcheck_core::DcmCheckError::ExportConflict(destination));
        }
        destinations.push(destination);
    }
    Ok(destinations)
}

fn output_results(results: &[RetainedFileSet], format: OutputFormat) {
    match format {
        OutputFormat::Text => {
            for result in results {
                println!("{}", ConsolidationReport::new(result));
            }
        }
        OutputFormat::Paths => {
            for result in results {
                for path in result.paths() {
                    println!("{}", path.display());
                }
            }
        }
        OutputFormat::Json => {
            #[cfg(feature = "json")]
            {
                match output_json(results) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        error!("Failed to serialize to JSON: {}", e);
                        eprintln!("Error: Failed to serialize to JSON: {}", e);
                        process::exit(1);
                    }
                }
            }
            #[cfg(not(feature = "json"))]
            {
                eprintln!("Error: JSON output requires the 'json' feature");
                eprintln!("Rebuild with: cargo build --features json");
                process::exit(1);
            }
        }
    }
}

#[cfg(feature = "json")]
fn output_json(results: &[RetainedFileSet]) -> Result<String, serde_json::Error> {
    use dcmcheck_core::{ImageFile, SeriesSelection, TagValue};
    use serde::Serialize;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    struct FolderJson<'a> {
        source: String,
        selection: &'a SeriesSelection,
        retained: &'a [ImageFile],
        malformed: &'a [ImageFile],
        duplicates: &'a [ImageFile],
        excluded: &'a [ImageFile],
        tag_values: BTreeMap<String, Vec<TagValue>>,
    }

    let folders: Vec<FolderJson> = results
        .iter()
        .map(|r| FolderJson {
            source: r.source.display().to_string(),
            selection: &r.selection,
            retained: &r.retained,
            malformed: &r.malformed,
            duplicates: &r.duplicates,
            excluded: &r.excluded,
            tag_values: r.tag_values(),
        })
        .collect();

    serde_json::to_string_pretty(&folders)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_cli_requires_directory() {
        assert!(Cli::try_parse_from(["dcmcheck"]).is_err());
    }

    #[test]
    fn test_build_config_defaults() {
        let cli = Cli::parse_from(["dcmcheck", "T1"]);
        let config = build_config(&cli).unwrap();
        assert_eq!(config, ConsolidationConfig::default());
    }

    #[test]
    fn test_build_config_flags() {
        let cli = Cli::parse_from([
            "dcmcheck",
            "T1",
            "CT1",
            "--permissive",
            "-r",
            "EchoTime",
            "--keep-duplicates",
            "--keep-all-series",
        ]);
        let config = build_config(&cli).unwrap();

        assert_eq!(cli.directories.len(), 2);
        assert_eq!(
            config.required_tags,
            vec!["ImageType", "SeriesNumber", "InstanceNumber", "EchoTime"]
        );
        assert!(!config.remove_duplicates);
        assert!(!config.select_series);
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_build_config_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, r#"{"required_tags": ["SeriesNumber"], "remove_duplicates": false}"#)
            .unwrap();

        let cli = Cli::parse_from(["dcmcheck", "T1", "--config", path.to_str().unwrap()]);
        let config = build_config(&cli).unwrap();

        assert_eq!(config.required_tags, vec!["SeriesNumber"]);
        assert!(!config.remove_duplicates);
        assert_eq!(config.extensions, vec!["dcm", "IMA"]);
    }

    #[test]
    fn test_export_destinations_use_folder_name() {
        let destinations = export_destinations(
            &[PathBuf::from("s1/T1"), PathBuf::from("s1/FLAIR")],
            Path::new("out"),
        )
        .unwrap();
        assert_eq!(
            destinations,
            vec![PathBuf::from("out/T1"), PathBuf::from("out/FLAIR")]
        );
    }

    #[test]
    fn test_export_destinations_reject_shared_folder_name() {
        let err = export_destinations(
            &[PathBuf::from("s1/T1"), PathBuf::from("s2/T1")],
            Path::new("out"),
        )
        .unwrap_err();
        match err {
            dcmcheck_core::DcmCheckError::ExportConflict(path) => {
                assert_eq!(path, PathBuf::from("out/T1"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_export_writes_into_folder_destination() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let folder = src.path().join("FLAIR");
        fs::create_dir(&folder).unwrap();
        let slice = folder.join("1.dcm");
        fs::write(&slice, b"data").unwrap();

        let result = RetainedFileSet {
            source: folder.clone(),
            discovered: vec![slice.clone().into()],
            malformed: Vec::new(),
            duplicates: Vec::new(),
            excluded: Vec::new(),
            selection: dcmcheck_core::SeriesSelection::All,
            retained: vec![slice.into()],
            index: dcmcheck_core::FolderTagIndex::default(),
        };

        let destinations = export_destinations(&[folder], dst.path()).unwrap();
        let exported = result.export_to(&destinations[0]).unwrap();
        assert_eq!(exported, vec![dst.path().join("FLAIR").join("1.dcm")]);
    }
}
