use clap::Parser;
use dcmcheck_core::cli::{setup_logging, Cli, OutputFormat};
use dcmcheck_core::extraction::read_tag_from_object;
use dcmcheck_core::{DicomTagReader, ImageFile, TagReport};
use log::{debug, error};
use std::process;

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let tags = match cli.tag_names() {
        Ok(tags) => tags,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    };

    let file = ImageFile::new(&cli.file);
    let dcm = match DicomTagReader::open(&file) {
        Ok(dcm) => dcm,
        Err(e) => {
            error!("Failed to read {}: {}", file, e);
            eprintln!("Error: Failed to read {}: {}", file, e);
            process::exit(1);
        }
    };

    let entries: Vec<_> = tags
        .into_iter()
        .map(|tag| {
            let value = read_tag_from_object(&dcm, &tag, file.path());
            if let Err(e) = &value {
                debug!("{}", e);
            }
            (tag, value)
        })
        .collect();

    match cli.format {
        OutputFormat::Text => println!("{}", TagReport::new(&file, &entries)),
        OutputFormat::Json => {
            #[cfg(feature = "json")]
            {
                let values: std::collections::BTreeMap<String, Option<&dcmcheck_core::TagValue>> =
                    entries
                        .iter()
                        .map(|(tag, value)| (tag.to_string(), value.as_ref().ok()))
                        .collect();
                match serde_json::to_string_pretty(&values) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
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
