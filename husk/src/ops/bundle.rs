//! The bundle operation: load the project described by the manifest, run
//! the engine, write (or print) the declaration document.

use std::path::{Path, PathBuf};

use eyre::Result;
use tracing::info;

use husk_bundle::{BundleOptions, EntrySet, EntryUnit, ExtraEntry, TypeAnchor};
use husk_core::{normalize, File};
use husk_manifest::Manifest;
use husk_project::{ProjectIndex, ProjectOracle, UnitId};

/// File filters and output switches collected from the command line.
#[derive(Debug, Default, Clone)]
pub struct BundleParams {
    pub output_override: Option<PathBuf>,
    pub include_handlers: Vec<String>,
    pub exclude_handlers: Vec<String>,
    pub include_entities: Vec<String>,
    pub exclude_entities: Vec<String>,
    pub dry_run: bool,
}

/// What happened, for the command's summary output.
#[derive(Debug)]
pub struct BundleReport {
    pub output_path: Option<PathBuf>,
    pub units: usize,
    pub declarations: usize,
    pub bytes: usize,
    /// The document itself, only kept for dry runs.
    pub document: Option<String>,
}

pub fn run(manifest: &Manifest, manifest_dir: &Path, params: &BundleParams) -> Result<BundleReport> {
    let root = normalize(&manifest_dir.join(&manifest.project.root));
    let mut index = ProjectIndex::new(&root);

    let handler_ids = pretty(index.load_dir(&root.join(&manifest.handlers.dir)))?;
    let entity_ids = pretty(index.load_dir(&root.join(&manifest.entities.dir)))?;

    let mut extras = Vec::new();
    for extra in &manifest.extras {
        let unit = pretty(index.load_file(&root.join(&extra.file)))?;
        extras.push(ExtraEntry {
            unit,
            names: extra.names.clone(),
        });
    }
    pretty(index.load_import_closure())?;
    info!(units = index.len(), "project loaded");

    let entries = EntrySet {
        handlers: select(&index, &handler_ids, &params.include_handlers, &params.exclude_handlers),
        entities: select(&index, &entity_ids, &params.include_entities, &params.exclude_entities),
        extras,
    };
    let options = BundleOptions {
        handler_base: TypeAnchor::new(&manifest.handlers.module, &manifest.handlers.base),
        entity_base: TypeAnchor::new(&manifest.entities.module, &manifest.entities.base),
    };

    let oracle = ProjectOracle::build(&index);
    let output = husk_bundle::bundle(&mut index, &oracle, &entries, &options)?;
    let bytes = output.buffer.len();

    if params.dry_run {
        return Ok(BundleReport {
            output_path: None,
            units: output.units,
            declarations: output.declarations,
            bytes,
            document: Some(String::from_utf8_lossy(&output.buffer).into_owned()),
        });
    }

    let output_path = params
        .output_override
        .clone()
        .unwrap_or_else(|| manifest_dir.join(&manifest.project.output));
    File::new(&output_path, output.buffer).write()?;

    Ok(BundleReport {
        output_path: Some(output_path),
        units: output.units,
        declarations: output.declarations,
        bytes,
        document: None,
    })
}

/// Apply include/exclude file-stem filters to a directory's units. A
/// non-empty include list designates exactly those files, and designation
/// makes root-predicate failures fatal downstream.
fn select(
    index: &ProjectIndex,
    ids: &[UnitId],
    include: &[String],
    exclude: &[String],
) -> Vec<EntryUnit> {
    ids.iter()
        .filter_map(|&unit| {
            let stem = index
                .path(unit)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
            if exclude.iter().any(|e| *e == stem) {
                return None;
            }
            if include.is_empty() {
                Some(EntryUnit {
                    unit,
                    requested: false,
                })
            } else if include.iter().any(|i| *i == stem) {
                Some(EntryUnit {
                    unit,
                    requested: true,
                })
            } else {
                None
            }
        })
        .collect()
}

/// Render project diagnostics through miette before handing them to eyre,
/// so load errors keep their labeled source snippets.
fn pretty<T>(result: husk_project::Result<T>) -> Result<T> {
    result.map_err(|e| eyre::eyre!("{:?}", miette::Report::new(*e)))
}
