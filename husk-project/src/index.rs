//! The in-memory project index: every source unit loaded for one run.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::debug;
use walkdir::WalkDir;

use husk_core::normalize;
use husk_syntax::{parse_unit, render_unit, SourceUnit, Statement};

use crate::error::{Error, Result};

/// Handle to a loaded unit. Ids are positions in discovery order and stay
/// valid for the whole run; units are only ever appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(usize);

impl UnitId {
    pub fn index(self) -> usize {
        self.0
    }

    pub(crate) fn from_index(index: usize) -> Self {
        UnitId(index)
    }
}

/// Owns the parsed units of one pipeline run. Mutated in place by entry
/// extraction, closure substitution, and pruning; the run has exclusive
/// access for its whole duration.
#[derive(Debug, Default)]
pub struct ProjectIndex {
    root: PathBuf,
    units: IndexMap<PathBuf, SourceUnit>,
}

impl ProjectIndex {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: normalize(&root.into()),
            units: IndexMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = UnitId> {
        (0..self.units.len()).map(UnitId)
    }

    pub fn unit(&self, id: UnitId) -> &SourceUnit {
        self.units
            .get_index(id.0)
            .map(|(_, unit)| unit)
            .expect("unit id out of range")
    }

    pub fn unit_mut(&mut self, id: UnitId) -> &mut SourceUnit {
        self.units
            .get_index_mut(id.0)
            .map(|(_, unit)| unit)
            .expect("unit id out of range")
    }

    pub fn path(&self, id: UnitId) -> &Path {
        &self.unit(id).path
    }

    pub fn id_of(&self, path: &Path) -> Option<UnitId> {
        self.units.get_index_of(&normalize(path)).map(UnitId)
    }

    /// Parse and add an in-memory source. Existing units are returned
    /// as-is; a unit is processed by exactly one pipeline run.
    pub fn add_source(&mut self, path: impl Into<PathBuf>, source: &str) -> Result<UnitId> {
        let path = normalize(&path.into());
        if let Some(existing) = self.units.get_index_of(&path) {
            return Ok(UnitId(existing));
        }
        let unit = parse_unit(path.clone(), source)
            .map_err(|e| Error::parse(path.clone(), source, e))?;
        let (id, _) = self.units.insert_full(path, unit);
        Ok(UnitId(id))
    }

    /// Load a single file from disk.
    pub fn load_file(&mut self, path: &Path) -> Result<UnitId> {
        let path = normalize(path);
        if let Some(existing) = self.units.get_index_of(&path) {
            return Ok(UnitId(existing));
        }
        let content =
            std::fs::read_to_string(&path).map_err(|e| Error::io(path.clone(), e))?;
        self.add_source(path, &content)
    }

    /// Load every `.ts` file directly inside `dir` (non-recursive), in
    /// file-name order.
    pub fn load_dir(&mut self, dir: &Path) -> Result<Vec<UnitId>> {
        if !dir.is_dir() {
            return Err(Error::not_a_directory(dir));
        }
        let mut ids = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                let source = e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("walkdir error"));
                Error::io(dir, source)
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.path().extension().and_then(|e| e.to_str()) != Some("ts") {
                continue;
            }
            ids.push(self.load_file(entry.path())?);
        }
        debug!(dir = %dir.display(), units = ids.len(), "loaded directory");
        Ok(ids)
    }

    /// Resolve a relative import specifier from a unit to a project path.
    /// Package specifiers resolve to nothing; they are ambient.
    pub fn resolve_specifier(&self, from: UnitId, specifier: &str) -> Option<PathBuf> {
        if !specifier.starts_with("./") && !specifier.starts_with("../") {
            return None;
        }
        let base = self.path(from).parent()?.to_path_buf();
        let mut target = base.join(specifier);
        if target.extension().and_then(|e| e.to_str()) != Some("ts") {
            target.set_extension("ts");
        }
        Some(normalize(&target))
    }

    /// Follow relative import and re-export edges from every loaded unit,
    /// loading referenced files from disk until the closure is complete.
    /// Specifiers whose target file does not exist are left unresolved;
    /// the oracle treats those references as ambient.
    pub fn load_import_closure(&mut self) -> Result<()> {
        let mut cursor = 0;
        while cursor < self.units.len() {
            let id = UnitId(cursor);
            cursor += 1;

            let mut specifiers = Vec::new();
            for stmt in &self.unit(id).statements {
                match stmt {
                    Statement::Import(import) => specifiers.push(import.specifier.clone()),
                    Statement::Export(export) => {
                        if let Some(spec) = &export.specifier {
                            specifiers.push(spec.clone());
                        }
                    }
                    Statement::Decl(_) => {}
                }
            }

            for specifier in specifiers {
                let Some(target) = self.resolve_specifier(id, &specifier) else {
                    continue;
                };
                if self.units.contains_key(&target) {
                    continue;
                }
                if !target.is_file() {
                    debug!(%specifier, target = %target.display(), "import target missing, treated as ambient");
                    continue;
                }
                self.load_file(&target)?;
            }
        }
        Ok(())
    }

    /// Declarations-only text of a unit: bodies and initializers are not
    /// part of the tree, so rendering is the emission.
    pub fn rendered(&self, id: UnitId) -> String {
        render_unit(self.unit(id))
    }
}
