//! Post-parse validation.

use std::path::Path;

use super::Manifest;
use crate::error::{Result, SourceContext};

pub(super) fn validate_manifest(manifest: &Manifest, ctx: &SourceContext) -> Result<()> {
    require_relative(&manifest.project.root, "project.root", ctx)?;
    require_relative(&manifest.project.output, "project.output", ctx)?;

    for (surface, label) in [
        (&manifest.handlers, "handlers"),
        (&manifest.entities, "entities"),
    ] {
        require_relative(&surface.dir, &format!("{label}.dir"), ctx)?;
        if surface.base.is_empty() {
            return Err(ctx.validation_error(format!("{label}.base must not be empty")));
        }
        if surface.module.is_empty() {
            return Err(ctx.validation_error(format!("{label}.module must not be empty")));
        }
    }

    for extra in &manifest.extras {
        require_relative(&extra.file, "extra.file", ctx)?;
        if extra.names.is_empty() {
            let needle = extra.file.display().to_string();
            return Err(ctx.validation_error_for(
                format!("extra entry '{needle}' lists no names"),
                &needle,
            ));
        }
        for name in &extra.names {
            if name.is_empty() {
                return Err(ctx.validation_error("extra entry names must not be empty"));
            }
        }
    }
    Ok(())
}

fn require_relative(path: &Path, field: &str, ctx: &SourceContext) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(ctx.validation_error(format!("{field} must not be empty")));
    }
    if path.is_absolute() {
        let needle = path.display().to_string();
        return Err(ctx.validation_error_for(
            format!("{field} must be relative to the manifest directory"),
            &needle,
        ));
    }
    Ok(())
}
