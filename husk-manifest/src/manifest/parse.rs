//! Manifest parsing from files and strings.

use std::{path::Path, str::FromStr};

use super::Manifest;
use crate::error::{Error, Result, SourceContext};

impl FromStr for Manifest {
    type Err = Box<Error>;

    fn from_str(s: &str) -> Result<Self> {
        parse_manifest(s, "husk.toml")
    }
}

impl Manifest {
    /// Parse a husk.toml file from the given path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Box::new(Error::Io {
                path: path.to_path_buf(),
                source: e,
            })
        })?;
        parse_manifest(&content, &path.display().to_string())
    }

    /// Parse a husk.toml from a string with a custom filename for error
    /// reporting.
    pub fn from_str_with_filename(content: &str, filename: &str) -> Result<Self> {
        parse_manifest(content, filename)
    }
}

/// Parse a manifest from content with the given filename for error
/// reporting.
pub fn parse_manifest(content: &str, filename: &str) -> Result<Manifest> {
    let ctx = SourceContext::new(content, filename);
    let manifest: Manifest = toml::from_str(content).map_err(|e| ctx.parse_error(e))?;
    super::validate::validate_manifest(&manifest, &ctx)?;
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: &str = r#"
        [project]
        root = "src"
        output = "declaration/api.d.ts"

        [handlers]
        dir = "handler"
        base = "Route"
        module = "@sora/framework"

        [entities]
        dir = "database"
        base = "BaseModel"
        module = "@sora/orm"

        [[extra]]
        file = "common/ServiceName.ts"
        names = ["ServiceName"]
    "#;

    #[test]
    fn test_parse_full_manifest() {
        let manifest = Manifest::from_str(GOOD).expect("should parse");
        assert_eq!(manifest.project.root.to_str(), Some("src"));
        assert_eq!(manifest.handlers.base, "Route");
        assert_eq!(manifest.entities.module, "@sora/orm");
        assert_eq!(manifest.extras.len(), 1);
        assert_eq!(manifest.extras[0].names, vec!["ServiceName"]);
    }

    #[test]
    fn test_extras_default_to_empty() {
        let manifest = Manifest::from_str(
            r#"
            [project]
            root = "src"
            output = "api.d.ts"

            [handlers]
            dir = "handler"
            base = "Route"
            module = "@sora/framework"

            [entities]
            dir = "database"
            base = "BaseModel"
            module = "@sora/orm"
        "#,
        )
        .expect("should parse");
        assert!(manifest.extras.is_empty());
    }

    #[test]
    fn test_missing_section_is_parse_error() {
        let err = Manifest::from_str("[project]\nroot = 'src'\noutput = 'api.d.ts'\n").unwrap_err();
        assert!(matches!(*err, Error::Parse { .. }));
    }

    #[test]
    fn test_syntax_error_carries_span() {
        let err = Manifest::from_str("[project\nroot = 'src'").unwrap_err();
        match *err {
            Error::Parse { span, .. } => assert!(span.is_some()),
            other => panic!("expected parse error, got {other:?}"),
        }
    }
}
