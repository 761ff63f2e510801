use std::path::PathBuf;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use husk_syntax::ParseError;

/// Result type for project-loading operations (boxed to keep the variants'
/// `NamedSource` payloads off the happy path).
pub type Result<T> = std::result::Result<T, Box<Error>>;

#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("failed to read '{path}'")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}")]
    #[diagnostic(code(husk::parse_error))]
    Parse {
        path: PathBuf,
        #[source_code]
        src: NamedSource<String>,
        #[label("{message}")]
        span: SourceSpan,
        message: String,
        #[source]
        source: ParseError,
    },

    #[error("'{path}' is not a directory")]
    #[diagnostic(help("check the handler/entity directories configured in husk.toml"))]
    NotADirectory { path: PathBuf },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Box<Self> {
        Box::new(Error::Io {
            path: path.into(),
            source,
        })
    }

    pub fn parse(path: impl Into<PathBuf>, content: &str, source: ParseError) -> Box<Self> {
        let path = path.into();
        let filename = path.display().to_string();
        Box::new(Error::Parse {
            src: NamedSource::new(filename, content.to_string()),
            span: source.span().into(),
            message: source.to_string(),
            source,
            path,
        })
    }

    pub fn not_a_directory(path: impl Into<PathBuf>) -> Box<Self> {
        Box::new(Error::NotADirectory { path: path.into() })
    }
}
