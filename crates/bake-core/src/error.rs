use crate::span::Span;
use std::result;
use thiserror::Error;

/// Fatal errors produced by the pass pipeline. Any of these aborts the
/// remaining passes for the run; warnings travel through
/// [`crate::diagnostics`] instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("variable \"{name}\" is defined recursively, references itself")]
    SelfReference { name: String, span: Span },
    #[error("variable \"{name}\" is not a valid {ty}: {detail}")]
    Type {
        name: String,
        ty: String,
        detail: String,
        span: Span,
    },
    #[error("{message}")]
    Context { message: String, span: Span },
    #[error("conflicting implementations for {kind} \"{name}\"")]
    Conflict { kind: &'static str, name: String },
    #[error("unknown {kind} \"{name}\"")]
    UnknownExtension { kind: &'static str, name: String },
    #[error("Generic error: {0}")]
    Generic(String),
}

pub type Result<T> = result::Result<T, Error>;

impl Error {
    /// Source position of the error, when one is attached.
    pub fn span(&self) -> Option<Span> {
        match self {
            Error::SelfReference { span, .. }
            | Error::Type { span, .. }
            | Error::Context { span, .. } => Some(*span),
            _ => None,
        }
    }
}

// Convert from eyre::Report to our Error type
impl From<eyre::Report> for Error {
    fn from(err: eyre::Report) -> Self {
        Error::Generic(err.to_string())
    }
}

// Convert from std::io::Error to our Error type
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Generic(e.to_string())
    }
}
impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Generic(s)
    }
}
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Generic(e.to_string())
    }
}
