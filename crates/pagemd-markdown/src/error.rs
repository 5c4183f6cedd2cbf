use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum ConvertError {
    #[error("invalid HTML structure: {message}")]
    #[diagnostic(
        code(pagemd_markdown::invalid_structure),
        help("The HTML structure is invalid or unexpected.")
    )]
    InvalidStructure { message: String },
}
