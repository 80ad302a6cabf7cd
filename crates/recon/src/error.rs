use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (bad key width, no statement source, etc.).
    ConfigValidation(String),
    /// A configured column is absent from a source's header row.
    MissingColumn { source: String, column: String },
    /// DE-PARA table could not be built (unkeyable or conflicting entries).
    Translation(String),
    /// Malformed CSV in a source file.
    Csv { source: String, message: String },
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingColumn { source, column } => {
                write!(f, "source '{source}': missing column '{column}'")
            }
            Self::Translation(msg) => write!(f, "translation table error: {msg}"),
            Self::Csv { source, message } => write!(f, "source '{source}': CSV error: {message}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
