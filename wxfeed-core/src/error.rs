use thiserror::Error;

/// Failure to retrieve a feed document. Recoverable: the location is skipped.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("feed responded with status {status}: {body}")]
    Status { status: u16, body: String },
}

/// Malformed or incomplete feed document.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed XML: {0}")]
    MalformedXml(#[from] roxmltree::Error),

    #[error("namespace '{0}' is not declared in the feed")]
    MissingNamespace(String),

    #[error("missing element <{0}>")]
    MissingElement(&'static str),

    #[error("element <{element}> has no '{attribute}' attribute")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("unrecognised pubDate '{0}'")]
    BadTimestamp(String),
}

/// Invalid run configuration. Fatal for the whole run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown format directive '%{0}'")]
    UnknownDirective(char),

    #[error("format string ends with a lone '%'")]
    DanglingMarker,

    #[error("invalid date format '{0}'")]
    BadDateFormat(String),

    #[error("date could not be rendered with the configured date format")]
    DateRender,

    #[error("invalid feed endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Failure that aborts the remaining locations of a run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
