use thiserror::Error;

/// Failure classes of the load pipeline.
///
/// A round without preloaded data is deliberately not represented here: it is
/// a first-class `RoundState` (`has_data == false`), not an error.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Boundary geometry could not be fetched or parsed. Rendering is skipped
    /// and a fallback message is shown; retry happens through navigation.
    #[error("geometry unavailable for {key}: {reason}")]
    Geometry { key: String, reason: String },

    /// A statistics resource could not be fetched or decoded. Callers fall
    /// back to the reference dataset or zero placeholders.
    #[error("statistics unavailable ({what}): {reason}")]
    Statistics { what: String, reason: String },

    /// Tabular data was fetched but could not be turned into usable rows.
    #[error("tabular data unusable: {reason}")]
    Parse { reason: String },
}

impl FetchError {
    pub(crate) fn geometry(key: impl Into<String>, reason: impl ToString) -> Self {
        Self::Geometry { key: key.into(), reason: reason.to_string() }
    }

    pub(crate) fn statistics(what: impl Into<String>, reason: impl ToString) -> Self {
        Self::Statistics { what: what.into(), reason: reason.to_string() }
    }

    pub(crate) fn parse(reason: impl ToString) -> Self {
        Self::Parse { reason: reason.to_string() }
    }
}
