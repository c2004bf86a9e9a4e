//! Outcome of a lookup against a non-essential external service.

/// Result of an image or search lookup.
///
/// `Degraded` means the service answered but had nothing usable, so a
/// placeholder stands in. `Err` means the lookup itself failed. Callers decide
/// whether a failure is absorbed or propagated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome<T> {
    Ok(T),
    Degraded(T),
    Err(String),
}

impl<T> FetchOutcome<T> {
    /// Collapse into a value, substituting `placeholder` for a failure.
    pub fn absorb(self, placeholder: T) -> T {
        match self {
            Self::Ok(value) | Self::Degraded(value) => value,
            Self::Err(_) => placeholder,
        }
    }
}
