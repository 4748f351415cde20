use std::fmt;

use super::direction::FetchDirection;

/// Breach of a paging contract. A programming error, never a user-facing state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// A page was appended while the forward cursor was terminal.
    AppendWhileTerminal,
    /// A page was prepended while the backward cursor was terminal.
    PrependWhileTerminal,
    /// Append/prepend on a store that never received its initial page.
    StoreNotSeeded,
    /// A compensation settled for a direction that was not waiting for one.
    CompensationNotPending { direction: FetchDirection },
    /// A top-growing commit reached the compensator without a viewport anchor.
    CompensationWithoutAnchor { direction: FetchDirection },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvariantViolation::AppendWhileTerminal => {
                write!(f, "append while the forward edge is terminal")
            }
            InvariantViolation::PrependWhileTerminal => {
                write!(f, "prepend while the backward edge is terminal")
            }
            InvariantViolation::StoreNotSeeded => {
                write!(f, "page store has no initial page")
            }
            InvariantViolation::CompensationNotPending { direction } => {
                write!(f, "{direction} compensation settled twice")
            }
            InvariantViolation::CompensationWithoutAnchor { direction } => {
                write!(f, "{direction} commit has no viewport anchor")
            }
        }
    }
}

impl std::error::Error for InvariantViolation {}

/// The sentinel observer could not be set up.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorError {
    /// Viewport has no usable size (not laid out yet, or detached).
    EmptyViewport { client_height: f32 },
    /// Viewport is unbounded, so every sentinel would always be visible.
    UnboundedViewport { client_height: f32 },
    /// Scroll metrics contain NaN or infinities.
    NonFiniteMetrics,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorError::EmptyViewport { client_height } => {
                write!(f, "viewport has no height ({client_height})")
            }
            SensorError::UnboundedViewport { client_height } => {
                write!(f, "viewport is unbounded ({client_height})")
            }
            SensorError::NonFiniteMetrics => write!(f, "viewport metrics are not finite"),
        }
    }
}

impl std::error::Error for SensorError {}

/// Rejected [`InfiniteListConfig`](super::InfiniteListConfig).
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    ThresholdOutOfRange(f32),
    ZeroMaxPages,
    InvalidSentinelExtent(f32),
    /// The attached host does not match the `virtualized` flag.
    HostMismatch { virtualized: bool },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ThresholdOutOfRange(value) => {
                write!(f, "visibility threshold {value} outside (0, 1]")
            }
            ConfigError::ZeroMaxPages => write!(f, "max_pages must be at least 1"),
            ConfigError::InvalidSentinelExtent(value) => {
                write!(f, "sentinel extent {value} must be finite and non-negative")
            }
            ConfigError::HostMismatch { virtualized } => {
                if *virtualized {
                    write!(f, "virtualized list attached to a plain viewport")
                } else {
                    write!(f, "plain list attached to a virtualization engine")
                }
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Errors surfaced by the paging layer.
#[derive(Debug, Clone, PartialEq)]
pub enum PagingError {
    /// The data source failed. Recovered locally; the direction is retryable.
    FetchFailed {
        direction: FetchDirection,
        message: String,
    },
    InvariantViolation(InvariantViolation),
    /// Auto-fetch disabled; manual triggers still work.
    SensorSetupFailed(SensorError),
    Config(ConfigError),
}

impl PagingError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, PagingError::FetchFailed { .. })
    }
}

impl fmt::Display for PagingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PagingError::FetchFailed { direction, message } => {
                write!(f, "{direction} fetch failed: {message}")
            }
            PagingError::InvariantViolation(violation) => {
                write!(f, "paging invariant violated: {violation}")
            }
            PagingError::SensorSetupFailed(err) => write!(f, "sensor setup failed: {err}"),
            PagingError::Config(err) => write!(f, "invalid configuration: {err}"),
        }
    }
}

impl std::error::Error for PagingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PagingError::FetchFailed { .. } => None,
            PagingError::InvariantViolation(violation) => Some(violation),
            PagingError::SensorSetupFailed(err) => Some(err),
            PagingError::Config(err) => Some(err),
        }
    }
}

impl From<InvariantViolation> for PagingError {
    fn from(value: InvariantViolation) -> Self {
        PagingError::InvariantViolation(value)
    }
}

impl From<SensorError> for PagingError {
    fn from(value: SensorError) -> Self {
        PagingError::SensorSetupFailed(value)
    }
}

impl From<ConfigError> for PagingError {
    fn from(value: ConfigError) -> Self {
        PagingError::Config(value)
    }
}
