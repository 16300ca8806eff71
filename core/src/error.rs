//! Error contracts separating API misuse from recoverable generation failures.

use std::fmt;

use thiserror::Error;

/// Fatal configuration or argument errors. These indicate a misuse of the
/// API and are never worth retrying with another seed.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    /// A required parameter was absent or empty.
    #[error("required parameter `{0}` is missing")]
    MissingParameter(&'static str),
    /// A numeric parameter fell outside its accepted range.
    #[error("parameter `{parameter}` = {value} is out of range (expected {expected})")]
    OutOfRange {
        /// Name of the offending parameter.
        parameter: &'static str,
        /// Rendered value that failed validation.
        value: String,
        /// Human readable description of the accepted range.
        expected: &'static str,
    },
    /// Coin strategy weights did not add up to one.
    #[error("strategy weights must sum to 1.0 (got {total})")]
    WeightsDoNotSumToOne {
        /// Sum of the provided weights.
        total: f64,
    },
    /// Grid dimensions were zero or overflowed the address space.
    #[error("grid dimensions {width}x{height} are invalid")]
    InvalidDimensions {
        /// Requested column count.
        width: u32,
        /// Requested row count.
        height: u32,
    },
    /// Raw cell data did not match the declared dimensions.
    #[error("grid data holds {actual} cells but {width}x{height} requires {expected}")]
    CellCountMismatch {
        /// Declared column count.
        width: u32,
        /// Declared row count.
        height: u32,
        /// Cell count implied by the dimensions.
        expected: usize,
        /// Cell count actually supplied.
        actual: usize,
    },
    /// An ASCII grid fixture contained an unknown symbol.
    #[error("unrecognised grid symbol '{0}'")]
    InvalidSymbol(char),
    /// A position argument lay outside the grid.
    #[error("position ({x}, {y}) lies outside the {width}x{height} grid")]
    PositionOutOfBounds {
        /// Column of the rejected position.
        x: u32,
        /// Row of the rejected position.
        y: u32,
        /// Grid width.
        width: u32,
        /// Grid height.
        height: u32,
    },
    /// A position argument referenced a wall tile where floor was required.
    #[error("position ({x}, {y}) is not a floor tile")]
    PositionNotFloor {
        /// Column of the rejected position.
        x: u32,
        /// Row of the rejected position.
        y: u32,
    },
    /// The solvability chain was configured without any search method.
    #[error("fallback chain requires at least one pathfinding method")]
    EmptyMethodList,
    /// Serialized configuration could not be parsed.
    #[error("configuration could not be parsed: {0}")]
    Parse(String),
}

/// Pipeline stage that produced a recoverable failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Grid seeding, cellular automata and smoothing.
    Terrain,
    /// Region detection and corridor carving.
    Connectivity,
    /// Player spawn placement.
    SpawnPlacement,
    /// Goal placement.
    GoalPlacement,
    /// Floating platform placement and accessibility validation.
    PlatformPlacement,
    /// Coin distribution.
    CoinPlacement,
    /// Spawn-to-goal path verification.
    Solvability,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Terrain => "terrain",
            Self::Connectivity => "connectivity",
            Self::SpawnPlacement => "spawn placement",
            Self::GoalPlacement => "goal placement",
            Self::PlatformPlacement => "platform placement",
            Self::CoinPlacement => "coin placement",
            Self::Solvability => "solvability",
        };
        f.write_str(label)
    }
}

/// Ordered key/value notes attached to a failure for later inspection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Diagnostics {
    entries: Vec<(String, String)>,
}

impl Diagnostics {
    /// Creates an empty diagnostics list.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends a note.
    pub fn push(&mut self, key: impl Into<String>, value: impl fmt::Display) {
        self.entries.push((key.into(), value.to_string()));
    }

    /// Looks up the first note recorded under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, value)| value.as_str())
    }

    /// Iterator over every recorded note in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Number of recorded notes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether no notes were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (key, value)) in self.entries.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

/// Expected, recoverable failure of a random level. Callers regenerate with a
/// fresh seed.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{stage} failed: {reason}")]
pub struct GenerationFailure {
    stage: Stage,
    reason: String,
    diagnostics: Diagnostics,
}

impl GenerationFailure {
    /// Creates a failure without diagnostics.
    #[must_use]
    pub fn new(stage: Stage, reason: impl Into<String>) -> Self {
        Self {
            stage,
            reason: reason.into(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Attaches a diagnostic note, builder style.
    #[must_use]
    pub fn with_diagnostic(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.diagnostics.push(key, value);
        self
    }

    /// Stage that failed.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    /// Short description of the failure.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Notes collected while the stage ran.
    #[must_use]
    pub const fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}

/// Uniform error returned by every fallible pipeline operation.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum GenerationError {
    /// Fatal misuse of the API.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Recoverable failure of this particular seed.
    #[error(transparent)]
    Failure(#[from] GenerationFailure),
}

impl GenerationError {
    /// Reports whether regenerating with another seed may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// Returns the recoverable failure, if this is one.
    #[must_use]
    pub const fn as_failure(&self) -> Option<&GenerationFailure> {
        match self {
            Self::Failure(failure) => Some(failure),
            Self::Config(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_are_retryable_and_config_errors_are_not() {
        let failure: GenerationError = GenerationFailure::new(Stage::GoalPlacement, "no goal")
            .with_diagnostic("attempts", 10)
            .into();
        assert!(failure.is_retryable());
        assert_eq!(
            failure.as_failure().and_then(|f| f.diagnostics().get("attempts")),
            Some("10")
        );

        let config: GenerationError = ConfigError::MissingParameter("seed").into();
        assert!(!config.is_retryable());
        assert!(config.as_failure().is_none());
    }

    #[test]
    fn failure_display_names_the_stage() {
        let failure = GenerationFailure::new(Stage::Solvability, "no path");
        assert_eq!(failure.to_string(), "solvability failed: no path");
    }

    #[test]
    fn diagnostics_render_in_insertion_order() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push("b", 2);
        diagnostics.push("a", "one");
        assert_eq!(diagnostics.to_string(), "b=2, a=one");
        assert_eq!(diagnostics.len(), 2);
    }
}
