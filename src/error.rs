//! Error taxonomy for the filtering core.
//!
//! Every variant marks a violated precondition at the call site; operators are
//! deterministic, so a failure recurs on re-invocation until the caller fixes
//! the input. Out-of-bounds writes during margin-shifted passes are *not*
//! errors — they are silent drops.

/// Caller-visible failures raised by embeddings, masks and stencil passes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterError {
    /// A constant or sample value falls outside the storage range `[0, white]`.
    Range { value: i64, white: i64 },
    /// The requested operation combination is not defined.
    Unsupported { operation: &'static str, reason: &'static str },
    /// Two buffers that must agree in extent do not.
    DimensionMismatch {
        expected: (usize, usize, usize),
        found: (usize, usize, usize),
    },
    /// A coordinate-axis tag outside `{0, 1, 2}`.
    UnknownAxis { tag: u8 },
}

impl std::fmt::Display for FilterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterError::Range { value, white } => {
                write!(f, "value {value} outside storage range [0, {white}]")
            }
            FilterError::Unsupported { operation, reason } => {
                write!(f, "unsupported operation `{operation}`: {reason}")
            }
            FilterError::DimensionMismatch { expected, found } => write!(
                f,
                "dimension mismatch: expected {}x{}x{}, found {}x{}x{}",
                expected.0, expected.1, expected.2, found.0, found.1, found.2
            ),
            FilterError::UnknownAxis { tag } => {
                write!(f, "unknown axis tag {tag} (expected 0, 1 or 2)")
            }
        }
    }
}

impl std::error::Error for FilterError {}
