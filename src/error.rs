//! Error kinds (§7), one `#[derive(Error)]` enum per module boundary, the way
//! the teacher splits `SelectorCompileError`/`CssParseError`/
//! `PropertyParseError` by concern rather than sharing one grab-bag enum.

use thiserror::Error;

/// Selector grammar errors: malformed input from the external selector
/// parser, or a construct outside the supported grammar (§3, §7).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectorError {
    #[error("selector parse error: {0}")]
    Parse(String),
    #[error("unsupported selector construct: {0}")]
    Unsupported(String),
}

/// Emptiness decider failures (§4.5, §7): an SMT backend error is fatal to
/// the current query and is never coerced into a SAT/UNSAT answer.
#[derive(Debug, Error)]
pub enum EmptinessError {
    #[error("SMT backend error: {0}")]
    Backend(#[from] z3::Error),
    #[error(transparent)]
    Selector(#[from] SelectorError),
}

/// Crate-wide error, the type the CLI driver and public API surface bubble
/// errors up as (§7's propagation policy).
#[derive(Debug, Error)]
pub enum CascadeError {
    #[error(transparent)]
    Selector(#[from] SelectorError),
    #[error(transparent)]
    Emptiness(#[from] EmptinessError),
    /// An internal invariant (e.g. a cache keyed on a selector that was never
    /// built) was violated. `debug_assert!` catches this in debug builds; in
    /// release builds it surfaces here instead of corrupting output.
    #[error("internal cache inconsistency: {0}")]
    CacheInconsistency(String),
}
