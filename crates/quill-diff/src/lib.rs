//! Diff filtering ahead of review.
//!
//! Compiles exclude globs into anchored regular expressions and removes the
//! matching `diff --git` header lines from a unified diff.

pub mod filter;
