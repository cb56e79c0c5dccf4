//! Text processing for the language tutor
//!
//! This crate provides:
//! - **Normalization**: lowercasing, apostrophe unification, whitespace collapse
//! - **Tokenization**: Unicode-aware word tokens, contraction-safe
//! - **Pattern detection**: declarative grammar-construction rules
//! - **Heuristic extraction**: fallback candidates when the tutor proposes none
//! - **Canonicalization**: typed, deduplicated, precedence-resolved units
//!
//! # Example
//!
//! ```
//! use lingua_config::PedagogyConfig;
//! use lingua_text_processing::Canonicalizer;
//!
//! let canonicalizer = Canonicalizer::from_config(&PedagogyConfig::default());
//! let units = canonicalizer.canonicalize(&[], "", "Bonjour");
//! assert_eq!(units[0].canonical_key, "word:bonjour");
//! ```

pub mod canonicalizer;
pub mod heuristic;
pub mod normalize;
pub mod patterns;

pub use canonicalizer::{classify_kind, coerce_candidates, Canonicalizer};
pub use heuristic::HeuristicExtractor;
pub use normalize::{
    comparison_key, comparison_tokens, contains_run, fold_accents, grapheme_len, normalize,
    tokenize, unit_tokens,
};
pub use patterns::{CompiledPattern, PatternSet};
