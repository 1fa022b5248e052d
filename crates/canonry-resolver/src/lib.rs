//! Canonry Resolver
//!
//! Read-path decisions over governed claims. Everything here is a pure
//! function of its inputs except [`select_current`], which only reads the
//! store to build the selector's inputs.
//!
//! - [`select`]: which of several competing answers is current
//! - [`select_current`]: the same, for stored claims and their axis
//! - [`Aggregator`]: one verdict from many evidence comparisons
//! - [`IntentResolver`]: which claim cluster a query is about
//! - [`EntityMerger`]: whether two entity names denote the same thing
//!
//! Each of them answers "don't know" explicitly rather than guessing.
//!
//! # Examples
//!
//! ```
//! use canonry_domain::{AuthorityLevel, ClaimId};
//! use canonry_resolver::{select, SelectionCandidate, SelectionPolicy};
//!
//! let candidates = vec![
//!     SelectionCandidate::new(ClaimId::from_value(1), "99.5%", AuthorityLevel::Community),
//!     SelectionCandidate::new(ClaimId::from_value(2), "99.9%", AuthorityLevel::Official),
//! ];
//! let outcome = select(&SelectionPolicy::default(), &candidates, None);
//! assert_eq!(outcome.selected().unwrap().value, "99.9%");
//! ```

#![warn(missing_docs)]

mod aggregator;
mod config;
mod current;
mod entity;
mod error;
mod intent;
mod selector;

pub use aggregator::{AggregateVerdict, Aggregator, Comparison, ReasonCode, Verdict};
pub use config::{AggregatorConfig, IntentConfig, ResolverConfig, SimilarityConfig};
pub use current::select_current;
pub use entity::{EntityMerger, EntitySimilarity, MergeBasis, MergeResolution};
pub use error::ResolverError;
pub use intent::{ClusterCandidate, DisambiguationOption, IntentResolution, IntentResolver};
pub use selector::{
    select, SelectionBasis, SelectionCandidate, SelectionOutcome, SelectionPolicy, TieBreak,
};
