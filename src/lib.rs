//! Blank the lifecycle functions of a terraform provider.
//!
//! A run loads the type-checked provider sources from a
//! [`provider::SemanticModelProvider`], finds every create/update/delete
//! function value under the two authoring conventions, turns each into a
//! no-op and writes back only the files it changed.

pub mod ast;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod layout;
pub mod matchers;
pub mod observability;
pub mod printer;
pub mod program;
pub mod provider;
pub mod registry;
pub mod resolver;
pub mod rewriter;
pub mod serializer;
pub mod testkit;
pub mod types;

pub use crate::config::{load_config, RewriteConfig};
pub use crate::engine::{rewrite_program, run, RunSummary};
pub use crate::errors::{Error, Result};
pub use crate::matchers::{Convention, MatchSite};
pub use crate::program::Program;
pub use crate::provider::{CommandProvider, JsonFileProvider, SemanticModelProvider};
pub use crate::serializer::{DryRunWriter, InPlaceWriter, Serializer};
pub use crate::types::{FunctionSignature, Type};
