//! Core of a pnpm-style linker: materialises a resolved dependency graph
//! onto disk using a content-addressed store and per-package symlink
//! farms. The resolver that produces the graph, fetchers, manifest
//! parsing, and the host's configuration/logging systems are all external
//! collaborators — see [`project`] for the traits this crate expects of
//! them.

pub mod actions;
pub mod custom_data;
pub mod data_model;
pub mod error;
mod fsops;
pub mod installer;
pub mod listing;
pub mod path;
pub mod project;
pub mod resolver;

pub use custom_data::CustomData;
pub use data_model::{FetchResult, LinkType, Package};
pub use error::{Error, Result};
pub use installer::{Installer, MaterializeResult};
pub use project::{
    BuildDirectiveSource, Configuration, ConfigSource, DependencyMeta, DependencyMetaSource, Project, Report,
    Setting, SilentReport, LINKER_NAME,
};
pub use resolver::{load_or_err, Resolver};
