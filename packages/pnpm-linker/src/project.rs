use std::path::PathBuf;
use std::sync::Arc;

use linker_primitives::Locator;

/// Where a configuration value came from, for diagnostics — ambient
/// behaviour the teacher's configuration layer (`zpm-config::Setting`)
/// always carries alongside a value; this core only reads `node_linker`
/// but keeps the tag because it's free and the host already has it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigSource {
    Default,
    User,
    Project,
    Environment,
}

#[derive(Clone, Debug)]
pub struct Setting<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> Setting<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// The identifier this core registers itself under in the host's
/// `nodeLinker` configuration (spec §6).
pub const LINKER_NAME: &str = "pnpm";

#[derive(Clone, Debug)]
pub struct Configuration {
    pub node_linker: Setting<String>,
}

impl Configuration {
    pub fn is_active_linker(&self) -> bool {
        self.node_linker.value == LINKER_NAME
    }
}

/// Per-locator build metadata drawn from the project's top-level
/// `dependenciesMeta` field (spec §6's `project.getDependencyMeta`),
/// grounded on the teacher's `linker::helpers::PackageMeta`.
#[derive(Clone, Debug, Default)]
pub struct DependencyMeta {
    pub built: Option<bool>,
    pub unplugged: Option<bool>,
}

pub trait DependencyMetaSource: Send + Sync {
    fn dependency_meta(&self, locator: &Locator) -> DependencyMeta;
}

/// Manifest-derived build directives for a single package (spec §4.4
/// step 5). Parsing the manifest itself is out of scope (spec §1); the
/// host hands the extracted commands straight through.
pub trait BuildDirectiveSource: Send + Sync {
    fn build_commands(&self, locator: &Locator) -> Option<Vec<String>>;
}

/// Install-report sink (spec §6's `report.reportWarning`).
pub trait Report: Send + Sync {
    fn warn(&self, code: &str, message: &str);
}

/// A `Report` that throws every warning away; useful for hosts/tests that
/// don't care about diagnostics.
pub struct SilentReport;

impl Report for SilentReport {
    fn warn(&self, _code: &str, _message: &str) {}
}

/// The root context the host hands to this core for the duration of an
/// install (spec §3's "Project").
pub struct Project {
    pub project_cwd: PathBuf,
    pub config: Configuration,
    pub dependency_meta: Arc<dyn DependencyMetaSource>,
    pub build_directives: Arc<dyn BuildDirectiveSource>,
    pub report: Arc<dyn Report>,
}

impl Project {
    pub fn node_modules_root(&self) -> PathBuf {
        crate::path::node_modules_root(&self.project_cwd)
    }

    pub fn store_root(&self) -> PathBuf {
        crate::path::store_root(&self.project_cwd)
    }
}
