//! Activity catalogs: immutable tool-tier and target tables.
//!
//! Each activity family ships one versioned YAML file:
//!
//! ```yaml
//! version: 1
//! tools:
//!   - id: bronze
//!     required_level: 1
//!     ...
//! targets:
//!   - id: normal
//!     required_level: 1
//!     ...
//! ```
//!
//! Catalogs are loaded once at startup and are read-only afterwards. Entries
//! are held behind [`Arc`] so sessions reference a target's configuration
//! without copying it.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use skilling_types::{ActivityFamily, TargetId, ToolTierId};
use tracing::info;

use crate::formula::{
    ActivityFormula, Fishing, Harvesting, Mining, Woodcutting,
};

/// Catalog file format version this build understands.
pub const CATALOG_VERSION: u32 = 1;

/// Errors that can occur while loading a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Failed to read a catalog file.
    #[error("failed to read catalog {path}: {source}")]
    Io {
        /// The file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse catalog YAML.
    #[error("failed to parse {family} catalog: {source}")]
    Yaml {
        /// The family whose catalog failed to parse.
        family: ActivityFamily,
        /// The underlying YAML error.
        source: serde_yml::Error,
    },

    /// The file declares a format version this build does not support.
    #[error("{family} catalog has unsupported version {version} (expected {CATALOG_VERSION})")]
    UnsupportedVersion {
        /// The family whose catalog was rejected.
        family: ActivityFamily,
        /// The declared version.
        version: u32,
    },

    /// Two entries of the same kind share an id.
    #[error("{family} catalog defines {id:?} more than once")]
    DuplicateId {
        /// The family whose catalog was rejected.
        family: ActivityFamily,
        /// The repeated id.
        id: String,
    },

    /// An entry failed validation.
    #[error("{family} catalog entry {id:?} is invalid: {reason}")]
    InvalidEntry {
        /// The family whose catalog was rejected.
        family: ActivityFamily,
        /// The offending entry.
        id: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The catalog defines no tools or no targets.
    #[error("{family} catalog must define at least one tool and one target")]
    Empty {
        /// The family whose catalog was rejected.
        family: ActivityFamily,
    },
}

/// Inclusive quantity range granted on a successful roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct YieldRange {
    /// Smallest yield.
    pub min: u32,
    /// Largest yield.
    pub max: u32,
}

/// A tool tier row in a catalog.
pub trait ToolTier: DeserializeOwned + Debug + Send + Sync + 'static {
    /// Catalog key.
    fn id(&self) -> &ToolTierId;

    /// Minimum skill level needed to use the tool.
    fn required_level(&self) -> u32;

    /// Ticks between session start and the first roll.
    fn initial_delay_ticks(&self) -> u64;

    /// Family-specific checks beyond the shared ones.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// A gathering target row in a catalog.
pub trait GatherTarget: DeserializeOwned + Debug + Send + Sync + 'static {
    /// Catalog key.
    fn id(&self) -> &TargetId;

    /// Minimum skill level needed to gather from the target.
    fn required_level(&self) -> u32;

    /// XP granted per successful roll.
    fn xp(&self) -> u32;

    /// Inventory item granted per successful roll.
    fn item(&self) -> &str;

    /// Quantity range for stock-yielding targets; `None` means one unit.
    fn yield_range(&self) -> Option<YieldRange> {
        None
    }

    /// Ticks the node stays unavailable after a successful gather, if it
    /// ever depletes. Passed to [`NodeAvailability::on_gathered`]; the
    /// default [`AlwaysAvailable`] policy ignores it and
    /// [`RespawnTimers`] depletes the target for that long.
    ///
    /// [`NodeAvailability::on_gathered`]: crate::nodes::NodeAvailability::on_gathered
    /// [`AlwaysAvailable`]: crate::nodes::AlwaysAvailable
    /// [`RespawnTimers`]: crate::nodes::RespawnTimers
    fn respawn_ticks(&self) -> Option<u64> {
        None
    }

    /// Family-specific checks beyond the shared ones.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// On-disk shape of a catalog file.
#[derive(Debug, Deserialize)]
struct CatalogFile<T, G> {
    version: u32,
    #[serde(default = "Vec::new")]
    tools: Vec<T>,
    #[serde(default = "Vec::new")]
    targets: Vec<G>,
}

/// Immutable tool and target tables for one activity family.
#[derive(Debug)]
pub struct ActivityCatalog<T, G> {
    family: ActivityFamily,
    tools: BTreeMap<ToolTierId, Arc<T>>,
    targets: BTreeMap<TargetId, Arc<G>>,
}

impl<T: ToolTier, G: GatherTarget> ActivityCatalog<T, G> {
    /// Parse and validate a catalog from YAML text.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] describing the first problem found.
    pub fn from_yaml(family: ActivityFamily, yaml: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile<T, G> =
            serde_yml::from_str(yaml).map_err(|source| CatalogError::Yaml { family, source })?;

        if file.version != CATALOG_VERSION {
            return Err(CatalogError::UnsupportedVersion {
                family,
                version: file.version,
            });
        }
        if file.tools.is_empty() || file.targets.is_empty() {
            return Err(CatalogError::Empty { family });
        }

        let mut tools = BTreeMap::new();
        for tool in file.tools {
            let id = tool.id().clone();
            check_common(family, id.as_str(), tool.validate())?;
            if tool.initial_delay_ticks() == 0 {
                return Err(invalid(family, id.as_str(), "initial delay must be at least 1 tick"));
            }
            if tools.insert(id.clone(), Arc::new(tool)).is_some() {
                return Err(CatalogError::DuplicateId { family, id: id.0 });
            }
        }

        let mut targets = BTreeMap::new();
        for target in file.targets {
            let id = target.id().clone();
            check_common(family, id.as_str(), target.validate())?;
            if target.item().is_empty() {
                return Err(invalid(family, id.as_str(), "item must not be empty"));
            }
            if let Some(range) = target.yield_range() {
                if range.min == 0 || range.min > range.max {
                    return Err(invalid(
                        family,
                        id.as_str(),
                        &format!("yield range {}..={} is empty or zero", range.min, range.max),
                    ));
                }
            }
            if targets.insert(id.clone(), Arc::new(target)).is_some() {
                return Err(CatalogError::DuplicateId { family, id: id.0 });
            }
        }

        Ok(Self {
            family,
            tools,
            targets,
        })
    }

    /// Read, parse and validate a catalog file.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Io`] if the file cannot be read, otherwise the
    /// same errors as [`from_yaml`](Self::from_yaml).
    pub fn load(family: ActivityFamily, path: &Path) -> Result<Self, CatalogError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(family, &yaml)
    }

    /// The family this catalog configures.
    pub const fn family(&self) -> ActivityFamily {
        self.family
    }

    /// Look up a tool tier.
    pub fn tool(&self, id: &str) -> Option<&Arc<T>> {
        self.tools.get(id)
    }

    /// Look up a target.
    pub fn target(&self, id: &str) -> Option<&Arc<G>> {
        self.targets.get(id)
    }

    /// Iterate tool tiers in key order.
    pub fn tools(&self) -> impl Iterator<Item = &Arc<T>> {
        self.tools.values()
    }

    /// Iterate targets in key order.
    pub fn targets(&self) -> impl Iterator<Item = &Arc<G>> {
        self.targets.values()
    }
}

fn invalid(family: ActivityFamily, id: &str, reason: &str) -> CatalogError {
    CatalogError::InvalidEntry {
        family,
        id: id.to_owned(),
        reason: reason.to_owned(),
    }
}

fn check_common(
    family: ActivityFamily,
    id: &str,
    family_check: Result<(), String>,
) -> Result<(), CatalogError> {
    if id.trim().is_empty() {
        return Err(invalid(family, id, "id must not be empty"));
    }
    family_check.map_err(|reason| CatalogError::InvalidEntry {
        family,
        id: id.to_owned(),
        reason,
    })
}

/// Check that a probability input is finite and inside `[low, high]`.
pub(crate) fn check_probability(name: &str, value: f64, low: f64, high: f64) -> Result<(), String> {
    if value.is_finite() && value >= low && value <= high {
        Ok(())
    } else {
        Err(format!("{name} must be within [{low}, {high}], got {value}"))
    }
}

/// Catalog type for a formula's family.
pub type CatalogFor<F> =
    ActivityCatalog<<F as ActivityFormula>::Tool, <F as ActivityFormula>::Target>;

/// The four activity catalogs, shared read-only by the engines.
#[derive(Debug, Clone)]
pub struct Catalogs {
    /// Axes and trees.
    pub woodcutting: Arc<CatalogFor<Woodcutting>>,
    /// Pickaxes and ores.
    pub mining: Arc<CatalogFor<Mining>>,
    /// Rods and fish.
    pub fishing: Arc<CatalogFor<Fishing>>,
    /// Gloves and harvestables.
    pub harvesting: Arc<CatalogFor<Harvesting>>,
}

impl Catalogs {
    /// Load the tables compiled into the binary.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if a built-in table is malformed.
    pub fn builtin() -> Result<Self, CatalogError> {
        Ok(Self {
            woodcutting: Arc::new(ActivityCatalog::from_yaml(
                ActivityFamily::Woodcutting,
                include_str!("../data/woodcutting.yaml"),
            )?),
            mining: Arc::new(ActivityCatalog::from_yaml(
                ActivityFamily::Mining,
                include_str!("../data/mining.yaml"),
            )?),
            fishing: Arc::new(ActivityCatalog::from_yaml(
                ActivityFamily::Fishing,
                include_str!("../data/fishing.yaml"),
            )?),
            harvesting: Arc::new(ActivityCatalog::from_yaml(
                ActivityFamily::Harvesting,
                include_str!("../data/harvesting.yaml"),
            )?),
        })
    }

    /// Load `<family>.yaml` for every family from a directory.
    ///
    /// # Errors
    ///
    /// Returns the first [`CatalogError`] encountered.
    pub fn load_dir(dir: &Path) -> Result<Self, CatalogError> {
        let path_for = |family: ActivityFamily| dir.join(format!("{}.yaml", family.skill_name()));
        let catalogs = Self {
            woodcutting: Arc::new(ActivityCatalog::load(
                ActivityFamily::Woodcutting,
                &path_for(ActivityFamily::Woodcutting),
            )?),
            mining: Arc::new(ActivityCatalog::load(
                ActivityFamily::Mining,
                &path_for(ActivityFamily::Mining),
            )?),
            fishing: Arc::new(ActivityCatalog::load(
                ActivityFamily::Fishing,
                &path_for(ActivityFamily::Fishing),
            )?),
            harvesting: Arc::new(ActivityCatalog::load(
                ActivityFamily::Harvesting,
                &path_for(ActivityFamily::Harvesting),
            )?),
        };
        info!(dir = %dir.display(), "Activity catalogs loaded");
        Ok(catalogs)
    }
}
