//! Built-in battleground topologies.
//!
//! Every map ships as a JSON table compiled into the binary. Setting
//! `WARFRONT_MAP_DIR` makes [`load`] prefer `<dir>/<map>.json`; a table
//! there that cannot be read or fails validation is logged and the
//! built-in table is used instead.

use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

use warfront_core::topology::{Topology, TopologyError};

/// Environment variable naming a directory of override tables.
pub const MAP_DIR_ENV: &str = "WARFRONT_MAP_DIR";

const BUILTIN_ALTERAC_VALLEY: &str = include_str!("data/alterac_valley.json");
const BUILTIN_WARSONG_GULCH: &str = include_str!("data/warsong_gulch.json");
const BUILTIN_ARATHI_BASIN: &str = include_str!("data/arathi_basin.json");
const BUILTIN_EYE_OF_THE_STORM: &str = include_str!("data/eye_of_the_storm.json");
const BUILTIN_STRAND_OF_THE_ANCIENTS: &str = include_str!("data/strand_of_the_ancients.json");
const BUILTIN_ISLE_OF_CONQUEST: &str = include_str!("data/isle_of_conquest.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapId {
    AlteracValley,
    WarsongGulch,
    ArathiBasin,
    EyeOfTheStorm,
    StrandOfTheAncients,
    IsleOfConquest,
}

impl MapId {
    pub const ALL: [MapId; 6] = [
        MapId::AlteracValley,
        MapId::WarsongGulch,
        MapId::ArathiBasin,
        MapId::EyeOfTheStorm,
        MapId::StrandOfTheAncients,
        MapId::IsleOfConquest,
    ];

    /// Table name, also the override file stem.
    pub fn name(self) -> &'static str {
        match self {
            MapId::AlteracValley => "alterac_valley",
            MapId::WarsongGulch => "warsong_gulch",
            MapId::ArathiBasin => "arathi_basin",
            MapId::EyeOfTheStorm => "eye_of_the_storm",
            MapId::StrandOfTheAncients => "strand_of_the_ancients",
            MapId::IsleOfConquest => "isle_of_conquest",
        }
    }

    pub fn short_name(self) -> &'static str {
        match self {
            MapId::AlteracValley => "av",
            MapId::WarsongGulch => "wsg",
            MapId::ArathiBasin => "ab",
            MapId::EyeOfTheStorm => "eots",
            MapId::StrandOfTheAncients => "sota",
            MapId::IsleOfConquest => "ioc",
        }
    }

    fn builtin_table(self) -> &'static str {
        match self {
            MapId::AlteracValley => BUILTIN_ALTERAC_VALLEY,
            MapId::WarsongGulch => BUILTIN_WARSONG_GULCH,
            MapId::ArathiBasin => BUILTIN_ARATHI_BASIN,
            MapId::EyeOfTheStorm => BUILTIN_EYE_OF_THE_STORM,
            MapId::StrandOfTheAncients => BUILTIN_STRAND_OF_THE_ANCIENTS,
            MapId::IsleOfConquest => BUILTIN_ISLE_OF_CONQUEST,
        }
    }
}

impl fmt::Display for MapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MapId {
    type Err = MapLoadError;

    /// Accepts the table name or the short name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        MapId::ALL
            .into_iter()
            .find(|map| map.name() == wanted || map.short_name() == wanted)
            .ok_or_else(|| MapLoadError::UnknownMap(s.to_string()))
    }
}

#[derive(Debug, Error)]
pub enum MapLoadError {
    #[error("failed to parse map table: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read map table from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid map table: {0}")]
    Topology(#[from] TopologyError),
    #[error("unknown map '{0}'")]
    UnknownMap(String),
}

/// Load a map, preferring an override table from [`MAP_DIR_ENV`].
pub fn load(map: MapId) -> Result<Topology, MapLoadError> {
    if let Some(dir) = env::var_os(MAP_DIR_ENV).map(PathBuf::from) {
        match load_from_dir(&dir, map) {
            Ok(topology) => {
                tracing::info!(
                    target: "warfront::maps",
                    map = %map,
                    dir = %dir.display(),
                    "map.override_loaded"
                );
                return Ok(topology);
            }
            Err(err) => {
                tracing::warn!(
                    target: "warfront::maps",
                    map = %map,
                    dir = %dir.display(),
                    error = %err,
                    "map.override_failed"
                );
            }
        }
    }
    builtin(map)
}

/// The table compiled into the binary.
pub fn builtin(map: MapId) -> Result<Topology, MapLoadError> {
    parse_topology(map.builtin_table())
}

/// Read `<dir>/<map>.json`.
pub fn load_from_dir(dir: &Path, map: MapId) -> Result<Topology, MapLoadError> {
    let path = dir.join(format!("{}.json", map.name()));
    let contents = fs::read_to_string(&path).map_err(|source| MapLoadError::Read {
        path: path.clone(),
        source,
    })?;
    parse_topology(&contents)
}

/// Parse and validate a topology table.
pub fn parse_topology(data: &str) -> Result<Topology, MapLoadError> {
    let topology: Topology = serde_json::from_str(data)?;
    topology.validate()?;
    Ok(topology)
}
