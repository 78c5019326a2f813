//! Static game configuration.
//!
//! Loaded once at process start and passed down as an immutable
//! `Arc<GameConfig>` — facades hand it to managers, managers to actors.
//! Nothing in the runtime reads process-wide state at request time.

use crate::core::{GameError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Starting resource grant for a freshly created player.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleDefaults {
    pub wood: i64,
    pub iron: i64,
    pub stone: i64,
    pub grain: i64,
    pub gold: i64,
    pub decree: i64,
}

impl Default for RoleDefaults {
    fn default() -> Self {
        Self {
            wood: 10_000,
            iron: 10_000,
            stone: 10_000,
            grain: 10_000,
            gold: 1_000,
            decree: 20,
        }
    }
}

/// General-related basic parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralBasics {
    /// Physical power a newly drafted general starts with.
    pub power_limit: i64,
    /// How many generals a player is seeded with.
    pub skill_limit: usize,
}

impl Default for GeneralBasics {
    fn default() -> Self {
        Self {
            power_limit: 100,
            skill_limit: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityBasics {
    /// Durability a newly founded city starts with.
    pub durable: i64,
}

impl Default for CityBasics {
    fn default() -> Self {
        Self { durable: 1_000 }
    }
}

/// One entry of the facility catalog; players are seeded with the whole list
/// at level zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilityDef {
    pub name: String,
    pub ftype: i8,
}

/// Seed values for one tile of the world map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CellSeed {
    pub cell_type: i8,
    pub name: String,
    pub level: i8,
    pub defender: i64,
    pub durable: i64,
    pub grain: i64,
    pub wood: i64,
    pub iron: i64,
    pub stone: i64,
}

/// World-map layout: dimensions plus the per-tile seed table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapLayout {
    pub width: i64,
    pub height: i64,
    pub cells: Vec<CellSeed>,
}

impl Default for MapLayout {
    fn default() -> Self {
        let cells = (0..16)
            .map(|i| CellSeed {
                cell_type: (i % 4) as i8,
                name: format!("wilds-{i}"),
                level: 1,
                defender: 10,
                durable: 100,
                grain: 50,
                wood: 50,
                iron: 30,
                stone: 30,
            })
            .collect();
        Self {
            width: 4,
            height: 4,
            cells,
        }
    }
}

/// Immutable bundle of every static table the runtime consults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default)]
    pub role: RoleDefaults,
    #[serde(default)]
    pub general: GeneralBasics,
    #[serde(default)]
    pub city: CityBasics,
    #[serde(default = "default_facilities")]
    pub facilities: Vec<FacilityDef>,
    #[serde(default)]
    pub map: MapLayout,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            role: RoleDefaults::default(),
            general: GeneralBasics::default(),
            city: CityBasics::default(),
            facilities: default_facilities(),
            map: MapLayout::default(),
        }
    }
}

fn default_facilities() -> Vec<FacilityDef> {
    [
        ("main hall", 1i8),
        ("barracks", 3),
        ("wall", 5),
        ("depot", 23),
        ("market", 16),
    ]
    .into_iter()
    .map(|(name, ftype)| FacilityDef {
        name: name.to_string(),
        ftype,
    })
    .collect()
}

impl GameConfig {
    /// Parses the whole config from one JSON document.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read(path).map_err(|err| {
            GameError::InvalidParam(format!("read config {}: {err}", path.display()))
        })?;
        serde_json::from_slice(&raw).map_err(|err| {
            GameError::InvalidParam(format!("parse config {}: {err}", path.display()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_playable() {
        let cfg = GameConfig::default();
        assert!(cfg.role.wood > 0);
        assert!(cfg.general.skill_limit > 0);
        assert!(!cfg.facilities.is_empty());
        assert_eq!(cfg.map.cells.len() as i64, cfg.map.width * cfg.map.height);
    }

    #[test]
    fn load_from_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.json");
        let cfg = GameConfig::default();
        std::fs::write(&path, serde_json::to_vec_pretty(&cfg).unwrap()).unwrap();

        let loaded = GameConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.role.gold, cfg.role.gold);
        assert_eq!(loaded.map.cells.len(), cfg.map.cells.len());

        let err = GameConfig::load_from_file(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, GameError::InvalidParam(_)));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg: GameConfig =
            serde_json::from_str(r#"{"role":{"wood":1,"iron":2,"stone":3,"grain":4,"gold":5,"decree":6}}"#)
                .unwrap();
        assert_eq!(cfg.role.wood, 1);
        assert_eq!(cfg.general.skill_limit, GeneralBasics::default().skill_limit);
        assert!(!cfg.map.cells.is_empty());
    }
}
