//! Finds `config.{ron,toml,json}`, decodes it and turns it into a validated
//! [`GameConfig`].

use crate::schema::{GameConfigData, PerkData, PolygonData, UpgradeData};
use cryptolygon_core::id::Address;
use cryptolygon_economy::config::{GameConfig, PerkTier, PolygonTier, UpgradeTier};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Base name of the configuration file.
pub const CONFIG_FILE: &str = "config";

// ===========================================================================
// Errors
// ===========================================================================

#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("no {file}.{{ron,toml,json}} in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    #[error("{file}: expected a .ron, .toml or .json file")]
    UnsupportedFormat { file: PathBuf },

    /// More than one format of the same file is present.
    #[error("both {a} and {b} exist; keep one")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    #[error("cannot parse {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// The file parsed but describes an unusable configuration.
    #[error("invalid configuration in {file}: {detail}")]
    Invalid { file: PathBuf, detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Formats
// ===========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

impl Format {
    /// Lookup order when scanning a directory.
    pub const ALL: [Format; 3] = [Format::Ron, Format::Toml, Format::Json];

    pub fn extension(self) -> &'static str {
        match self {
            Format::Ron => "ron",
            Format::Toml => "toml",
            Format::Json => "json",
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, DataLoadError> {
        let ext = path.extension().and_then(|e| e.to_str());
        Self::ALL
            .into_iter()
            .find(|format| Some(format.extension()) == ext)
            .ok_or_else(|| DataLoadError::UnsupportedFormat {
                file: path.to_path_buf(),
            })
    }

    fn parse<T: DeserializeOwned>(self, content: &str) -> Result<T, String> {
        match self {
            Format::Ron => ron::from_str(content).map_err(|e| e.to_string()),
            Format::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            Format::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        }
    }
}

// ===========================================================================
// Discovery
// ===========================================================================

/// The single `{base_name}.{ext}` file in `dir`, if there is one.
pub fn locate(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut present = Format::ALL
        .into_iter()
        .map(|format| dir.join(format!("{base_name}.{}", format.extension())))
        .filter(|path| path.exists());

    let Some(first) = present.next() else {
        return Ok(None);
    };
    match present.next() {
        Some(second) => Err(DataLoadError::ConflictingFormats {
            a: first,
            b: second,
        }),
        None => Ok(Some(first)),
    }
}

/// Read `path` and decode it in the format its extension names.
pub fn read_data<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = Format::from_path(path)?;
    let content = std::fs::read_to_string(path)?;
    format.parse(&content).map_err(|detail| DataLoadError::Parse {
        file: path.to_path_buf(),
        detail,
    })
}

// ===========================================================================
// Conversion
// ===========================================================================

impl From<PolygonData> for PolygonTier {
    fn from(data: PolygonData) -> Self {
        let (base_cost, base_rate) = match data {
            PolygonData::Short(cost, rate) => (cost, rate),
            PolygonData::Full {
                base_cost,
                base_rate,
            } => (base_cost, base_rate),
        };
        PolygonTier {
            base_cost: u128::from(base_cost),
            base_rate: u128::from(base_rate),
        }
    }
}

impl From<UpgradeData> for UpgradeTier {
    fn from(data: UpgradeData) -> Self {
        let (base_cost, effect) = match data {
            UpgradeData::Short(cost, effect) => (cost, effect),
            UpgradeData::Full { base_cost, effect } => (base_cost, effect),
        };
        UpgradeTier {
            base_cost: u128::from(base_cost),
            effect: u128::from(effect),
        }
    }
}

impl From<PerkData> for PerkTier {
    fn from(data: PerkData) -> Self {
        let (weight, effect) = match data {
            PerkData::Short(weight, effect) => (weight, effect),
            PerkData::Full { weight, effect } => (weight, effect),
        };
        PerkTier {
            weight,
            effect: u128::from(effect),
        }
    }
}

/// Convert parsed data into a [`GameConfig`] and validate it. Fields the
/// file leaves out take their defaults.
pub fn resolve_config(data: GameConfigData, file: &Path) -> Result<GameConfig, DataLoadError> {
    let invalid = |detail: String| DataLoadError::Invalid {
        file: file.to_path_buf(),
        detail,
    };
    let defaults = GameConfig::default();

    let token = match data.token.as_deref() {
        Some(hex) => hex
            .parse::<Address>()
            .map_err(|e| invalid(format!("token: {e}")))?,
        None => Address::ZERO,
    };

    let config = GameConfig {
        polygons: data.polygons.into_iter().map(PolygonTier::from).collect(),
        upgrades: data.upgrades.into_iter().map(UpgradeTier::from).collect(),
        perks: data.perks.into_iter().map(PerkTier::from).collect(),
        token,
        scale_factor: data
            .scale_factor
            .map(u128::from)
            .unwrap_or(defaults.scale_factor),
        ascension_threshold_log2: data
            .ascension_threshold_log2
            .unwrap_or(defaults.ascension_threshold_log2),
    };
    config.validate().map_err(invalid)?;
    Ok(config)
}

// ===========================================================================
// Entry points
// ===========================================================================

/// Load and validate a single configuration file.
pub fn load_config_file(path: &Path) -> Result<GameConfig, DataLoadError> {
    debug!(file = %path.display(), "loading game config");
    let data: GameConfigData = read_data(path)?;
    let config = resolve_config(data, path)?;
    info!(
        file = %path.display(),
        polygon_tiers = config.polygons.len(),
        upgrade_tiers = config.upgrades.len(),
        perk_tiers = config.perks.len(),
        "game config loaded"
    );
    Ok(config)
}

/// Load `config.{ron,toml,json}` from `dir`.
pub fn load_game_config(dir: &Path) -> Result<GameConfig, DataLoadError> {
    let path = locate(dir, CONFIG_FILE)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: CONFIG_FILE.to_string(),
        dir: dir.to_path_buf(),
    })?;
    load_config_file(&path)
}

// ===========================================================================
// Tests
// ===========================================================================
