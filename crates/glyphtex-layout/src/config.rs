use glyphtex_syntax::GapPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root size used when none is configured.
pub const DEFAULT_ROOT_SIZE: f64 = 20.0;

/// Layout parameters. Every field has a default, so a config file only
/// needs to name what it changes:
///
/// ```
/// use glyphtex_layout::LayoutConfig;
///
/// let config = LayoutConfig::from_json(r#"{ "root_size": 32 }"#).unwrap();
/// assert_eq!(config.root_size, 32.0);
/// assert_eq!(config.script.scale, 0.7);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Size of unscaled glyphs; normalized offsets are multiplied by it.
    pub root_size: f64,
    /// Vertical distance of a `\\` line break, in em of the enclosing group.
    pub line_height: f64,
    pub script: ScriptStyle,
    /// How the lexer treats characters no rule matches.
    pub gap_policy: GapPolicy,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            root_size: DEFAULT_ROOT_SIZE,
            line_height: 1.0,
            script: ScriptStyle::default(),
            gap_policy: GapPolicy::Skip,
        }
    }
}

/// Placement of superscripts and subscripts relative to their base.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptStyle {
    pub scale: f64,
    pub superscript_shift: f64,
    pub subscript_shift: f64,
    /// Extra height counted between the two branches.
    pub gap: f64,
}

impl Default for ScriptStyle {
    fn default() -> Self {
        Self {
            scale: 0.7,
            superscript_shift: 0.45,
            subscript_shift: -0.2,
            gap: 0.1,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

impl LayoutConfig {
    pub fn with_root_size(mut self, root_size: f64) -> Self {
        self.root_size = root_size;
        self
    }

    pub fn with_gap_policy(mut self, gap_policy: GapPolicy) -> Self {
        self.gap_policy = gap_policy;
        self
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Loads a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_json(&content)?;
        log::info!("Loaded layout config from {:?}", path);
        Ok(config)
    }
}
