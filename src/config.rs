use anyhow::{Result, anyhow};
use directories::UserDirs;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Meta {
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// A press held this long or longer is no longer a tap.
    pub tap_max_ms: u64,
    /// Maximum distance between press and release for a tap.
    pub tap_slop_px: f32,
    /// Per-axis per-sample movement that latches the drag flag.
    pub drag_detect_px: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            tap_max_ms: 300,
            tap_slop_px: 10.0,
            drag_detect_px: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sensitivity {
    pub rotation: f32,
    pub pan: f32,
    pub zoom: f32,
}

impl Default for Sensitivity {
    fn default() -> Self {
        Self {
            rotation: 0.025,
            pan: 0.05,
            zoom: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub rotation_min: f32,
    pub rotation_max: f32,
    pub zoom_min: f32,
    pub zoom_max: f32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            rotation_min: -3.0,
            rotation_max: 3.0,
            zoom_min: -20.0,
            zoom_max: 40.0,
        }
    }
}

/// Tuning profile for the classifier. Every value has a built-in default,
/// so a profile file only needs to name what it overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub meta: Meta,
    pub thresholds: Thresholds,
    pub sensitivity: Sensitivity,
    pub limits: Limits,
}

fn config_dir() -> Result<PathBuf> {
    let user = UserDirs::new().ok_or_else(|| anyhow!("cannot resolve home directory"))?;
    Ok(user.home_dir().join(".config").join("scenetouch"))
}

pub fn default_profile_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("profile.toml"))
}

fn default_profile_text() -> &'static str {
    include_str!("../profiles/default.toml")
}

impl Profile {
    /// Load the user profile, installing the embedded default on first run.
    pub fn load_or_install_default() -> Result<Self> {
        let dir = config_dir()?;
        fs::create_dir_all(&dir)?;

        let path = default_profile_path()?;
        if !path.exists() {
            fs::write(&path, default_profile_text())?;
            info!("installed default profile at {}", path.display());
        }
        Self::from_path(&path)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let txt = fs::read_to_string(path)
            .map_err(|e| anyhow!("failed to read {}: {e}", path.display()))?;
        let profile: Profile =
            toml::from_str(&txt).map_err(|e| anyhow!("failed to parse {}: {e}", path.display()))?;
        validate_profile(&profile)?;
        Ok(profile)
    }
}

fn validate_profile(p: &Profile) -> Result<()> {
    let th = &p.thresholds;
    if th.tap_max_ms == 0 {
        return Err(anyhow!("thresholds.tap_max_ms must be a positive duration"));
    }
    if !(th.drag_detect_px > 0.0) {
        return Err(anyhow!("thresholds.drag_detect_px must be positive"));
    }
    if th.tap_slop_px < th.drag_detect_px {
        return Err(anyhow!(
            "thresholds.tap_slop_px must be at least drag_detect_px, got {} < {}",
            th.tap_slop_px,
            th.drag_detect_px
        ));
    }

    for (name, v) in [
        ("sensitivity.rotation", p.sensitivity.rotation),
        ("sensitivity.pan", p.sensitivity.pan),
        ("sensitivity.zoom", p.sensitivity.zoom),
    ] {
        if !(v.is_finite() && v > 0.0) {
            return Err(anyhow!("{name} must be a positive finite number, got {v}"));
        }
    }

    let lim = &p.limits;
    if lim.rotation_min >= lim.rotation_max {
        return Err(anyhow!(
            "limits.rotation_min must be below limits.rotation_max"
        ));
    }
    if lim.zoom_min >= lim.zoom_max {
        return Err(anyhow!("limits.zoom_min must be below limits.zoom_max"));
    }
    Ok(())
}
