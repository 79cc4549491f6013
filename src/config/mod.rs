// src/config/mod.rs
pub mod scoring;

pub use scoring::{ConfigError, ScoringConfiguration};

use anyhow::{anyhow, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_SCORING_CONFIG_PATH: &str = "SCORING_CONFIG_PATH";
pub const DEFAULT_TOML_PATH: &str = "config/scoring.toml";
pub const DEFAULT_JSON_PATH: &str = "config/scoring.json";

/// Load and validate a configuration file. TOML or JSON, picked by extension
/// (anything that is not `.json` is read as TOML).
pub fn load_from(path: &Path) -> Result<ScoringConfiguration, ConfigError> {
    let display = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: display.clone(),
        source,
    })?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let cfg = parse(&content, ext.as_str()).map_err(|message| ConfigError::Parse {
        path: display,
        message,
    })?;
    cfg.validate()?;
    Ok(cfg)
}

/// Load using env var + fallbacks:
/// 1) $SCORING_CONFIG_PATH
/// 2) config/scoring.toml
/// 3) config/scoring.json
/// 4) built-in defaults
pub fn load_default() -> Result<ScoringConfiguration> {
    if let Ok(p) = std::env::var(ENV_SCORING_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if !pb.exists() {
            return Err(anyhow!(
                "{ENV_SCORING_CONFIG_PATH} points to non-existent path {}",
                pb.display()
            ));
        }
        return Ok(load_from(&pb)?);
    }
    for candidate in [DEFAULT_TOML_PATH, DEFAULT_JSON_PATH] {
        let pb = PathBuf::from(candidate);
        if pb.exists() {
            return Ok(load_from(&pb)?);
        }
    }
    Ok(ScoringConfiguration::default())
}

/// Path the admin reload endpoint reads from.
pub fn resolved_path() -> Option<PathBuf> {
    if let Ok(p) = std::env::var(ENV_SCORING_CONFIG_PATH) {
        return Some(PathBuf::from(p));
    }
    [DEFAULT_TOML_PATH, DEFAULT_JSON_PATH]
        .into_iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}

fn parse(s: &str, ext: &str) -> std::result::Result<ScoringConfiguration, String> {
    if ext == "json" {
        serde_json::from_str(s).map_err(|e| e.to_string())
    } else {
        toml::from_str(s).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs};

    #[test]
    fn json_and_toml_files_parse() {
        let dir = tempfile::tempdir().unwrap();

        let p_toml = dir.path().join("scoring.toml");
        fs::write(
            &p_toml,
            r#"
recency_half_life_days = 30.0
quadrant_cutoff_percentile = 50

[source_credibility_weights]
"techcrunch.com" = 0.95
"#,
        )
        .unwrap();
        let t = load_from(&p_toml).unwrap();
        assert_eq!(t.recency_half_life_days, 30.0);
        assert_eq!(t.quadrant_cutoff_percentile, 50);
        assert_eq!(t.source_credibility_weights["techcrunch.com"], 0.95);

        let p_json = dir.path().join("scoring.json");
        fs::write(&p_json, r#"{"lookback_window_days": 90}"#).unwrap();
        let j = load_from(&p_json).unwrap();
        assert_eq!(j.lookback_window_days, 90);
    }

    #[test]
    fn invalid_values_are_rejected_at_load() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("bad.toml");
        fs::write(&p, "recency_half_life_days = -1.0").unwrap();
        assert!(matches!(
            load_from(&p),
            Err(ConfigError::NonPositiveHalfLife(_))
        ));
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_then_fallbacks() {
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();
        env::remove_var(ENV_SCORING_CONFIG_PATH);

        // nothing on disk -> defaults
        let d = load_default().unwrap();
        assert_eq!(d, ScoringConfiguration::default());

        // config/scoring.toml fallback
        fs::create_dir_all(tmp.path().join("config")).unwrap();
        fs::write(
            tmp.path().join(DEFAULT_TOML_PATH),
            "quadrant_cutoff_percentile = 70",
        )
        .unwrap();
        assert_eq!(load_default().unwrap().quadrant_cutoff_percentile, 70);

        // env wins
        let p_env = tmp.path().join("override.json");
        fs::write(&p_env, r#"{"quadrant_cutoff_percentile": 40}"#).unwrap();
        env::set_var(ENV_SCORING_CONFIG_PATH, p_env.display().to_string());
        assert_eq!(load_default().unwrap().quadrant_cutoff_percentile, 40);

        // env pointing nowhere is an error
        env::set_var(ENV_SCORING_CONFIG_PATH, tmp.path().join("missing.toml"));
        assert!(load_default().is_err());
        env::remove_var(ENV_SCORING_CONFIG_PATH);

        env::set_current_dir(&old).unwrap();
    }
}
