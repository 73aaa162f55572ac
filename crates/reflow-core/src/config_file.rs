use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub layout: Option<LayoutConfig>,
    pub filter: Option<FilterConfig>,
    pub references: Option<ReferencesConfig>,
    pub backend: Option<BackendConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub gutter_ratio: Option<f32>,
    pub min_words_per_column: Option<usize>,
    pub line_tolerance: Option<f32>,
    /// Accumulated length after which a new paragraph may start.
    pub max_paragraph_chars: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    pub min_repeats: Option<usize>,
    pub page_ratio: Option<f64>,
    pub edge_lines: Option<usize>,
    pub drop_service_lines: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferencesConfig {
    pub header_regex: Option<String>,
    pub end_regex: Option<String>,
    /// Entries shorter than this count against the quality score.
    pub min_entry_chars: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Preferred backend name; others are tried when it is unavailable.
    pub prefer: Option<String>,
}

/// Platform config directory path: `<config_dir>/reflow/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("reflow").join("config.toml"))
}

/// Load config by cascading CWD `.reflow.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".reflow.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable config file");
            None
        }
    }
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let layout = |f: fn(&LayoutConfig) -> Option<f32>| {
        overlay
            .layout
            .as_ref()
            .and_then(f)
            .or_else(|| base.layout.as_ref().and_then(f))
    };
    ConfigFile {
        layout: Some(LayoutConfig {
            gutter_ratio: layout(|l| l.gutter_ratio),
            min_words_per_column: overlay
                .layout
                .as_ref()
                .and_then(|l| l.min_words_per_column)
                .or_else(|| base.layout.as_ref().and_then(|l| l.min_words_per_column)),
            line_tolerance: layout(|l| l.line_tolerance),
            max_paragraph_chars: overlay
                .layout
                .as_ref()
                .and_then(|l| l.max_paragraph_chars)
                .or_else(|| base.layout.as_ref().and_then(|l| l.max_paragraph_chars)),
        }),
        filter: Some(FilterConfig {
            min_repeats: overlay
                .filter
                .as_ref()
                .and_then(|f| f.min_repeats)
                .or_else(|| base.filter.as_ref().and_then(|f| f.min_repeats)),
            page_ratio: overlay
                .filter
                .as_ref()
                .and_then(|f| f.page_ratio)
                .or_else(|| base.filter.as_ref().and_then(|f| f.page_ratio)),
            edge_lines: overlay
                .filter
                .as_ref()
                .and_then(|f| f.edge_lines)
                .or_else(|| base.filter.as_ref().and_then(|f| f.edge_lines)),
            drop_service_lines: overlay
                .filter
                .as_ref()
                .and_then(|f| f.drop_service_lines)
                .or_else(|| base.filter.as_ref().and_then(|f| f.drop_service_lines)),
        }),
        references: Some(ReferencesConfig {
            header_regex: overlay
                .references
                .as_ref()
                .and_then(|r| r.header_regex.clone())
                .or_else(|| base.references.as_ref().and_then(|r| r.header_regex.clone())),
            end_regex: overlay
                .references
                .as_ref()
                .and_then(|r| r.end_regex.clone())
                .or_else(|| base.references.as_ref().and_then(|r| r.end_regex.clone())),
            min_entry_chars: overlay
                .references
                .as_ref()
                .and_then(|r| r.min_entry_chars)
                .or_else(|| base.references.as_ref().and_then(|r| r.min_entry_chars)),
        }),
        backend: Some(BackendConfig {
            prefer: overlay
                .backend
                .as_ref()
                .and_then(|b| b.prefer.clone())
                .or_else(|| base.backend.as_ref().and_then(|b| b.prefer.clone())),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_section_parses() {
        let toml_str = "[layout]\ngutter_ratio = 0.15\nmin_words_per_column = 8\n";
        let parsed: ConfigFile = toml::from_str(toml_str).unwrap();
        let layout = parsed.layout.unwrap();
        assert_eq!(layout.gutter_ratio, Some(0.15));
        assert_eq!(layout.min_words_per_column, Some(8));
        assert!(layout.line_tolerance.is_none());
        assert!(parsed.filter.is_none());
    }

    #[test]
    fn merge_overlay_wins() {
        let base = ConfigFile {
            filter: Some(FilterConfig {
                min_repeats: Some(4),
                page_ratio: Some(0.5),
                ..Default::default()
            }),
            ..Default::default()
        };
        let overlay = ConfigFile {
            filter: Some(FilterConfig {
                min_repeats: Some(2),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = merge(base, overlay);
        let filter = merged.filter.unwrap();
        assert_eq!(filter.min_repeats, Some(2));
        assert_eq!(filter.page_ratio, Some(0.5));
    }

    #[test]
    fn length_limits_parse_and_merge() {
        let base: ConfigFile =
            toml::from_str("[layout]\nmax_paragraph_chars = 1500\n[references]\nmin_entry_chars = 30\n")
                .unwrap();
        let overlay: ConfigFile = toml::from_str("[references]\nmin_entry_chars = 20\n").unwrap();
        let merged = merge(base, overlay);
        assert_eq!(merged.layout.unwrap().max_paragraph_chars, Some(1500));
        assert_eq!(merged.references.unwrap().min_entry_chars, Some(20));
    }

    #[test]
    fn merge_base_preserved_when_overlay_absent() {
        let base = ConfigFile {
            backend: Some(BackendConfig {
                prefer: Some("mupdf".to_string()),
            }),
            ..Default::default()
        };
        let merged = merge(base, ConfigFile::default());
        assert_eq!(merged.backend.unwrap().prefer.as_deref(), Some("mupdf"));
    }

    #[test]
    fn load_from_missing_path_is_none() {
        assert!(load_from_path(Path::new("/nonexistent/reflow.toml")).is_none());
    }

    #[test]
    fn load_from_path_reads_file() {
        let dir = std::env::temp_dir().join(format!("reflow-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "[references]\nheader_regex = \"^ЛИТ\"\n").unwrap();
        let parsed = load_from_path(&path).unwrap();
        assert_eq!(
            parsed.references.unwrap().header_regex.as_deref(),
            Some("^ЛИТ")
        );
        std::fs::remove_dir_all(&dir).ok();
    }
}
