use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::overlay::{BoxStyle, OverlayStyle, PageSize};

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");
pub const API_BASE_ENV: &str = "OCR_EVIDENCE_API_BASE";

/// `Default` holds the same values as the embedded `settings.toml`.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_base: String,
    pub timeout_secs: u64,
    pub default_page: PageSize,
    pub display_width: Option<u32>,
    pub overlay: OverlayStyle,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: "http://127.0.0.1:8000".to_string(),
            timeout_secs: 120,
            default_page: PageSize::DEFAULT,
            display_width: Some(600),
            overlay: OverlayStyle::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    service: Option<ServiceSettings>,
    page: Option<PageSettings>,
    display: Option<DisplaySettings>,
    overlay: Option<OverlaySettings>,
}

#[derive(Debug, Default, Deserialize)]
struct ServiceSettings {
    api_base: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct PageSettings {
    default_width: Option<f64>,
    default_height: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct DisplaySettings {
    width: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct OverlaySettings {
    line_color: Option<String>,
    line_opacity: Option<f32>,
    line_width: Option<f32>,
    evidence_color: Option<String>,
    evidence_opacity: Option<f32>,
    evidence_width: Option<f32>,
}

/// Loads built-in defaults, then `settings.toml` / `settings.local.toml` from
/// the working directory and from `~/.ocr-evidence-viewer`, then `extra_path`.
pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    load_settings_with_home(extra_path, home_dir().as_deref())
}

pub fn load_settings_with_home(extra_path: Option<&Path>, home: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    settings.merge(parse_settings(DEFAULT_SETTINGS_TOML, Path::new("<built-in>"))?);
    if let Some(home) = home {
        ensure_home_settings_file(home)?;
    }

    let mut ordered_paths = Vec::new();
    ordered_paths.push(PathBuf::from("settings.toml"));
    ordered_paths.push(PathBuf::from("settings.local.toml"));

    if let Some(home) = home {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            settings.merge(parse_settings(&content, &path)?);
        }
    }

    if let Ok(base) = std::env::var(API_BASE_ENV) {
        if !base.trim().is_empty() {
            settings.api_base = base.trim().to_string();
        }
    }

    Ok(settings)
}

fn parse_settings(content: &str, path: &Path) -> Result<SettingsFile> {
    toml::from_str(content).with_context(|| format!("failed to parse settings: {}", path.display()))
}

impl Settings {
    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(service) = incoming.service {
            if let Some(base) = service.api_base {
                if !base.trim().is_empty() {
                    self.api_base = base.trim().to_string();
                }
            }
            if let Some(secs) = service.timeout_secs {
                if secs > 0 {
                    self.timeout_secs = secs;
                }
            }
        }
        if let Some(page) = incoming.page {
            self.default_page =
                PageSize::from_reported(page.default_width, page.default_height, self.default_page);
        }
        if let Some(display) = incoming.display {
            if let Some(width) = display.width {
                self.display_width = (width > 0).then_some(width);
            }
        }
        if let Some(overlay) = incoming.overlay {
            merge_style(
                &mut self.overlay.base,
                overlay.line_color,
                overlay.line_opacity,
                overlay.line_width,
            );
            merge_style(
                &mut self.overlay.highlight,
                overlay.evidence_color,
                overlay.evidence_opacity,
                overlay.evidence_width,
            );
        }
    }
}

fn merge_style(
    style: &mut BoxStyle,
    color: Option<String>,
    opacity: Option<f32>,
    width: Option<f32>,
) {
    if let Some(color) = color {
        if !color.trim().is_empty() {
            style.color = color.trim().to_string();
        }
    }
    if let Some(opacity) = opacity {
        if (0.0..=1.0).contains(&opacity) {
            style.opacity = opacity;
        }
    }
    if let Some(width) = width {
        if width > 0.0 {
            style.stroke_width = width;
        }
    }
}

fn ensure_home_settings_file(home: &Path) -> Result<()> {
    fs::create_dir_all(home)
        .with_context(|| format!("failed to create settings directory: {}", home.display()))?;
    let path = home.join("settings.toml");
    if !path.exists() {
        fs::write(&path, DEFAULT_SETTINGS_TOML)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
    }
    Ok(())
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(".ocr-evidence-viewer"))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_defaults_are_applied() {
        let home = tempfile::tempdir().unwrap();
        let settings = load_settings_with_home(None, Some(home.path())).unwrap();
        assert_eq!(settings.default_page, PageSize::DEFAULT);
        assert_eq!(settings.overlay, OverlayStyle::default());
        assert!(home.path().join("settings.toml").exists());
    }

    #[test]
    fn default_matches_embedded_settings_file() {
        let mut settings = Settings::default();
        settings.merge(parse_settings(DEFAULT_SETTINGS_TOML, Path::new("<built-in>")).unwrap());
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn zero_display_width_means_natural_size() {
        let mut settings = Settings::default();
        settings.merge(toml::from_str("[display]\nwidth = 0\n").unwrap());
        assert_eq!(settings.display_width, None);
    }

    #[test]
    fn extra_file_overrides_home_file() {
        let home = tempfile::tempdir().unwrap();
        fs::write(
            home.path().join("settings.toml"),
            "[display]\nwidth = 900\n[overlay]\nevidence_color = \"#00c853\"\n",
        )
        .unwrap();
        let extra = home.path().join("extra.toml");
        fs::write(
            &extra,
            "[display]\nwidth = 400\n[page]\ndefault_width = 1240\ndefault_height = -1\n",
        )
        .unwrap();

        let settings = load_settings_with_home(Some(&extra), Some(home.path())).unwrap();
        assert_eq!(settings.display_width, Some(400));
        assert_eq!(settings.overlay.highlight.color, "#00c853");
        assert_eq!(settings.overlay.highlight.stroke_width, 2.0);
        assert_eq!(settings.default_page.width, 1240.0);
        assert_eq!(settings.default_page.height, 1000.0);
    }

    #[test]
    fn missing_extra_file_is_an_error() {
        let home = tempfile::tempdir().unwrap();
        let missing = home.path().join("nope.toml");
        let err = load_settings_with_home(Some(&missing), Some(home.path())).unwrap_err();
        assert!(err.to_string().contains("settings file not found"));
    }

    #[test]
    fn out_of_range_style_values_are_ignored() {
        let mut settings = Settings::default();
        settings.merge(
            toml::from_str("[overlay]\nline_opacity = 3.0\nline_width = 0.0\nline_color = \" \"\n")
                .unwrap(),
        );
        assert_eq!(settings.overlay.base, OverlayStyle::default().base);
    }
}
