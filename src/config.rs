use crate::error::{Error, Result};
use crate::export::DEFAULT_EXPORT_FILE;
use crate::font::FontBook;
use crate::layer::TextLayer;
use crate::surface::DEFAULT_MAX_SURFACE_DIMENSION;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// An outline font file to register under a family name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontFile {
    pub family: String,
    #[serde(default = "default_weight")]
    pub weight: u16,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveBgSettings {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Takes precedence over `api_key_env` when set.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RemoveBgSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: None,
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl RemoveBgSettings {
    pub fn resolve_api_key(&self) -> Option<String> {
        let non_empty = |k: &String| !k.trim().is_empty();
        self.api_key
            .clone()
            .filter(non_empty)
            .or_else(|| std::env::var(&self.api_key_env).ok().filter(non_empty))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// When enabled logging starts at debug level.
    #[serde(default)]
    pub debug_logging: bool,
    #[serde(default = "default_max_surface_dimension")]
    pub max_surface_dimension: u32,
    #[serde(default = "default_export_path")]
    pub export_path: PathBuf,
    /// Starting parameters of the text layer.
    #[serde(default)]
    pub text: TextLayer,
    /// Families cycled through in the preview window.
    #[serde(default = "default_font_families")]
    pub font_families: Vec<String>,
    #[serde(default = "default_palette")]
    pub palette: Vec<String>,
    #[serde(default)]
    pub font_files: Vec<FontFile>,
    /// Look up families not in `font_files` among installed fonts.
    #[serde(default)]
    pub system_fonts: bool,
    #[serde(default)]
    pub remove_bg: RemoveBgSettings,
}

fn default_weight() -> u16 {
    400
}

fn default_endpoint() -> String {
    "https://api.remove.bg/v1.0/removebg".into()
}

fn default_api_key_env() -> String {
    "REMOVE_BG_API_KEY".into()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_surface_dimension() -> u32 {
    DEFAULT_MAX_SURFACE_DIMENSION
}

fn default_export_path() -> PathBuf {
    PathBuf::from(DEFAULT_EXPORT_FILE)
}

fn default_font_families() -> Vec<String> {
    [
        "Arial",
        "Times New Roman",
        "Helvetica",
        "Georgia",
        "Verdana",
        "Roboto",
        "Open Sans",
        "Montserrat",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_palette() -> Vec<String> {
    ["#000000", "#ffffff", "#ff3b30", "#ffcc00", "#34c759", "#0a84ff", "#af52de"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug_logging: false,
            max_surface_dimension: default_max_surface_dimension(),
            export_path: default_export_path(),
            text: TextLayer::default(),
            font_families: default_font_families(),
            palette: default_palette(),
            font_files: Vec::new(),
            system_fonts: false,
            remove_bg: RemoveBgSettings::default(),
        }
    }
}

impl Settings {
    /// A missing or empty file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut settings: Self = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        settings.text = settings.text.normalized();
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Register every configured font file; unreadable ones are skipped.
    pub fn font_book(&self) -> FontBook {
        let mut book = FontBook::new().with_system_fonts(self.system_fonts);
        for file in &self.font_files {
            if let Err(e) = book.register_file(&file.family, file.weight, &file.path) {
                tracing::warn!("skipping font {} ({}): {e}", file.family, file.path.display());
            }
        }
        book
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let s = Settings::load(&dir.path().join("settings.json")).unwrap();
        assert_eq!(s.export_path, PathBuf::from("text-behind-image.png"));
        assert_eq!(s.font_families.len(), 8);
        assert_eq!(s.text, TextLayer::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r##"{ "debug_logging": true, "text": { "content": "HELLO", "font_weight": 750 } }"##,
        )
        .unwrap();

        let s = Settings::load(&path).unwrap();
        assert!(s.debug_logging);
        assert_eq!(s.text.content, "HELLO");
        assert_eq!(s.text.font_weight, 800);
        assert_eq!(s.text.font_family, "Arial");
        assert_eq!(s.remove_bg.api_key_env, "REMOVE_BG_API_KEY");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut s = Settings::default();
        s.palette = vec!["#123456".into()];
        s.font_files.push(FontFile { family: "Display".into(), weight: 700, path: "d.ttf".into() });
        s.save(&path).unwrap();

        let back = Settings::load(&path).unwrap();
        assert_eq!(back.palette, vec!["#123456".to_string()]);
        assert_eq!(back.font_files, s.font_files);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Settings::load(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_api_key_resolution() {
        let explicit =
            RemoveBgSettings { api_key: Some("abc".into()), ..RemoveBgSettings::default() };
        assert_eq!(explicit.resolve_api_key().as_deref(), Some("abc"));

        let unset = RemoveBgSettings {
            api_key: Some("   ".into()),
            api_key_env: "TEXT_BEHIND_TEST_UNSET_KEY_VAR".into(),
            ..RemoveBgSettings::default()
        };
        assert_eq!(unset.resolve_api_key(), None);
    }

    #[test]
    fn test_unreadable_font_files_are_skipped() {
        let mut s = Settings::default();
        s.font_files.push(FontFile {
            family: "Gone".into(),
            weight: 400,
            path: "/no/such/font.ttf".into(),
        });
        assert_eq!(s.font_book().family_count(), 0);
    }
}
