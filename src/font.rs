//! Font descriptors and face resolution.
//!
//! A [`FontDescriptor`] is the composite `"{weight} {size}px {family}"`
//! string a canvas accepts, in typed form. [`FontBook`] turns one into a
//! drawable [`Face`]: a registered outline font, a system font (with the
//! `system-fonts` feature), or the built-in 8x8 bitmap face.

use crate::error::{Error, Result};
use ab_glyph::{Font, FontArc, GlyphId, PxScale, ScaleFont};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_WEIGHT: u16 = 400;

/* ---------- Descriptor ---------- */

/// Weight, pixel size and family list of a text run.
#[derive(Clone, Debug, PartialEq)]
pub struct FontDescriptor {
    pub weight: u16,
    pub size_px: f32,
    /// CSS family list, e.g. `Arial, "Open Sans", sans-serif`.
    pub family: String,
}

impl FontDescriptor {
    pub fn new(weight: u16, size_px: f32, family: impl Into<String>) -> Self {
        Self { weight, size_px, family: family.into() }
    }

    /// Individual family names in fallback order, quotes stripped.
    pub fn families(&self) -> Vec<&str> {
        self.family
            .split(',')
            .map(|f| f.trim().trim_matches(|c| c == '"' || c == '\''))
            .filter(|f| !f.is_empty())
            .collect()
    }
}

impl fmt::Display for FontDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}px {}", self.weight, self.size_px, self.family)
    }
}

impl FromStr for FontDescriptor {
    type Err = Error;

    /// Accepts `"700 48px Impact"`, `"bold 48px Impact"` or `"48px Impact"`.
    fn from_str(s: &str) -> Result<Self> {
        let bad = || Error::Font(format!("invalid font descriptor '{s}'"));

        let (first, rest) = split_token(s.trim()).ok_or_else(bad)?;
        let (weight, size_tok, family) = if first.ends_with("px") {
            (DEFAULT_WEIGHT, first, rest)
        } else {
            let weight = parse_weight(first).ok_or_else(bad)?;
            let (size_tok, family) = split_token(rest).ok_or_else(bad)?;
            (weight, size_tok, family)
        };

        let size_px: f32 = size_tok
            .strip_suffix("px")
            .and_then(|n| n.parse().ok())
            .filter(|n: &f32| n.is_finite() && *n > 0.0)
            .ok_or_else(bad)?;

        let family = family.trim();
        if family.is_empty() {
            return Err(bad());
        }
        Ok(Self { weight, size_px, family: family.to_string() })
    }
}

fn split_token(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    match s.find(char::is_whitespace) {
        Some(i) => Some((&s[..i], &s[i..])),
        None => Some((s, "")),
    }
}

fn parse_weight(tok: &str) -> Option<u16> {
    match tok {
        "normal" => Some(400),
        "bold" => Some(700),
        _ => tok.parse().ok().filter(|w| (1..=1000).contains(w)),
    }
}

/* ---------- Face ---------- */

/// Something text can be measured and drawn with.
#[derive(Clone, Debug)]
pub enum Face {
    Outline(FontArc),
    /// `font8x8` glyphs scaled to the em size; every glyph is 1em wide.
    Bitmap,
}

impl Face {
    /// Advance width of `text` at `size_px`, kerning included.
    pub fn measure(&self, size_px: f32, text: &str) -> f32 {
        match self {
            Face::Outline(font) => {
                let scaled = font.as_scaled(em_scale(font, size_px));
                let mut width = 0.0;
                let mut prev: Option<GlyphId> = None;
                for ch in text.chars() {
                    let id = scaled.glyph_id(ch);
                    if let Some(p) = prev {
                        width += scaled.kern(p, id);
                    }
                    width += scaled.h_advance(id);
                    prev = Some(id);
                }
                width
            }
            Face::Bitmap => text.chars().count() as f32 * size_px,
        }
    }

    pub fn is_bitmap(&self) -> bool {
        matches!(self, Face::Bitmap)
    }
}

/// ab_glyph scales by ascent-to-descent height; canvas sizes are em sizes.
pub(crate) fn em_scale<F: Font>(font: &F, size_px: f32) -> PxScale {
    let upem = font.units_per_em().unwrap_or(1000.0);
    PxScale::from(size_px * font.height_unscaled() / upem)
}

/* ---------- FontBook ---------- */

/// Registry of outline faces keyed by lowercase family name.
///
/// Lookups are cached per (family list, weight); registering a face
/// drops the cache.
#[derive(Default)]
pub struct FontBook {
    registered: HashMap<String, Vec<(u16, FontArc)>>,
    cache: RefCell<HashMap<(String, u16), Face>>,
    use_system: bool,
}

impl FontBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also consult installed system fonts. Only has an effect when the
    /// crate is built with `system-fonts`.
    pub fn with_system_fonts(mut self, enabled: bool) -> Self {
        if enabled && !cfg!(feature = "system-fonts") {
            tracing::warn!("system font lookup requested but the system-fonts feature is off");
        }
        self.use_system = enabled;
        self
    }

    pub fn register_bytes(&mut self, family: &str, weight: u16, bytes: Vec<u8>) -> Result<()> {
        let font = FontArc::try_from_vec(bytes)
            .map_err(|e| Error::Font(format!("{family} {weight}: {e}")))?;
        self.registered
            .entry(family.to_lowercase())
            .or_default()
            .push((weight, font));
        self.cache.borrow_mut().clear();
        Ok(())
    }

    pub fn register_file(&mut self, family: &str, weight: u16, path: &Path) -> Result<()> {
        let bytes = std::fs::read(path)?;
        self.register_bytes(family, weight, bytes)?;
        tracing::debug!("registered font {family} {weight} from {}", path.display());
        Ok(())
    }

    pub fn family_count(&self) -> usize {
        self.registered.len()
    }

    /// First family in the list that resolves, else the bitmap face.
    pub fn resolve(&self, font: &FontDescriptor) -> Face {
        let key = (font.family.clone(), font.weight);
        if let Some(face) = self.cache.borrow().get(&key) {
            return face.clone();
        }

        let face = font
            .families()
            .into_iter()
            .find_map(|family| self.lookup(family, font.weight))
            .map(Face::Outline)
            .unwrap_or(Face::Bitmap);
        if face.is_bitmap() {
            tracing::debug!("no outline face for '{}', using bitmap face", font.family);
        }

        self.cache.borrow_mut().insert(key, face.clone());
        face
    }

    fn lookup(&self, family: &str, weight: u16) -> Option<FontArc> {
        if let Some(faces) = self.registered.get(&family.to_lowercase()) {
            return faces
                .iter()
                .min_by_key(|(w, _)| w.abs_diff(weight))
                .map(|(_, font)| font.clone());
        }
        if self.use_system {
            return system_lookup(family, weight);
        }
        None
    }
}

#[cfg(feature = "system-fonts")]
fn system_lookup(family: &str, weight: u16) -> Option<FontArc> {
    use ab_glyph::FontVec;
    use font_kit::family_name::FamilyName;
    use font_kit::handle::Handle;
    use font_kit::properties::{Properties, Weight};
    use font_kit::source::SystemSource;

    let name = match family.to_ascii_lowercase().as_str() {
        "serif" => FamilyName::Serif,
        "sans-serif" => FamilyName::SansSerif,
        "monospace" => FamilyName::Monospace,
        "cursive" => FamilyName::Cursive,
        "fantasy" => FamilyName::Fantasy,
        _ => FamilyName::Title(family.to_string()),
    };
    let mut props = Properties::new();
    props.weight(Weight(weight as f32));

    let handle = SystemSource::new().select_best_match(&[name], &props).ok()?;
    let (bytes, index) = match handle {
        Handle::Path { path, font_index } => (std::fs::read(path).ok()?, font_index),
        Handle::Memory { bytes, font_index } => ((*bytes).clone(), font_index),
    };
    match FontVec::try_from_vec_and_index(bytes, index) {
        Ok(font) => Some(FontArc::from(font)),
        Err(e) => {
            tracing::warn!("system font '{family}' could not be parsed: {e}");
            None
        }
    }
}

#[cfg(not(feature = "system-fonts"))]
fn system_lookup(_family: &str, _weight: u16) -> Option<FontArc> {
    None
}
