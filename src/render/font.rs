use ab_glyph::{Font, FontVec, PxScale};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Directories searched when the configured font is a bare file name.
const SYSTEM_FONT_DIRS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu",
    "/usr/share/fonts/TTF",
    "/usr/share/fonts/dejavu",
    "/usr/share/fonts/dejavu-sans-fonts",
    "/usr/local/share/fonts",
    "/Library/Fonts",
];

/// TrueType font used for box labels, at a fixed em size in pixels.
pub struct LabelFont {
    font: FontVec,
    size: f32,
}

impl std::fmt::Debug for LabelFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabelFont").field("size", &self.size).finish()
    }
}

impl LabelFont {
    pub fn from_bytes(data: Vec<u8>, size: f32) -> Result<Self, String> {
        let font = FontVec::try_from_vec(data).map_err(|e| format!("Invalid font data: {e}"))?;
        Ok(LabelFont { font, size })
    }

    /// Loads the first candidate that reads and parses. Failures are logged and skipped.
    pub fn load(candidates: &[PathBuf], size: f32) -> Option<Self> {
        for path in candidates {
            let data = match std::fs::read(path) {
                Ok(data) => data,
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "Font candidate not readable.");
                    continue;
                }
            };
            match Self::from_bytes(data, size) {
                Ok(font) => {
                    debug!(path = %path.display(), size, "Loaded label font.");
                    return Some(font);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unparsable font file.");
                }
            }
        }
        None
    }

    /// The configured path first, then the system font directories if it is a bare file name.
    pub fn candidate_paths(configured: &str) -> Vec<PathBuf> {
        let configured_path = Path::new(configured);
        let mut candidates = vec![configured_path.to_path_buf()];

        let is_bare_name = configured_path.parent().is_none_or(|p| p.as_os_str().is_empty());
        if is_bare_name {
            candidates.extend(SYSTEM_FONT_DIRS.iter().map(|dir| Path::new(dir).join(configured_path)));
        }
        candidates
    }

    pub fn font(&self) -> &FontVec {
        &self.font
    }

    /// ab_glyph scales by line height; this converts the em size so that
    /// `size` pixels is one em, matching TrueType sizing at 72 dpi.
    pub fn scale(&self) -> PxScale {
        match self.font.units_per_em() {
            Some(units_per_em) if units_per_em > 0.0 => {
                PxScale::from(self.size * self.font.height_unscaled() / units_per_em)
            }
            _ => PxScale::from(self.size),
        }
    }
}
