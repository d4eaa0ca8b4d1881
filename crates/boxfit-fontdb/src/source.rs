//! Font sources and the sets callers assemble from them
//!
//! A [`FontSource`] is either a file path or bytes already fetched by the
//! caller. Every source has a fingerprint: bytes hash their content once at
//! construction, paths combine the path with the file's length and
//! modification time. The fingerprint is part of every cache key; a
//! resolver stats each path once and again only after it is invalidated.

use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use boxfit_core::error::{FontLoadError, Result};
use boxfit_core::StyleVariant;

use crate::Font;

/// Largest font file we agree to read (50MB)
pub const MAX_FONT_SIZE: u64 = 50 * 1024 * 1024;

/// Where a face comes from
#[derive(Clone)]
pub enum FontSource {
    Path {
        path: PathBuf,
        face_index: u32,
    },
    Bytes {
        name: String,
        data: Arc<[u8]>,
        face_index: u32,
        fingerprint: u64,
    },
}

impl FontSource {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        FontSource::Path {
            path: path.into(),
            face_index: 0,
        }
    }

    pub fn bytes(name: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        let data: Arc<[u8]> = data.into();
        let mut hasher = DefaultHasher::new();
        data.hash(&mut hasher);
        FontSource::Bytes {
            name: name.into(),
            fingerprint: hasher.finish(),
            data,
            face_index: 0,
        }
    }

    /// Pick a face inside a collection (.ttc/.otc)
    pub fn with_face_index(mut self, index: u32) -> Self {
        match &mut self {
            FontSource::Path { face_index, .. } | FontSource::Bytes { face_index, .. } => {
                *face_index = index
            },
        }
        self
    }

    pub fn label(&self) -> String {
        match self {
            FontSource::Path { path, .. } => path.display().to_string(),
            FontSource::Bytes { name, .. } => name.clone(),
        }
    }

    pub fn face_index(&self) -> u32 {
        match self {
            FontSource::Path { face_index, .. } | FontSource::Bytes { face_index, .. } => {
                *face_index
            },
        }
    }

    /// Stable key for a path source that does not touch the file system
    pub(crate) fn path_key(&self) -> Option<u64> {
        match self {
            FontSource::Path { path, face_index } => {
                let mut hasher = DefaultHasher::new();
                path.hash(&mut hasher);
                face_index.hash(&mut hasher);
                Some(hasher.finish())
            },
            FontSource::Bytes { .. } => None,
        }
    }

    /// Identity of the current content; `None` when a path is unreadable
    pub fn fingerprint(&self) -> Option<u64> {
        match self {
            FontSource::Bytes {
                fingerprint,
                face_index,
                ..
            } => Some(fingerprint ^ *face_index as u64),
            FontSource::Path { path, face_index } => {
                let meta = fs::metadata(path).ok()?;
                if !meta.is_file() {
                    return None;
                }
                let mut hasher = DefaultHasher::new();
                path.hash(&mut hasher);
                face_index.hash(&mut hasher);
                meta.len().hash(&mut hasher);
                meta.modified()
                    .ok()
                    .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                    .map(|d| d.as_nanos())
                    .hash(&mut hasher);
                Some(hasher.finish())
            },
        }
    }

    /// Read and validate the face
    pub fn load(&self) -> Result<Font> {
        let fingerprint = self
            .fingerprint()
            .ok_or_else(|| FontLoadError::FileNotFound(self.label()))?;
        match self {
            FontSource::Bytes {
                name,
                data,
                face_index,
                ..
            } => Font::from_parts(Arc::clone(data), *face_index, fingerprint, name.clone()),
            FontSource::Path { path, face_index } => {
                let data = read_font_file(path)?;
                Font::from_parts(data.into(), *face_index, fingerprint, self.label())
            },
        }
    }
}

fn read_font_file(path: &Path) -> Result<Vec<u8>> {
    let meta = fs::metadata(path)
        .map_err(|_| FontLoadError::FileNotFound(path.display().to_string()))?;
    if meta.len() > MAX_FONT_SIZE {
        return Err(FontLoadError::NotSupported(format!(
            "{} is {} bytes (max {})",
            path.display(),
            meta.len(),
            MAX_FONT_SIZE
        ))
        .into());
    }
    Ok(fs::read(path).map_err(|_| FontLoadError::FileNotFound(path.display().to_string()))?)
}

impl std::fmt::Debug for FontSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FontSource::Path { path, face_index } => f
                .debug_struct("Path")
                .field("path", path)
                .field("face_index", face_index)
                .finish(),
            FontSource::Bytes {
                name,
                data,
                face_index,
                ..
            } => f
                .debug_struct("Bytes")
                .field("name", name)
                .field("len", &data.len())
                .field("face_index", face_index)
                .finish(),
        }
    }
}

impl From<PathBuf> for FontSource {
    fn from(path: PathBuf) -> Self {
        FontSource::path(path)
    }
}

impl From<&Path> for FontSource {
    fn from(path: &Path) -> Self {
        FontSource::path(path)
    }
}

/// Text faces for each style variant
#[derive(Debug, Clone, Default)]
pub struct FontSet {
    pub regular: Option<FontSource>,
    pub bold: Option<FontSource>,
    pub italic: Option<FontSource>,
    pub bold_italic: Option<FontSource>,
    /// Tried after the variant and regular slots, before system defaults
    pub fallbacks: Vec<FontSource>,
}

impl FontSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_regular(mut self, source: impl Into<FontSource>) -> Self {
        self.regular = Some(source.into());
        self
    }

    pub fn with_bold(mut self, source: impl Into<FontSource>) -> Self {
        self.bold = Some(source.into());
        self
    }

    pub fn with_italic(mut self, source: impl Into<FontSource>) -> Self {
        self.italic = Some(source.into());
        self
    }

    pub fn with_bold_italic(mut self, source: impl Into<FontSource>) -> Self {
        self.bold_italic = Some(source.into());
        self
    }

    pub fn with_fallback(mut self, source: impl Into<FontSource>) -> Self {
        self.fallbacks.push(source.into());
        self
    }

    pub fn slot(&self, variant: StyleVariant) -> Option<&FontSource> {
        match variant {
            StyleVariant::Regular => self.regular.as_ref(),
            StyleVariant::Bold => self.bold.as_ref(),
            StyleVariant::Italic => self.italic.as_ref(),
            StyleVariant::BoldItalic => self.bold_italic.as_ref(),
        }
    }

    /// Caller-supplied sources in the order they are tried for `variant`
    pub fn chain(&self, variant: StyleVariant) -> Vec<&FontSource> {
        let slots: &[StyleVariant] = match variant {
            StyleVariant::Regular => &[StyleVariant::Regular],
            StyleVariant::Bold => &[StyleVariant::Bold, StyleVariant::Regular],
            StyleVariant::Italic => &[StyleVariant::Italic, StyleVariant::Regular],
            StyleVariant::BoldItalic => &[
                StyleVariant::BoldItalic,
                StyleVariant::Bold,
                StyleVariant::Italic,
                StyleVariant::Regular,
            ],
        };
        slots
            .iter()
            .filter_map(|v| self.slot(*v))
            .chain(self.fallbacks.iter())
            .collect()
    }
}

/// Emoji faces in priority order: bundled, then platform, then the
/// regular text face as a monochrome last resort
#[derive(Debug, Clone)]
pub struct EmojiFontChain {
    /// Faces shipped with or downloaded by the caller
    pub bundled: Vec<FontSource>,
    /// Faces installed with the operating system
    pub platform: Vec<FontSource>,
    /// Monochrome last resort; the resolver's regular text face when unset
    pub default: Option<FontSource>,
}

impl EmojiFontChain {
    /// Platform paths only
    pub fn system() -> Self {
        Self {
            bundled: Vec::new(),
            platform: platform_emoji_paths().into_iter().map(FontSource::path).collect(),
            default: None,
        }
    }

    /// No emoji faces at all; emoji fall back to the text face
    pub fn none() -> Self {
        Self {
            bundled: Vec::new(),
            platform: Vec::new(),
            default: None,
        }
    }

    pub fn with_bundled(mut self, source: impl Into<FontSource>) -> Self {
        self.bundled.push(source.into());
        self
    }

    pub fn with_default(mut self, source: impl Into<FontSource>) -> Self {
        self.default = Some(source.into());
        self
    }
}

impl Default for EmojiFontChain {
    fn default() -> Self {
        Self::system()
    }
}

/// Well-known locations of a plain sans face on common systems
pub fn system_text_paths() -> Vec<PathBuf> {
    [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
        "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
        "/System/Library/Fonts/Helvetica.ttc",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "/Library/Fonts/Arial.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
        "C:\\Windows\\Fonts\\segoeui.ttf",
    ]
    .iter()
    .map(PathBuf::from)
    .collect()
}

/// Well-known locations of color emoji faces
pub fn platform_emoji_paths() -> Vec<PathBuf> {
    [
        "/System/Library/Fonts/Apple Color Emoji.ttc",
        "/usr/share/fonts/truetype/noto/NotoColorEmoji.ttf",
        "/usr/share/fonts/noto/NotoColorEmoji.ttf",
        "/usr/share/fonts/google-noto-emoji/NotoColorEmoji.ttf",
        "/usr/share/fonts/noto-emoji/NotoColorEmoji.ttf",
        "/usr/share/fonts/TTF/NotoColorEmoji.ttf",
        "C:\\Windows\\Fonts\\seguiemj.ttf",
    ]
    .iter()
    .map(PathBuf::from)
    .collect()
}
