//! Style variant + pixel size → font handle
//!
//! Text faces are tried in order: the requested variant, its relatives
//! (bold then italic for bold-italic), regular, the caller's fallbacks and
//! finally well-known system fonts. Emoji faces come from their own chain.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;

use boxfit_core::{
    error::{BoxfitError, Result},
    traits::{FontProvider, FontRef},
    StyleVariant,
};

use crate::cache::FontCache;
use crate::source::{system_text_paths, EmojiFontChain, FontSet, FontSource};
use crate::Font;

/// Cache key for a sized handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontKey {
    pub fingerprint: u64,
    pub variant: StyleVariant,
    pub size: u32,
}

/// A face bound to the variant and pixel size it was resolved for
pub struct FontHandle {
    font: Arc<Font>,
    variant: StyleVariant,
    size: u32,
}

impl FontHandle {
    pub fn new(font: Arc<Font>, variant: StyleVariant, size: u32) -> Self {
        Self {
            font,
            variant,
            size,
        }
    }

    pub fn font(&self) -> &Arc<Font> {
        &self.font
    }

    pub fn variant(&self) -> StyleVariant {
        self.variant
    }

    pub fn size(&self) -> u32 {
        self.size
    }
}

impl std::fmt::Debug for FontHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontHandle")
            .field("font", &self.font.name())
            .field("variant", &self.variant)
            .field("size", &self.size)
            .finish()
    }
}

impl FontRef for FontHandle {
    fn data(&self) -> &[u8] {
        FontRef::data(self.font.as_ref())
    }

    fn units_per_em(&self) -> u16 {
        FontRef::units_per_em(self.font.as_ref())
    }

    fn glyph_id(&self, ch: char) -> Option<u32> {
        self.font.glyph_id(ch)
    }

    fn advance_width(&self, glyph_id: u32) -> f32 {
        self.font.advance_width(glyph_id)
    }

    fn face_index(&self) -> u32 {
        self.font.face_index()
    }

    fn ascent(&self, size: f32) -> f32 {
        self.font.ascent(size)
    }

    fn cache_id(&self) -> u64 {
        FontRef::cache_id(self.font.as_ref())
    }
}

/// Where the emoji face came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmojiTier {
    Bundled,
    Platform,
    /// The text face standing in; glyphs draw monochrome
    Default,
}

/// Result of the emoji lookup
#[derive(Debug, Clone)]
pub struct EmojiFont {
    pub font: Arc<Font>,
    pub tier: EmojiTier,
    /// True when the face carries color bitmaps or COLR layers
    pub renders_color: bool,
}

/// Resolves and caches faces for one font set
pub struct FontResolver {
    fonts: FontSet,
    emoji_chain: EmojiFontChain,
    system_defaults: Vec<FontSource>,
    cache: Arc<FontCache>,
    emoji: RwLock<Option<Arc<EmojiFont>>>,
    /// Path fingerprints by [`FontSource::path_key`], unreadable ones as `None`
    fingerprints: DashMap<u64, Option<u64>>,
}

impl FontResolver {
    pub fn new(fonts: FontSet) -> Self {
        Self {
            fonts,
            emoji_chain: EmojiFontChain::system(),
            system_defaults: system_text_paths().into_iter().map(FontSource::path).collect(),
            cache: Arc::new(FontCache::new()),
            emoji: RwLock::new(None),
            fingerprints: DashMap::new(),
        }
    }

    pub fn with_emoji_chain(mut self, chain: EmojiFontChain) -> Self {
        self.emoji_chain = chain;
        self
    }

    /// Share a cache with other resolvers
    pub fn with_cache(mut self, cache: Arc<FontCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Only ever use the caller's sources
    pub fn without_system_defaults(mut self) -> Self {
        self.system_defaults.clear();
        self
    }

    pub fn cache(&self) -> &Arc<FontCache> {
        &self.cache
    }

    pub fn font_set(&self) -> &FontSet {
        &self.fonts
    }

    /// Handle for `variant` at `size` px
    pub fn resolve(&self, variant: StyleVariant, size: u32) -> Result<Arc<FontHandle>> {
        let (fingerprint, font) = self.resolve_face(variant)?;
        let key = FontKey {
            fingerprint,
            variant,
            size,
        };
        if let Some(handle) = self.cache.get(&key) {
            return Ok(handle);
        }
        let handle = Arc::new(FontHandle::new(font, variant, size));
        Ok(self.cache.insert(key, handle))
    }

    /// First loadable face along the chain for `variant`
    pub fn resolve_face(&self, variant: StyleVariant) -> Result<(u64, Arc<Font>)> {
        let caller = self.fonts.chain(variant);
        let caller_len = caller.len();
        let mut tried = 0;

        for (hop, source) in caller
            .into_iter()
            .chain(self.system_defaults.iter())
            .enumerate()
        {
            tried += 1;
            let Some(fingerprint) = self.fingerprint(source) else {
                log::debug!("Font source {} is not readable, trying next", source.label());
                continue;
            };
            let Some((font, fresh)) = self.load_face(source, fingerprint) else {
                continue;
            };
            if fresh && hop >= caller_len {
                log::warn!(
                    "No caller font for {} loaded, using system font {}",
                    variant.as_str(),
                    source.label()
                );
            } else if fresh && hop > 0 {
                log::debug!("{} resolved via fallback {}", variant.as_str(), source.label());
            }
            return Ok((fingerprint, font));
        }

        Err(BoxfitError::FontUnavailable(format!(
            "no {} face among {} sources",
            variant.as_str(),
            tried
        )))
    }

    /// Paths are stat'ed the first time they are seen and after
    /// [`invalidate`](Self::invalidate) or [`clear`](Self::clear)
    fn fingerprint(&self, source: &FontSource) -> Option<u64> {
        let Some(key) = source.path_key() else {
            return source.fingerprint();
        };
        if let Some(known) = self.fingerprints.get(&key) {
            return *known;
        }
        *self
            .fingerprints
            .entry(key)
            .or_insert_with(|| source.fingerprint())
    }

    fn load_face(&self, source: &FontSource, fingerprint: u64) -> Option<(Arc<Font>, bool)> {
        if self.cache.has_failed(fingerprint) {
            return None;
        }
        if let Some(font) = self.cache.face(fingerprint) {
            return Some((font, false));
        }
        match source.load() {
            Ok(font) => Some((self.cache.insert_face(fingerprint, font), true)),
            Err(e) => {
                log::warn!("Skipping font {}: {}", source.label(), e);
                self.cache.mark_failed(fingerprint, source.label());
                None
            },
        }
    }

    /// Emoji face: bundled, then platform, then the monochrome default
    pub fn resolve_emoji(&self) -> Result<Arc<EmojiFont>> {
        if let Some(found) = self.emoji.read().as_ref() {
            return Ok(Arc::clone(found));
        }
        let found = Arc::new(self.find_emoji()?);
        let mut slot = self.emoji.write();
        Ok(Arc::clone(slot.get_or_insert(found)))
    }

    fn find_emoji(&self) -> Result<EmojiFont> {
        let tiers = self
            .emoji_chain
            .bundled
            .iter()
            .map(|s| (s, EmojiTier::Bundled))
            .chain(self.emoji_chain.platform.iter().map(|s| (s, EmojiTier::Platform)));

        for (source, tier) in tiers {
            let Some(fingerprint) = self.fingerprint(source) else {
                continue;
            };
            if let Some((font, _)) = self.load_face(source, fingerprint) {
                let renders_color = font.color_support().renders_color();
                log::debug!(
                    "Emoji font {} ({:?}, color: {})",
                    source.label(),
                    tier,
                    renders_color
                );
                return Ok(EmojiFont {
                    font,
                    tier,
                    renders_color,
                });
            }
        }

        let explicit = self
            .emoji_chain
            .default
            .as_ref()
            .and_then(|s| self.fingerprint(s).and_then(|fp| self.load_face(s, fp)))
            .map(|(font, _)| font);
        let font = match explicit {
            Some(font) => font,
            None => self.resolve_face(StyleVariant::Regular)?.1,
        };
        log::info!("No color emoji font found, emoji draw with {}", font.name());
        Ok(EmojiFont {
            font,
            tier: EmojiTier::Default,
            renders_color: false,
        })
    }

    /// Forget everything loaded from `source`
    pub fn invalidate(&self, source: &FontSource) {
        if let Some(key) = source.path_key() {
            self.fingerprints.remove(&key);
        }
        self.cache.invalidate(&source.label());
        *self.emoji.write() = None;
    }

    pub fn clear(&self) {
        self.fingerprints.clear();
        self.cache.clear();
        *self.emoji.write() = None;
    }
}

impl FontProvider for FontResolver {
    fn font_for(&self, variant: StyleVariant, size: u32) -> Result<Arc<dyn FontRef>> {
        let handle: Arc<dyn FontRef> = self.resolve(variant, size)?;
        Ok(handle)
    }
}

impl std::fmt::Debug for FontResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontResolver")
            .field("fonts", &self.fonts)
            .field("system_defaults", &self.system_defaults.len())
            .field("cache", &self.cache)
            .finish()
    }
}
