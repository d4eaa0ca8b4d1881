//! The overlay context: fonts, caches and backends shared by many jobs

use std::sync::{Arc, OnceLock};

use image::RgbaImage;
use rayon::prelude::*;

use boxfit_core::{
    error::Result,
    traits::{FontProvider, GlyphSynthesizer, TextShaper},
    FitConfig, StyledRun,
};
use boxfit_fontdb::{EmojiFontChain, FontCache, FontResolver, FontSet};
use boxfit_layout::{fit, suggest_font_size, FitResult, Measurer};
use boxfit_markup::{detected_emoji, detected_hashtags, prepare, ScanOptions};
use boxfit_render_emoji::EmojiSynthesizer;
use boxfit_shape_hr::HarfrustShaper;

use crate::compose::Compositor;
use crate::report::OverlayReport;
use crate::request::OverlayRequest;

/// Long-lived rendering context
///
/// Build one per font set and reuse it: resolved faces, shaped widths and
/// synthesized emoji all stay cached between calls. `Overlay` is `Sync`,
/// so one instance can serve a whole batch on worker threads.
///
/// ```ignore
/// let overlay = Overlay::builder()
///     .fonts(FontSet::new().with_regular(Path::new("fonts/Inter-Regular.ttf")))
///     .build()?;
/// let report = overlay.render(&mut image, &OverlayRequest::new("Hi 👋"))?;
/// println!("{}", report.processing_info());
/// ```
pub struct Overlay {
    resolver: Arc<FontResolver>,
    measurer: Measurer,
    shaper: Arc<dyn TextShaper>,
    config: FitConfig,
    /// Resolved on the first job that has emoji in it
    synthesizer: OnceLock<Option<Arc<dyn GlyphSynthesizer>>>,
}

impl Overlay {
    pub fn builder() -> OverlayBuilder {
        OverlayBuilder::new()
    }

    /// Context for `fonts` with every other setting at its default
    pub fn new(fonts: FontSet) -> Result<Self> {
        Self::builder().fonts(fonts).build()
    }

    pub fn config(&self) -> &FitConfig {
        &self.config
    }

    pub fn resolver(&self) -> &Arc<FontResolver> {
        &self.resolver
    }

    pub fn measurer(&self) -> &Measurer {
        &self.measurer
    }

    /// The emoji source, resolving the emoji face on first use
    pub fn synthesizer(&self) -> Option<Arc<dyn GlyphSynthesizer>> {
        self.synthesizer
            .get_or_init(|| match self.resolver.resolve_emoji() {
                Ok(emoji) => {
                    let synth: Arc<dyn GlyphSynthesizer> = Arc::new(EmojiSynthesizer::new(
                        &emoji,
                        Arc::clone(&self.shaper),
                        &self.config,
                    ));
                    Some(synth)
                },
                Err(e) => {
                    log::warn!("Emoji will be drawn as text: {}", e);
                    None
                },
            })
            .clone()
    }

    /// Styled runs for a request, after parsing and scanning
    pub fn runs(&self, request: &OverlayRequest) -> Vec<StyledRun> {
        prepare(
            &request.text,
            request.markup,
            ScanOptions::from(request.capabilities),
        )
    }

    /// Fit without drawing
    pub fn layout(&self, request: &OverlayRequest) -> Result<FitResult> {
        let runs = self.runs(request);
        fit(
            &runs,
            &self.measurer,
            request.fit_params(),
            &self.config,
            request.capabilities,
        )
    }

    /// Largest common size at which the text fits the box unwrapped
    pub fn suggest_font_size(&self, request: &OverlayRequest) -> Result<Option<u32>> {
        let area = request.text_box.effective();
        suggest_font_size(&self.runs(request), &self.measurer, area.width, area.height)
    }

    /// Draw `request` onto `image`
    ///
    /// Only a missing font fails the call; every other problem ends up in
    /// the report's warnings.
    pub fn render(&self, image: &mut RgbaImage, request: &OverlayRequest) -> Result<OverlayReport> {
        let caps = request.capabilities;
        let runs = self.runs(request);
        let hashtags = detected_hashtags(&runs);
        let emoji = detected_emoji(&runs);

        let mut warnings = Vec::new();
        let tb = request.text_box;
        if tb.padding_collapses() {
            let warning = format!(
                "Padding {} leaves no room in a {}x{} box, using a 1px area",
                tb.padding, tb.width, tb.height
            );
            log::warn!("{}", warning);
            warnings.push(warning);
        }
        let area = tb.effective();

        let fitted = fit(&runs, &self.measurer, request.fit_params(), &self.config, caps)?;

        let synthesizer = if caps.emoji_support && !emoji.is_empty() {
            self.synthesizer()
        } else {
            None
        };
        let composed = Compositor::new(&self.measurer, synthesizer.as_deref(), caps).compose(
            image,
            &fitted,
            area,
            &request.compose_options(),
        )?;

        log::info!(
            "Drew {} line(s) at {}px ({:?}), {} emoji image(s)",
            fitted.wrapped_lines.len(),
            fitted.chosen_font_size,
            fitted.outcome,
            composed.placements.len()
        );
        Ok(OverlayReport::new(hashtags, emoji, warnings, &fitted, &composed))
    }

    /// The same request on every image, in parallel
    pub fn render_batch(
        &self,
        images: &mut [RgbaImage],
        request: &OverlayRequest,
    ) -> Vec<Result<OverlayReport>> {
        images
            .par_iter_mut()
            .map(|image| self.render(image, request))
            .collect()
    }
}

impl std::fmt::Debug for Overlay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Overlay")
            .field("resolver", &self.resolver)
            .field("shaper", &self.shaper.name())
            .field("config", &self.config)
            .finish()
    }
}

/// Assemble an [`Overlay`] piece by piece
///
/// Everything is optional: with no fonts the resolver falls back to
/// well-known system faces, and the harfrust shaper with its width cache
/// is used unless another shaper is supplied.
pub struct OverlayBuilder {
    fonts: FontSet,
    emoji_fonts: EmojiFontChain,
    config: FitConfig,
    font_cache: Option<Arc<FontCache>>,
    font_provider: Option<Arc<dyn FontProvider>>,
    shaper: Option<Arc<dyn TextShaper>>,
    synthesizer: Option<Arc<dyn GlyphSynthesizer>>,
    system_defaults: bool,
}

impl OverlayBuilder {
    pub fn new() -> Self {
        Self {
            fonts: FontSet::new(),
            emoji_fonts: EmojiFontChain::system(),
            config: FitConfig::default(),
            font_cache: None,
            font_provider: None,
            shaper: None,
            synthesizer: None,
            system_defaults: true,
        }
    }

    pub fn fonts(mut self, fonts: FontSet) -> Self {
        self.fonts = fonts;
        self
    }

    pub fn emoji_fonts(mut self, chain: EmojiFontChain) -> Self {
        self.emoji_fonts = chain;
        self
    }

    pub fn config(mut self, config: FitConfig) -> Self {
        self.config = config;
        self
    }

    /// Share loaded faces with other contexts
    pub fn font_cache(mut self, cache: Arc<FontCache>) -> Self {
        self.font_cache = Some(cache);
        self
    }

    /// Measure and draw text with these faces instead of the resolver's
    pub fn font_provider(mut self, provider: Arc<dyn FontProvider>) -> Self {
        self.font_provider = Some(provider);
        self
    }

    pub fn shaper(mut self, shaper: Arc<dyn TextShaper>) -> Self {
        self.shaper = Some(shaper);
        self
    }

    /// Use this emoji source instead of resolving an emoji face
    pub fn synthesizer(mut self, synthesizer: Arc<dyn GlyphSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    /// Never fall back to system font paths
    pub fn without_system_defaults(mut self) -> Self {
        self.system_defaults = false;
        self
    }

    pub fn build(self) -> Result<Overlay> {
        self.config.validate()?;

        let mut resolver = FontResolver::new(self.fonts).with_emoji_chain(self.emoji_fonts);
        if let Some(cache) = self.font_cache {
            resolver = resolver.with_cache(cache);
        }
        if !self.system_defaults {
            resolver = resolver.without_system_defaults();
        }
        let resolver = Arc::new(resolver);

        let shaper = self
            .shaper
            .unwrap_or_else(|| Arc::new(HarfrustShaper::with_cache()));
        let provider = self.font_provider.unwrap_or_else(|| {
            let provider: Arc<dyn FontProvider> = resolver.clone();
            provider
        });

        let synthesizer = OnceLock::new();
        if let Some(synth) = self.synthesizer {
            let _ = synthesizer.set(Some(synth));
        }

        Ok(Overlay {
            measurer: Measurer::new(provider, Arc::clone(&shaper)),
            resolver,
            shaper,
            config: self.config,
            synthesizer,
        })
    }
}

impl Default for OverlayBuilder {
    fn default() -> Self {
        Self::new()
    }
}
