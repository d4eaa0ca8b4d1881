//! What a render found and decided

use boxfit_layout::FitResult;

use crate::compose::ComposeOutput;

/// Summary of one overlay job
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct OverlayReport {
    pub detected_hashtags: Vec<String>,
    pub detected_emoji: Vec<String>,
    pub warnings: Vec<String>,
    pub chosen_font_size: u32,
    pub line_count: usize,
    pub total_text_height: f32,
    /// `fits`, `aggressive`, `truncated` or `fallback`
    pub outcome: String,
    /// Grapheme budget when the text was cut
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub truncated_to: Option<usize>,
    pub emoji_drawn: usize,
    pub banner_drawn: bool,
}

impl OverlayReport {
    pub(crate) fn new(
        detected_hashtags: Vec<String>,
        detected_emoji: Vec<String>,
        mut warnings: Vec<String>,
        fit: &FitResult,
        composed: &ComposeOutput,
    ) -> Self {
        for w in fit.warnings.iter().chain(&composed.warnings) {
            if !warnings.contains(w) {
                warnings.push(w.clone());
            }
        }
        Self {
            detected_hashtags,
            detected_emoji,
            warnings,
            chosen_font_size: fit.chosen_font_size,
            line_count: fit.wrapped_lines.len(),
            total_text_height: fit.total_text_height,
            outcome: fit.outcome.name().to_string(),
            truncated_to: fit.outcome.truncated_to(),
            emoji_drawn: composed.placements.len(),
            banner_drawn: composed.banner_drawn,
        }
    }

    /// Comma-joined hashtags, or `None`
    pub fn hashtags_found(&self) -> String {
        join_or_none(&self.detected_hashtags)
    }

    /// Comma-joined emoji, or `None`
    pub fn emoji_found(&self) -> String {
        join_or_none(&self.detected_emoji)
    }

    /// One line for humans: findings and warnings joined with ` | `
    pub fn processing_info(&self) -> String {
        let mut parts = Vec::new();
        if !self.detected_hashtags.is_empty() {
            parts.push(format!(
                "Found {} hashtags: {}",
                self.detected_hashtags.len(),
                self.detected_hashtags.join(", ")
            ));
        }
        if !self.detected_emoji.is_empty() {
            parts.push(format!(
                "Found {} emojis: {}",
                self.detected_emoji.len(),
                self.detected_emoji.join(", ")
            ));
        }
        parts.extend(self.warnings.iter().cloned());
        if parts.is_empty() {
            "No issues detected".to_string()
        } else {
            parts.join(" | ")
        }
    }
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "None".to_string()
    } else {
        items.join(", ")
    }
}
