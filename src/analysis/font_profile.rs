//! Document-wide font statistics and heading level inference.

use std::collections::BTreeMap;

use crate::model::TextSpan;

/// Tuning for [`FontProfile::analyze`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileOptions {
    /// Promote bold text at or below body size to a heading level below the
    /// size-derived ones when, at that size, bold spans outnumber plain spans
    /// by more than this ratio. A smaller size with only bold spans is
    /// promoted; the body size needs some plain spans. `None` disables
    /// promotion.
    pub bold_promotion_ratio: Option<f32>,

    /// Deepest heading level to emit; smaller heading sizes share it.
    pub max_heading_level: Option<u8>,
}

impl ProfileOptions {
    /// Create profile options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bold promotion ratio.
    pub fn with_bold_promotion(mut self, ratio: Option<f32>) -> Self {
        self.bold_promotion_ratio = ratio;
        self
    }

    /// Set the deepest heading level.
    pub fn with_max_heading_level(mut self, level: Option<u8>) -> Self {
        self.max_heading_level = level;
        self
    }
}

/// Round a font size to 0.1pt buckets.
pub fn size_key(size: f32) -> i32 {
    (size * 10.0).round() as i32
}

fn key_size(key: i32) -> f32 {
    key as f32 / 10.0
}

/// Observations for one font size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizeStats {
    /// Spans at this size
    pub spans: usize,
    /// Bold spans at this size
    pub bold_spans: usize,
    /// Non-whitespace characters at this size
    pub chars: usize,
}

impl SizeStats {
    fn plain_spans(&self) -> usize {
        self.spans - self.bold_spans
    }
}

/// Font size statistics for a whole document.
///
/// Built once before classification and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FontProfile {
    sizes: BTreeMap<i32, SizeStats>,
    body: Option<i32>,
    levels: BTreeMap<i32, u8>,
    bold_levels: BTreeMap<i32, u8>,
}

impl FontProfile {
    /// Tally every span and derive body size and heading levels.
    pub fn analyze<'a, I>(spans: I, options: &ProfileOptions) -> Self
    where
        I: IntoIterator<Item = &'a TextSpan>,
    {
        let mut sizes: BTreeMap<i32, SizeStats> = BTreeMap::new();
        for span in spans {
            if !span.font_size.is_finite() || span.font_size <= 0.0 {
                continue;
            }
            let stats = sizes.entry(size_key(span.font_size)).or_default();
            stats.spans += 1;
            stats.chars += span.text.chars().filter(|c| !c.is_whitespace()).count();
            if span.bold {
                stats.bold_spans += 1;
            }
        }

        // Most characters wins; ties go to the smaller size.
        let body = sizes
            .iter()
            .max_by(|(ka, a), (kb, b)| a.chars.cmp(&b.chars).then(kb.cmp(ka)))
            .map(|(key, _)| *key);

        let Some(body) = body else {
            return Self::default();
        };

        let clamp = |level: usize| -> u8 {
            let level = level.min(u8::MAX as usize) as u8;
            match options.max_heading_level {
                Some(max) => level.min(max.max(1)),
                None => level,
            }
        };

        let levels: BTreeMap<i32, u8> = sizes
            .range(body + 1..)
            .rev()
            .enumerate()
            .map(|(i, (key, _))| (*key, clamp(i + 1)))
            .collect();

        let mut bold_levels = BTreeMap::new();
        if let Some(ratio) = options.bold_promotion_ratio {
            let promoted = clamp(levels.len() + 1);
            for (key, stats) in sizes.range(..=body) {
                let plain = stats.plain_spans() as f32;
                let bold = stats.bold_spans as f32;
                // An all-bold body size means bold body text, not headings.
                let eligible = if *key == body { plain > 0.0 } else { bold > 0.0 };
                if eligible && bold > ratio * plain {
                    bold_levels.insert(*key, promoted);
                }
            }
        }

        let profile = Self {
            sizes,
            body: Some(body),
            levels,
            bold_levels,
        };
        log::debug!(
            "Font profile: body {:.1}pt, headings {:?}",
            key_size(body),
            profile.heading_sizes()
        );
        profile
    }

    /// The inferred body text size, if any text was seen.
    pub fn body_size(&self) -> Option<f32> {
        self.body.map(key_size)
    }

    /// Heading level for text of the given size and weight, or `None` for
    /// body text.
    pub fn heading_level(&self, font_size: f32, bold: bool) -> Option<u8> {
        if !font_size.is_finite() {
            return None;
        }
        let key = size_key(font_size);
        if let Some(level) = self.levels.get(&key) {
            return Some(*level);
        }
        if bold {
            return self.bold_levels.get(&key).copied();
        }
        None
    }

    /// Number of distinct size-derived heading levels.
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Heading sizes with their levels, largest first.
    pub fn heading_sizes(&self) -> Vec<(f32, u8)> {
        self.levels
            .iter()
            .rev()
            .map(|(key, level)| (key_size(*key), *level))
            .collect()
    }

    /// Every observed size with its statistics, smallest first.
    pub fn sizes(&self) -> impl Iterator<Item = (f32, &SizeStats)> {
        self.sizes.iter().map(|(key, stats)| (key_size(*key), stats))
    }
}
