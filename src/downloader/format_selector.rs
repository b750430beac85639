// FormatSelector - quality tier to yt-dlp format expression
//
// One immutable row per tier. Every expression ends in a fallback so a
// source lacking the preferred rendition still yields something playable.

use super::models::QualityTier;

/// Audio transcoding requested after download
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostProcessing {
    pub extract_audio: bool,
    /// yt-dlp `--audio-format` value (e.g., "mp3")
    pub audio_format: &'static str,
    /// yt-dlp `--audio-quality` value (e.g., "320K")
    pub audio_quality: &'static str,
}

/// How the relayed bytes are labelled for the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub extension: &'static str,
    pub content_type: &'static str,
}

const VIDEO_DELIVERY: Delivery = Delivery {
    extension: "mp4",
    content_type: "video/mp4",
};

const AUDIO_DELIVERY: Delivery = Delivery {
    extension: "mp3",
    content_type: "audio/mpeg",
};

/// A format-selection row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatSelector {
    pub tier: QualityTier,
    /// yt-dlp `-f` expression
    pub expression: &'static str,
    pub post_processing: Option<PostProcessing>,
    pub delivery: Delivery,
}

const DEFAULT_ROW: FormatSelector = FormatSelector {
    tier: QualityTier::Default,
    expression: "best/bestvideo+bestaudio",
    post_processing: None,
    delivery: VIDEO_DELIVERY,
};

const FORMAT_TABLE: [FormatSelector; 7] = [
    FormatSelector {
        tier: QualityTier::FourK,
        expression: "bestvideo[height<=2160]+bestaudio/best[height<=2160]/best",
        post_processing: None,
        delivery: VIDEO_DELIVERY,
    },
    FormatSelector {
        tier: QualityTier::Hd1080,
        expression: "bestvideo[height<=1080][ext=mp4]+bestaudio[ext=m4a]/best[height<=1080][ext=mp4]/best[ext=mp4]/best",
        post_processing: None,
        delivery: VIDEO_DELIVERY,
    },
    FormatSelector {
        tier: QualityTier::P720,
        expression: "best[height<=720][ext=mp4]/best[height<=720]/best",
        post_processing: None,
        delivery: VIDEO_DELIVERY,
    },
    FormatSelector {
        tier: QualityTier::P360,
        expression: "best[height<=360][ext=mp4]/best[height<=360]/worst",
        post_processing: None,
        delivery: VIDEO_DELIVERY,
    },
    FormatSelector {
        tier: QualityTier::AudioHigh,
        expression: "bestaudio/best",
        post_processing: Some(PostProcessing {
            extract_audio: true,
            audio_format: "mp3",
            audio_quality: "320K",
        }),
        delivery: AUDIO_DELIVERY,
    },
    FormatSelector {
        tier: QualityTier::AudioLow,
        expression: "bestaudio/best",
        post_processing: Some(PostProcessing {
            extract_audio: true,
            audio_format: "mp3",
            audio_quality: "128K",
        }),
        delivery: AUDIO_DELIVERY,
    },
    DEFAULT_ROW,
];

impl FormatSelector {
    /// Row for a tier. Never fails: a missing row falls back to the
    /// best-available default.
    pub fn for_tier(tier: QualityTier) -> &'static FormatSelector {
        FORMAT_TABLE
            .iter()
            .find(|row| row.tier == tier)
            .unwrap_or(&DEFAULT_ROW)
    }

    /// Every row, in tier order
    pub fn table() -> &'static [FormatSelector] {
        &FORMAT_TABLE
    }

    pub fn is_audio_only(&self) -> bool {
        self.post_processing.is_some_and(|pp| pp.extract_audio)
    }

    /// `-f <expression>` plus any post-processing flags
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["-f".to_string(), self.expression.to_string()];

        if let Some(pp) = self.post_processing {
            if pp.extract_audio {
                args.push("--extract-audio".to_string());
            }
            args.push("--audio-format".to_string());
            args.push(pp.audio_format.to_string());
            args.push("--audio-quality".to_string());
            args.push(pp.audio_quality.to_string());
        }

        args
    }
}
