//! Configuration management for Jigsaw.

use anyhow::{Context, Result, bail};
use jigsaw_common::MatchRule;
use jigsaw_common::constants::{
    DEFAULT_CANVAS_SIZE, DEFAULT_LISTEN_ADDR, DEFAULT_PIECE_SIZE, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_SWEEP_INTERVAL_SECS,
};
use serde::Deserialize;
use std::path::Path;

use crate::captcha::{MAX_PATTERN_SIDE, OverlayStyle};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Per-request timeout applied by the HTTP layer
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Directory of static client files served as a fallback
    #[serde(default)]
    pub static_dir: Option<String>,

    /// Challenge configuration
    #[serde(default)]
    pub captcha: CaptchaConfig,
}

/// Challenge-specific configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CaptchaConfig {
    /// Puzzle canvas width in pixels
    #[serde(default = "default_canvas_size")]
    pub canvas_width: u32,

    /// Puzzle canvas height in pixels
    #[serde(default = "default_canvas_size")]
    pub canvas_height: u32,

    /// Piece width in pixels
    #[serde(default = "default_piece_size")]
    pub piece_width: u32,

    /// Piece height in pixels
    #[serde(default = "default_piece_size")]
    pub piece_height: u32,

    /// Reject source images that are not square
    #[serde(default = "default_require_square")]
    pub require_square_source: bool,

    /// Source image path; a generated pattern is used when unset
    #[serde(default)]
    pub source_image: Option<String>,

    /// Base color of generated patterns
    #[serde(default = "default_pattern_color")]
    pub pattern_color: [u8; 3],

    /// How the cut-out region is masked on the puzzle
    #[serde(default)]
    pub overlay: OverlayStyle,

    /// Rule used to score submitted positions
    #[serde(default)]
    pub match_rule: MatchRule,

    /// Challenge lifetime in seconds (unset = keep for the process lifetime)
    #[serde(default)]
    pub challenge_ttl_secs: Option<u64>,

    /// How often expired challenges are swept
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            canvas_width: default_canvas_size(),
            canvas_height: default_canvas_size(),
            piece_width: default_piece_size(),
            piece_height: default_piece_size(),
            require_square_source: default_require_square(),
            source_image: None,
            pattern_color: default_pattern_color(),
            overlay: OverlayStyle::default(),
            match_rule: MatchRule::default(),
            challenge_ttl_secs: None,
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

// Default value functions
fn default_listen_addr() -> String { DEFAULT_LISTEN_ADDR.to_string() }
fn default_request_timeout() -> u64 { DEFAULT_REQUEST_TIMEOUT_SECS }
fn default_canvas_size() -> u32 { DEFAULT_CANVAS_SIZE }
fn default_piece_size() -> u32 { DEFAULT_PIECE_SIZE }
fn default_require_square() -> bool { true }
fn default_pattern_color() -> [u8; 3] { [59, 130, 246] }
fn default_sweep_interval() -> u64 { DEFAULT_SWEEP_INTERVAL_SECS }

impl AppConfig {
    /// Load configuration from file, with CLI overrides
    pub fn load(config_path: &str, args: &super::Args) -> Result<Self> {
        let mut config = Self::from_file(config_path)?;

        // Apply CLI overrides
        if let Some(ref listen) = args.listen {
            config.listen_addr = listen.clone();
        }
        if let Some(ref source_image) = args.source_image {
            config.captcha.source_image = Some(source_image.clone());
        }

        config.validate()?;
        Ok(config)
    }

    fn from_file(config_path: &str) -> Result<Self> {
        if !Path::new(config_path).exists() {
            // Use defaults if config file doesn't exist
            tracing::warn!(path = %config_path, "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path))
            .build()
            .context("Failed to load config file")?;

        settings
            .try_deserialize()
            .context("Failed to parse config")
    }

    /// Reject configurations the engine cannot serve
    pub fn validate(&self) -> Result<()> {
        let c = &self.captcha;

        if c.canvas_width == 0 || c.canvas_height == 0 {
            bail!("canvas must be non-empty, got {}x{}", c.canvas_width, c.canvas_height);
        }
        if c.piece_width == 0 || c.piece_height == 0 {
            bail!("piece must be non-empty, got {}x{}", c.piece_width, c.piece_height);
        }
        if c.piece_width > c.canvas_width || c.piece_height > c.canvas_height {
            bail!(
                "piece {}x{} does not fit canvas {}x{}",
                c.piece_width,
                c.piece_height,
                c.canvas_width,
                c.canvas_height
            );
        }
        let piece_side = c.piece_width.max(c.piece_height);
        if c.source_image.is_none() && piece_side > MAX_PATTERN_SIDE {
            bail!(
                "piece {}x{} exceeds the largest generated background ({MAX_PATTERN_SIDE}px); set source_image",
                c.piece_width,
                c.piece_height
            );
        }
        if c.challenge_ttl_secs.is_some() && c.sweep_interval_secs == 0 {
            bail!("sweep_interval_secs must be positive when challenge_ttl_secs is set");
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be positive");
        }

        c.match_rule.validate()?;
        c.overlay.validate()?;

        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            request_timeout_secs: default_request_timeout(),
            static_dir: None,
            captcha: CaptchaConfig::default(),
        }
    }
}
