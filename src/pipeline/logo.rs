//! Logo preparation: uploaded image bytes → flattened RGB ready for embedding.
//!
//! The logo is decoded once per batch and shared by every row. Decoding
//! failures never abort the batch; the payslips are produced without a logo
//! and the reason is kept in [`LogoOutcome::Skipped`].

use crate::error::LogoError;
use image::imageops::FilterType;
use image::DynamicImage;
use tracing::{debug, warn};

/// Decoded logo pixels. One pixel maps to one PDF point on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoImage {
    pub width: u32,
    pub height: u32,
    /// Row-major 8-bit RGB, `width * height * 3` bytes.
    pub rgb: Vec<u8>,
}

/// Result of preparing the optional logo.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LogoOutcome {
    /// No logo was supplied.
    #[default]
    Absent,
    /// Logo decoded and fitted to the bounding box.
    Embedded(LogoImage),
    /// Logo supplied but unusable; documents render without it.
    Skipped(LogoError),
}

impl LogoOutcome {
    pub fn image(&self) -> Option<&LogoImage> {
        match self {
            LogoOutcome::Embedded(img) => Some(img),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&LogoError> {
        match self {
            LogoOutcome::Skipped(e) => Some(e),
            _ => None,
        }
    }
}

/// Decode and fit a logo into a `max_width × max_height` point box.
pub fn prepare_logo(bytes: Option<&[u8]>, max_width: u32, max_height: u32) -> LogoOutcome {
    let Some(bytes) = bytes else {
        return LogoOutcome::Absent;
    };
    if bytes.is_empty() {
        warn!("Logo upload is empty; rendering without logo");
        return LogoOutcome::Skipped(LogoError::Empty);
    }

    match image::load_from_memory(bytes) {
        Ok(img) => {
            let logo = fit_and_flatten(img, max_width.max(1), max_height.max(1));
            debug!("Logo prepared at {}×{} pt", logo.width, logo.height);
            LogoOutcome::Embedded(logo)
        }
        Err(e) => {
            warn!("Logo could not be decoded ({}); rendering without logo", e);
            LogoOutcome::Skipped(LogoError::Decode {
                detail: e.to_string(),
            })
        }
    }
}

/// Shrink to fit (never enlarge) and composite any alpha onto white.
fn fit_and_flatten(img: DynamicImage, max_width: u32, max_height: u32) -> LogoImage {
    let img = if img.width() > max_width || img.height() > max_height {
        img.resize(max_width, max_height, FilterType::Lanczos3)
    } else {
        img
    };

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
    for px in rgba.pixels() {
        let alpha = u32::from(px[3]);
        for channel in &px.0[..3] {
            let c = u32::from(*channel);
            rgb.push(((c * alpha + 255 * (255 - alpha) + 127) / 255) as u8);
        }
    }

    LogoImage { width, height, rgb }
}
