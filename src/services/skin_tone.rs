use image::{DynamicImage, GenericImageView};

use crate::models::SkinTone;

// Skin mask bounds in HSV, matching OpenCV scaling: hue 0-180, saturation
// and value 0-255. The mask is inclusive on both ends.
const HUE_MAX: f64 = 20.0;
const SATURATION_MIN: f64 = 20.0;
const VALUE_MIN: f64 = 70.0;

// Lightness bin edges over CIELAB L* scaled to 0-255
const FAIR_BRIGHT_MIN: f64 = 200.0;
const FAIR_MIN: f64 = 170.0;
const MEDIUM_MIN: f64 = 140.0;
const TAN_MIN: f64 = 110.0;

/// Result of skin tone analysis for one photo
#[derive(Debug, Clone, Copy)]
pub struct SkinAnalysis {
    pub skin_tone: SkinTone,
    pub confidence: f64,
}

/// Mean RGB over a pixel selection
#[derive(Debug, Clone, Copy)]
struct MeanColor {
    red: f64,
    green: f64,
    blue: f64,
}

/// Derives a skin tone label from the photo.
///
/// Averages the color of pixels inside an HSV skin mask; when the mask comes
/// up empty (heavy clothing, odd lighting) the center region of the frame is
/// averaged instead. The mean color's CIELAB lightness then lands in one of
/// the fixed bins.
pub fn analyze(image: &DynamicImage) -> SkinAnalysis {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return SkinAnalysis {
            skin_tone: SkinTone::Unknown,
            confidence: 0.0,
        };
    }

    let mean = skin_mask_mean(image)
        .or_else(|| center_region_mean(image))
        .or_else(|| whole_image_mean(image));

    let mean = match mean {
        Some(mean) => mean,
        None => {
            return SkinAnalysis {
                skin_tone: SkinTone::Unknown,
                confidence: 0.0,
            }
        }
    };

    let lightness = lab_lightness(mean);
    let (skin_tone, confidence) = classify_lightness(lightness, mean.red, mean.blue);
    SkinAnalysis {
        skin_tone,
        confidence,
    }
}

/// Maps scaled lightness to a tone label. Bin edges belong to the darker
/// bin; the red/blue balance splits the medium bin's confidence.
pub fn classify_lightness(lightness: f64, mean_red: f64, mean_blue: f64) -> (SkinTone, f64) {
    if lightness > FAIR_BRIGHT_MIN {
        (SkinTone::Fair, 0.90)
    } else if lightness > FAIR_MIN {
        (SkinTone::Fair, 0.85)
    } else if lightness > MEDIUM_MIN {
        if mean_red > mean_blue {
            (SkinTone::Medium, 0.85)
        } else {
            (SkinTone::Medium, 0.80)
        }
    } else if lightness > TAN_MIN {
        (SkinTone::Tan, 0.85)
    } else {
        (SkinTone::Deep, 0.85)
    }
}

fn skin_mask_mean(image: &DynamicImage) -> Option<MeanColor> {
    let mut sum = (0.0, 0.0, 0.0);
    let mut count = 0u64;

    for pixel in image.pixels() {
        let [r, g, b, _] = pixel.2 .0;
        if is_skin_pixel(r, g, b) {
            sum.0 += r as f64;
            sum.1 += g as f64;
            sum.2 += b as f64;
            count += 1;
        }
    }

    mean_of(sum, count)
}

fn center_region_mean(image: &DynamicImage) -> Option<MeanColor> {
    let (width, height) = image.dimensions();
    let mut sum = (0.0, 0.0, 0.0);
    let mut count = 0u64;

    for y in height / 4..(3 * height / 4) {
        for x in width / 4..(3 * width / 4) {
            let [r, g, b, _] = image.get_pixel(x, y).0;
            sum.0 += r as f64;
            sum.1 += g as f64;
            sum.2 += b as f64;
            count += 1;
        }
    }

    mean_of(sum, count)
}

fn whole_image_mean(image: &DynamicImage) -> Option<MeanColor> {
    let mut sum = (0.0, 0.0, 0.0);
    let mut count = 0u64;

    for pixel in image.pixels() {
        let [r, g, b, _] = pixel.2 .0;
        sum.0 += r as f64;
        sum.1 += g as f64;
        sum.2 += b as f64;
        count += 1;
    }

    mean_of(sum, count)
}

fn mean_of(sum: (f64, f64, f64), count: u64) -> Option<MeanColor> {
    if count == 0 {
        return None;
    }
    Some(MeanColor {
        red: sum.0 / count as f64,
        green: sum.1 / count as f64,
        blue: sum.2 / count as f64,
    })
}

fn is_skin_pixel(r: u8, g: u8, b: u8) -> bool {
    let (h, s, v) = rgb_to_hsv(r, g, b);
    h <= HUE_MAX && s >= SATURATION_MIN && v >= VALUE_MIN
}

/// RGB to HSV with OpenCV scaling: hue in [0, 180], saturation and value in
/// [0, 255]
fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f64, f64, f64) {
    let r = r as f64 / 255.0;
    let g = g as f64 / 255.0;
    let b = b as f64 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let value = max * 255.0;
    let saturation = if max > 0.0 { delta / max * 255.0 } else { 0.0 };

    let hue_degrees = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (((g - b) / delta).rem_euclid(6.0))
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };

    (hue_degrees / 2.0, saturation, value)
}

/// CIELAB L* (D65) of the mean color, scaled to OpenCV's 0-255 range
fn lab_lightness(mean: MeanColor) -> f64 {
    let y = 0.2126 * srgb_to_linear(mean.red)
        + 0.7152 * srgb_to_linear(mean.green)
        + 0.0722 * srgb_to_linear(mean.blue);

    let fy = if y > 0.008856 {
        y.cbrt()
    } else {
        (903.3 * y + 16.0) / 116.0
    };

    let l_star = (116.0 * fy - 16.0).clamp(0.0, 100.0);
    l_star * 2.55
}

fn srgb_to_linear(channel: f64) -> f64 {
    let c = channel / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}
