// Color - sRGB colors and perceptual (CIE L*C*h) blending
//
// Gradient keypoints are stored as 8-bit sRGB. Blending happens in the
// cylindrical form of CIE L*a*b* (hue, chroma, lightness) under a D65 white
// point, so a red-to-green transition passes through orange/yellow instead
// of the muddy olive a straight RGB lerp would produce.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// D65 reference white in XYZ
const D65: [f64; 3] = [0.95047, 1.00000, 1.08883];

/// Linear sRGB to XYZ (D65)
const RGB_TO_XYZ: [[f64; 3]; 3] = [
    [0.412_390_799_265_959_5, 0.357_584_339_383_878, 0.180_480_788_401_834_3],
    [0.212_639_005_871_510_36, 0.715_168_678_767_755_9, 0.072_192_315_360_733_72],
    [0.019_330_818_715_591_85, 0.119_194_779_794_625_99, 0.950_532_152_249_660_6],
];

/// XYZ (D65) to linear sRGB
const XYZ_TO_RGB: [[f64; 3]; 3] = [
    [3.240_969_941_904_521, -1.537_383_177_570_093_5, -0.498_610_760_293_003_3],
    [-0.969_243_636_280_879_8, 1.875_967_501_507_720_7, 0.041_555_057_407_175_61],
    [0.055_630_079_696_993_61, -0.203_976_958_888_976_57, 1.056_971_514_242_878_6],
];

/// Chroma below which a color's hue is considered meaningless
const ACHROMATIC_CHROMA: f64 = 0.00015;

/// Error returned when a `#RRGGBB` string cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorParseError {
    /// String does not start with `#` or is not 7 characters long
    #[error("expected a color of the form #RRGGBB, got {0:?}")]
    Format(String),

    /// One of the channels is not valid hexadecimal
    #[error("invalid hex digits in color {0:?}")]
    Digits(String),
}

/// 8-bit sRGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0x00, 0x00, 0x00);
    pub const WHITE: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);
    pub const RED: Rgb = Rgb::new(0xFF, 0x00, 0x00);
    pub const GREEN: Rgb = Rgb::new(0x00, 0xFF, 0x00);
    pub const BLUE: Rgb = Rgb::new(0x00, 0x00, 0xFF);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a `#RRGGBB` hex string (case-insensitive)
    pub fn from_hex(s: &str) -> Result<Self, ColorParseError> {
        let digits = s
            .strip_prefix('#')
            .filter(|d| d.len() == 6 && d.is_ascii())
            .ok_or_else(|| ColorParseError::Format(s.to_string()))?;

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|_| ColorParseError::Digits(s.to_string()))
        };

        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Format as an upper-case `#RRGGBB` string
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Fully opaque RGBA bytes
    #[inline]
    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 0xFF]
    }

    /// Blend towards `other` in hue/chroma/lightness space
    ///
    /// `t` = 0 yields `self`, `t` = 1 yields `other`. Hue travels along the
    /// shorter arc of the color wheel. The result is clamped to the sRGB gamut.
    pub fn blend_hcl(self, other: Rgb, t: f64) -> Rgb {
        let mut a = Hcl::from(self);
        let mut b = Hcl::from(other);

        // A gray has no hue of its own; borrow the other endpoint's
        if a.c <= ACHROMATIC_CHROMA && b.c >= ACHROMATIC_CHROMA {
            a.h = b.h;
        } else if b.c <= ACHROMATIC_CHROMA && a.c >= ACHROMATIC_CHROMA {
            b.h = a.h;
        }

        Hcl {
            h: interpolate_angle(a.h, b.h, t),
            c: a.c + t * (b.c - a.c),
            l: a.l + t * (b.l - a.l),
        }
        .to_rgb_clamped()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Rgb {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for Rgb {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_hex()
    }
}

/// Hue (degrees), chroma and lightness of a CIE L*C*h color
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hcl {
    pub h: f64,
    pub c: f64,
    pub l: f64,
}

impl From<Rgb> for Hcl {
    fn from(color: Rgb) -> Self {
        let [r, g, b] = [color.r, color.g, color.b].map(|v| linearize(v as f64 / 255.0));

        let [x, y, z] = RGB_TO_XYZ.map(|[kr, kg, kb]| kr * r + kg * g + kb * b);

        let fy = lab_f(y / D65[1]);
        let l = 1.16 * fy - 0.16;
        let a = 5.0 * (lab_f(x / D65[0]) - fy);
        let b = 2.0 * (fy - lab_f(z / D65[2]));

        let h = if (b - a).abs() > 1e-4 && a.abs() > 1e-4 {
            (b.atan2(a).to_degrees() + 360.0) % 360.0
        } else {
            0.0
        };

        Hcl {
            h,
            c: (a * a + b * b).sqrt(),
            l,
        }
    }
}

impl Hcl {
    /// Convert back to 8-bit sRGB, clamping out-of-gamut channels
    pub fn to_rgb_clamped(self) -> Rgb {
        let (sin, cos) = self.h.to_radians().sin_cos();
        let a = self.c * cos;
        let b = self.c * sin;

        let l2 = (self.l + 0.16) / 1.16;
        let x = D65[0] * lab_f_inv(l2 + a / 5.0);
        let y = D65[1] * lab_f_inv(l2);
        let z = D65[2] * lab_f_inv(l2 - b / 2.0);

        let [r, g, b] = XYZ_TO_RGB.map(|[kx, ky, kz]| to_channel(kx * x + ky * y + kz * z));
        Rgb::new(r, g, b)
    }
}

#[inline]
fn linearize(v: f64) -> f64 {
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

#[inline]
fn delinearize(v: f64) -> f64 {
    if v <= 0.003_130_8 {
        12.92 * v
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}

#[inline]
fn to_channel(linear: f64) -> u8 {
    (delinearize(linear).clamp(0.0, 1.0) * 255.0).round() as u8
}

#[inline]
fn lab_f(t: f64) -> f64 {
    const EPSILON: f64 = (6.0 / 29.0) * (6.0 / 29.0) * (6.0 / 29.0);
    if t > EPSILON {
        t.cbrt()
    } else {
        t / 3.0 * (29.0 / 6.0) * (29.0 / 6.0) + 4.0 / 29.0
    }
}

#[inline]
fn lab_f_inv(t: f64) -> f64 {
    if t > 6.0 / 29.0 {
        t * t * t
    } else {
        3.0 * (6.0 / 29.0) * (6.0 / 29.0) * (t - 4.0 / 29.0)
    }
}

/// Interpolate between two angles (degrees) along the shorter arc
fn interpolate_angle(a0: f64, a1: f64, t: f64) -> f64 {
    let delta = (((a1 - a0) % 360.0) + 540.0) % 360.0 - 180.0;
    (a0 + t * delta + 360.0) % 360.0
}
