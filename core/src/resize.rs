use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixels(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "ModeRepr")]
pub enum ResizeMode {
    #[default]
    None,
    Contain,
    Cover,
    SmartCrop,
}

impl ResizeMode {
    /// Numeric code used by the HTTP API. 2 is unassigned.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::Contain),
            3 => Some(Self::Cover),
            4 => Some(Self::SmartCrop),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Contain => 1,
            Self::Cover => 3,
            Self::SmartCrop => 4,
        }
    }
}

impl fmt::Display for ResizeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Contain => write!(f, "contain"),
            Self::Cover => write!(f, "cover"),
            Self::SmartCrop => write!(f, "smartCrop"),
        }
    }
}

impl FromStr for ResizeMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "0" => Ok(Self::None),
            "contain" | "inside" | "1" => Ok(Self::Contain),
            "cover" | "3" => Ok(Self::Cover),
            "smartcrop" | "smart" | "4" => Ok(Self::SmartCrop),
            _ => Err(format!("unknown resize mode: {s}")),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ModeRepr {
    Code(i64),
    Name(String),
}

impl TryFrom<ModeRepr> for ResizeMode {
    type Error = String;
    fn try_from(repr: ModeRepr) -> Result<Self, Self::Error> {
        match repr {
            ModeRepr::Code(code) => {
                Self::from_code(code).ok_or_else(|| format!("unknown resize code: {code}"))
            }
            ModeRepr::Name(name) => name.parse(),
        }
    }
}

/// Where the crop window sits when a cover resize overflows the box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropAnchor {
    Center,
    /// Chosen by the saliency heuristic in [`crate::smart_crop`].
    Attention,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fit {
    /// Fit inside the box keeping aspect ratio.
    Inside { without_enlargement: bool },
    /// Fill the box exactly, cropping the overflow.
    Cover { anchor: CropAnchor },
}

/// What the codec is asked to do for one resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeDirective {
    pub width: u32,
    pub height: u32,
    pub fit: Fit,
}

impl ResizeDirective {
    /// Geometry of the result, computed without touching pixels.
    pub fn output_dimensions(&self, source: Dimensions) -> Dimensions {
        match self.fit {
            Fit::Cover { .. } => Dimensions::new(self.width, self.height),
            Fit::Inside { without_enlargement } => {
                if source.width == 0 || source.height == 0 {
                    return source;
                }
                let scale = f64::min(
                    self.width as f64 / source.width as f64,
                    self.height as f64 / source.height as f64,
                );
                if without_enlargement && scale >= 1.0 {
                    return source;
                }
                Dimensions::new(
                    scaled(source.width, scale).min(self.width),
                    scaled(source.height, scale).min(self.height),
                )
            }
        }
    }

    /// Size the source is scaled to before a cover crop: the smallest size
    /// that covers the box on both axes.
    pub fn cover_scale_dimensions(&self, source: Dimensions) -> Dimensions {
        if source.width == 0 || source.height == 0 {
            return Dimensions::new(self.width, self.height);
        }
        let scale = f64::max(
            self.width as f64 / source.width as f64,
            self.height as f64 / source.height as f64,
        );
        Dimensions::new(
            scaled(source.width, scale).max(self.width),
            scaled(source.height, scale).max(self.height),
        )
    }
}

fn scaled(value: u32, scale: f64) -> u32 {
    ((value as f64 * scale).round() as u32).max(1)
}

/// Pick the resize directive for a mode. Missing or zero targets fall back to
/// the source dimension; when both are missing nothing is resized.
pub fn select(
    mode: ResizeMode,
    width: Option<u32>,
    height: Option<u32>,
    source: Dimensions,
) -> Option<ResizeDirective> {
    let width = width.filter(|w| *w > 0);
    let height = height.filter(|h| *h > 0);
    if width.is_none() && height.is_none() {
        return None;
    }

    let width = width.unwrap_or(source.width);
    let height = height.unwrap_or(source.height);

    let fit = match mode {
        ResizeMode::None => return None,
        ResizeMode::Contain => Fit::Inside {
            without_enlargement: true,
        },
        ResizeMode::Cover => Fit::Cover {
            anchor: CropAnchor::Center,
        },
        ResizeMode::SmartCrop => Fit::Cover {
            anchor: CropAnchor::Attention,
        },
    };

    Some(ResizeDirective { width, height, fit })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_mode_is_noop() {
        assert_eq!(select(ResizeMode::None, Some(10), Some(10), Dimensions::new(100, 100)), None);
    }

    #[test]
    fn test_missing_targets_is_noop() {
        assert_eq!(select(ResizeMode::Contain, None, None, Dimensions::new(100, 100)), None);
        assert_eq!(select(ResizeMode::Cover, Some(0), Some(0), Dimensions::new(100, 100)), None);
    }

    #[test]
    fn test_missing_height_falls_back_to_source() {
        let directive = select(ResizeMode::Contain, Some(300), None, Dimensions::new(1200, 600)).unwrap();
        assert_eq!((directive.width, directive.height), (300, 600));
        assert_eq!(directive.output_dimensions(Dimensions::new(1200, 600)), Dimensions::new(300, 150));
    }

    #[test]
    fn test_contain_never_enlarges() {
        let source = Dimensions::new(400, 300);
        let directive = select(ResizeMode::Contain, Some(800), Some(800), source).unwrap();
        assert_eq!(directive.output_dimensions(source), source);
    }

    #[test]
    fn test_contain_stays_inside_box() {
        let source = Dimensions::new(1600, 900);
        for (w, h) in [(800, 800), (800, 450), (333, 777), (1000, 10)] {
            let directive = select(ResizeMode::Contain, Some(w), Some(h), source).unwrap();
            let out = directive.output_dimensions(source);
            assert!(out.width <= w && out.height <= h, "{out} for {w}x{h}");
            assert!(out.width <= source.width && out.height <= source.height);
        }
    }

    #[test]
    fn test_cover_is_exact_and_may_enlarge() {
        let source = Dimensions::new(100, 50);
        let directive = select(ResizeMode::Cover, Some(400), Some(400), source).unwrap();
        assert_eq!(directive.output_dimensions(source), Dimensions::new(400, 400));
        assert_eq!(directive.cover_scale_dimensions(source), Dimensions::new(800, 400));
    }

    #[test]
    fn test_smart_crop_uses_attention_anchor() {
        let directive = select(ResizeMode::SmartCrop, Some(10), Some(10), Dimensions::new(20, 20)).unwrap();
        assert_eq!(directive.fit, Fit::Cover { anchor: CropAnchor::Attention });
    }

    #[test]
    fn test_mode_codes() {
        assert_eq!(ResizeMode::from_code(3), Some(ResizeMode::Cover));
        assert_eq!(ResizeMode::from_code(2), None);
        let parsed: ResizeMode = serde_json::from_str("\"smartCrop\"").unwrap();
        assert_eq!(parsed, ResizeMode::SmartCrop);
        let parsed: ResizeMode = serde_json::from_str("1").unwrap();
        assert_eq!(parsed, ResizeMode::Contain);
    }
}
