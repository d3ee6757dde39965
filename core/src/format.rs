use std::fmt;

/// Format keys accepted on the wire, in the order they are reported.
pub const SUPPORTED_FORMAT_KEYS: [&str; 6] = ["jpeg", "jpg", "png", "webp", "avif", "gif"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Webp,
    Avif,
    Gif,
}

impl ImageFormat {
    /// Exact, case-sensitive lookup of a format key. `jpg` is an alias of `jpeg`.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "jpeg" | "jpg" => Some(ImageFormat::Jpeg),
            "png" => Some(ImageFormat::Png),
            "webp" => Some(ImageFormat::Webp),
            "avif" => Some(ImageFormat::Avif),
            "gif" => Some(ImageFormat::Gif),
            _ => None,
        }
    }

    /// Map a container sniffed by the `image` crate onto the supported set.
    pub fn from_container(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Jpeg => Some(ImageFormat::Jpeg),
            image::ImageFormat::Png => Some(ImageFormat::Png),
            image::ImageFormat::WebP => Some(ImageFormat::Webp),
            image::ImageFormat::Avif => Some(ImageFormat::Avif),
            image::ImageFormat::Gif => Some(ImageFormat::Gif),
            _ => None,
        }
    }

    pub fn to_container(self) -> image::ImageFormat {
        match self {
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Webp => image::ImageFormat::WebP,
            ImageFormat::Avif => image::ImageFormat::Avif,
            ImageFormat::Gif => image::ImageFormat::Gif,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
            ImageFormat::Webp => "webp",
            ImageFormat::Avif => "avif",
            ImageFormat::Gif => "gif",
        }
    }

    pub fn extension(&self) -> &'static str {
        self.as_str()
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Webp => "image/webp",
            ImageFormat::Avif => "image/avif",
            ImageFormat::Gif => "image/gif",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve the output container for the single-shot path.
///
/// The override may carry a leading marker such as `+webp`. Anything that does
/// not name a supported key falls back to the source format instead of failing;
/// the pipeline `convert` step is strict about the same input.
pub fn resolve_output_format(override_key: Option<&str>, source: ImageFormat) -> ImageFormat {
    let Some(raw) = override_key else {
        return source;
    };

    match ImageFormat::from_key(&override_token(raw)) {
        Some(format) => format,
        None => {
            log::debug!("format override '{raw}' not recognised, keeping {source}");
            source
        }
    }
}

/// The key named by a format override: leading marker characters are dropped
/// and the following word is taken as is.
pub fn override_token(raw: &str) -> String {
    raw.trim_start_matches(|c: char| !c.is_alphanumeric())
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect()
}
