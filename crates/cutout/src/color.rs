//! Background colour parsing and background request handling

use image::Rgb;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, VariantNames};

use crate::{
    error::{CutoutError, Result},
    types::BackgroundSpec,
};

/// Colour used for custom backgrounds when the request names none.
pub const DEFAULT_CUSTOM_COLOR: &str = "#FFFFFF";

/// Parse `#rrggbb` (the `#` is optional) into an RGB triple.
///
/// Anything other than exactly six hex digits after the prefix is rejected.
pub fn parse_hex_color(input: &str) -> Result<Rgb<u8>> {
    let hex = input.strip_prefix('#').unwrap_or(input);
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(CutoutError::InvalidColor(input.to_string()));
    }

    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16).map_err(|_| CutoutError::InvalidColor(input.to_string()))
    };
    Ok(Rgb([channel(0..2)?, channel(2..4)?, channel(4..6)?]))
}

/// Background choice as named by callers (`?bg=` style requests, CLI flags).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, VariantNames,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BackgroundMode {
    #[default]
    Transparent,
    White,
    Custom,
}

impl BackgroundMode {
    /// All accepted mode names
    pub fn names() -> &'static [&'static str] {
        <Self as VariantNames>::VARIANTS
    }
}

impl BackgroundSpec {
    /// Resolve a mode name plus optional colour into a [`BackgroundSpec`].
    ///
    /// The colour is only parsed for `custom` and defaults to
    /// [`DEFAULT_CUSTOM_COLOR`]. Errors are raised before any pixels are touched.
    pub fn from_request(mode: &str, color: Option<&str>) -> Result<Self> {
        let mode: BackgroundMode = mode
            .trim()
            .to_ascii_lowercase()
            .parse()
            .map_err(|_| CutoutError::InvalidBackground(mode.to_string()))?;
        Self::from_mode(mode, color)
    }

    pub fn from_mode(mode: BackgroundMode, color: Option<&str>) -> Result<Self> {
        Ok(match mode {
            BackgroundMode::Transparent => Self::Transparent,
            BackgroundMode::White => Self::SolidWhite,
            BackgroundMode::Custom => {
                Self::CustomColor(parse_hex_color(color.unwrap_or(DEFAULT_CUSTOM_COLOR))?)
            }
        })
    }

    pub fn mode(&self) -> BackgroundMode {
        match self {
            Self::Transparent => BackgroundMode::Transparent,
            Self::SolidWhite => BackgroundMode::White,
            Self::CustomColor(_) => BackgroundMode::Custom,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_6_digit() {
        assert_eq!(parse_hex_color("#1a2b3c").unwrap(), Rgb([26, 43, 60]));
        assert_eq!(parse_hex_color("#FFFFFF").unwrap(), Rgb([255, 255, 255]));
        assert_eq!(parse_hex_color("000000").unwrap(), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_parse_hex_invalid() {
        for input in ["#12", "zzzzzz", "#fff", "#1a2b3c4", "##1a2b3c", "+1a2b3", "#1a2b3g", "", "#ééé"] {
            assert!(
                matches!(parse_hex_color(input), Err(CutoutError::InvalidColor(_))),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_background_from_request() {
        assert_eq!(
            BackgroundSpec::from_request("transparent", Some("garbage")).unwrap(),
            BackgroundSpec::Transparent
        );
        assert_eq!(BackgroundSpec::from_request("White", None).unwrap(), BackgroundSpec::SolidWhite);
        assert_eq!(
            BackgroundSpec::from_request("custom", Some("#102030")).unwrap(),
            BackgroundSpec::CustomColor(Rgb([16, 32, 48]))
        );
        assert_eq!(
            BackgroundSpec::from_request("custom", None).unwrap(),
            BackgroundSpec::CustomColor(Rgb([255, 255, 255]))
        );
    }

    #[test]
    fn test_background_request_errors_are_distinct() {
        assert!(matches!(
            BackgroundSpec::from_request("sepia", None),
            Err(CutoutError::InvalidBackground(_))
        ));
        assert!(matches!(
            BackgroundSpec::from_request("custom", Some("#12")),
            Err(CutoutError::InvalidColor(_))
        ));
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(BackgroundMode::names(), ["transparent", "white", "custom"]);
        assert_eq!(BackgroundSpec::SolidWhite.mode().to_string(), "white");
    }
}
