use css_color_parser::Color;
use palette::Srgba;

use crate::error::AvengerScaleError;

/// Parse any CSS color string (named colors, hex, `rgb()`, `hsl()`, ...)
pub fn parse_css_color(value: &str) -> Result<Srgba, AvengerScaleError> {
    match value.trim().parse::<Color>() {
        Ok(color) => Ok(Srgba::new(
            color.r as f32 / 255.0,
            color.g as f32 / 255.0,
            color.b as f32 / 255.0,
            color.a,
        )),
        Err(_) => Err(AvengerScaleError::InvalidColor(value.to_string())),
    }
}

pub fn is_css_color(value: &str) -> bool {
    parse_css_color(value).is_ok()
}

/// Parse a `rrggbb` or `#rrggbb` hex string
pub fn parse_hex(hex: &str) -> Result<Srgba, AvengerScaleError> {
    let digits = hex.trim_start_matches('#');
    let channel = |i: usize| {
        digits
            .get(i..i + 2)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .map(|v| v as f32 / 255.0)
            .ok_or_else(|| AvengerScaleError::InvalidColor(hex.to_string()))
    };
    if digits.len() != 6 {
        return Err(AvengerScaleError::InvalidColor(hex.to_string()));
    }
    Ok(Srgba::new(channel(0)?, channel(2)?, channel(4)?, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_css_color() {
        let c = parse_css_color("red").unwrap();
        assert_eq!(c, Srgba::new(1.0, 0.0, 0.0, 1.0));
        assert!(is_css_color("#abc"));
        assert!(is_css_color("rgb(10, 20, 30)"));
        assert!(!is_css_color("banana"));
        assert!(!is_css_color("12"));
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(
            parse_hex("#ff0000").unwrap(),
            Srgba::new(1.0, 0.0, 0.0, 1.0)
        );
        assert!(parse_hex("#ff00").is_err());
        assert!(parse_hex("zzzzzz").is_err());
    }
}
