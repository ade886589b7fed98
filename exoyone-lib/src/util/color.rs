use palette::{FromColor, Hsv, Srgb};

/// Converts the device's 8-bit hue/saturation/brightness triple to 8-bit RGB.
///
/// All three device channels span `0..=255`; hue is mapped onto the colour
/// wheel before conversion.
pub fn hsb_to_rgb(hue: i64, saturation: i64, brightness: i64) -> (u8, u8, u8) {
    let unit = |value: i64| value.clamp(0, 255) as f32 / 255.0;
    let hsv_color = Hsv::new(unit(hue) * 360.0, unit(saturation), unit(brightness));
    let rgb_color = Srgb::from_color(hsv_color);
    let (r, g, b) = rgb_color.into_components();
    ((r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8)
}

/// `#rrggbb` notation for the same colour.
pub fn hsb_to_hex(hue: i64, saturation: i64, brightness: i64) -> String {
    let (r, g, b) = hsb_to_rgb(hue, saturation, brightness);
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_colors() {
        assert_eq!(hsb_to_rgb(0, 255, 255), (255, 0, 0));
        assert_eq!(hsb_to_rgb(255, 255, 255), (255, 0, 0));
        assert_eq!(hsb_to_hex(0, 255, 255), "#ff0000");
    }

    #[test]
    fn test_greys_ignore_hue() {
        assert_eq!(hsb_to_rgb(17, 0, 255), (255, 255, 255));
        assert_eq!(hsb_to_rgb(200, 255, 0), (0, 0, 0));
        assert_eq!(hsb_to_rgb(-4, 999, 0), (0, 0, 0));
    }
}
