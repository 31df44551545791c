//! Unit conversions between Dreo device ranges and Home Assistant ranges

/// Coolest end of the ceiling fan light's color temperature dial
pub const DREO_FAN_LIGHT_MIN_KELVIN: u32 = 2700;
/// Warmest end of the ceiling fan light's color temperature dial
pub const DREO_FAN_LIGHT_MAX_KELVIN: u32 = 5700;

/// Device brightness (0-100) to Home Assistant brightness (0-255), truncating
pub fn brightness_to_hass(value: i64) -> u8 {
    // exact form of trunc(value * 2.55)
    (value.clamp(0, 100) * 255 / 100) as u8
}

/// Home Assistant brightness (0-255) to device brightness (0-100)
pub fn brightness_from_hass(brightness: u8) -> i64 {
    (f64::from(brightness) / 2.55).round() as i64
}

/// Color temperature dial (0-100) to Kelvin, truncating
pub fn dial_to_kelvin(dial: i64, min_kelvin: u32, max_kelvin: u32) -> u32 {
    let span = i64::from(max_kelvin) - i64::from(min_kelvin);
    let offset = (dial.clamp(0, 100) * span) as f64 / 100.0;
    (offset + f64::from(min_kelvin)) as u32
}

/// Kelvin to color temperature dial (0-100). Kelvin outside the range is
/// clamped first.
pub fn kelvin_to_dial(kelvin: u32, min_kelvin: u32, max_kelvin: u32) -> i64 {
    let kelvin = kelvin.clamp(min_kelvin, max_kelvin);
    let normalized =
        f64::from(kelvin - min_kelvin) / f64::from(max_kelvin.saturating_sub(min_kelvin).max(1));
    (normalized * 100.0).round() as i64
}

/// Light ring brightness (1-5) to Home Assistant brightness (1-255)
pub fn ring_brightness_to_hass(level: i64) -> u8 {
    (level.clamp(0, 5) * 255 / 5) as u8
}

/// Home Assistant brightness (1-255) to light ring brightness (1-5)
pub fn ring_brightness_from_hass(brightness: u8) -> i64 {
    let level = (f64::from(brightness) / 255.0 * 5.0).round() as i64;
    level.max(1)
}

/// Split a packed 0xRRGGBB color
pub fn unpack_rgb(color: u32) -> (u8, u8, u8) {
    let red = ((color >> 16) & 255) as u8;
    let green = ((color >> 8) & 255) as u8;
    let blue = (color & 255) as u8;
    (red, green, blue)
}

/// Pack red, green and blue into 0xRRGGBB
pub fn pack_rgb(red: u8, green: u8, blue: u8) -> u32 {
    (u32::from(red) << 16) + (u32::from(green) << 8) + u32::from(blue)
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// RGB to hue (degrees, 0-360) and saturation (percent, 0-100), each
/// rounded to 3 decimals
pub fn rgb_to_hs(red: u8, green: u8, blue: u8) -> (f64, f64) {
    let r = f64::from(red) / 255.0;
    let g = f64::from(green) / 255.0;
    let b = f64::from(blue) / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    if max == min {
        return (0.0, 0.0);
    }

    let delta = max - min;
    let saturation = delta / max;
    let rc = (max - r) / delta;
    let gc = (max - g) / delta;
    let bc = (max - b) / delta;

    let hue = if r == max {
        bc - gc
    } else if g == max {
        2.0 + rc - bc
    } else {
        4.0 + gc - rc
    };
    let hue = (hue / 6.0).rem_euclid(1.0);

    (round3(hue * 360.0), round3(saturation * 100.0))
}

/// Hue (degrees) and saturation (percent) to RGB at full value, truncating
/// each channel
pub fn hs_to_rgb(hue: f64, saturation: f64) -> (u8, u8, u8) {
    let h = (hue / 360.0).rem_euclid(1.0);
    let s = (saturation / 100.0).clamp(0.0, 1.0);
    let v = 1.0;

    let (r, g, b) = if s == 0.0 {
        (v, v, v)
    } else {
        let sector = (h * 6.0).floor();
        let f = h * 6.0 - sector;
        let p = v * (1.0 - s);
        let q = v * (1.0 - s * f);
        let t = v * (1.0 - s * (1.0 - f));
        match sector as i64 % 6 {
            0 => (v, t, p),
            1 => (q, v, p),
            2 => (p, v, t),
            3 => (p, q, v),
            4 => (t, p, v),
            _ => (v, p, q),
        }
    };

    let channel = |x: f64| (x * 255.0).clamp(0.0, 255.0) as u8;
    (channel(r), channel(g), channel(b))
}

fn states_in_range(low: u32, high: u32) -> u32 {
    high.saturating_sub(low) + 1
}

/// Device speed within `[low, high]` to a 0-100 percentage
pub fn ranged_value_to_percentage(range: (u32, u32), value: u32) -> u8 {
    let (low, high) = range;
    let offset = low.saturating_sub(1);
    let percentage = value.saturating_sub(offset) * 100 / states_in_range(low, high);
    percentage.min(100) as u8
}

/// 0-100 percentage to a device speed within `[low, high]`, rounding up
pub fn percentage_to_ranged_value(range: (u32, u32), percentage: u8) -> u32 {
    let (low, high) = range;
    let offset = low.saturating_sub(1);
    let value = f64::from(states_in_range(low, high)) * f64::from(percentage) / 100.0
        + f64::from(offset);
    (value.ceil() as u32).clamp(low, high)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN_K: u32 = DREO_FAN_LIGHT_MIN_KELVIN;
    const MAX_K: u32 = DREO_FAN_LIGHT_MAX_KELVIN;

    #[test]
    fn test_brightness_endpoints() {
        assert_eq!(brightness_to_hass(0), 0);
        assert_eq!(brightness_to_hass(100), 255);
        assert_eq!(brightness_to_hass(50), 127);
        assert_eq!(brightness_from_hass(255), 100);
        assert_eq!(brightness_from_hass(128), 50);
        assert_eq!(brightness_from_hass(0), 0);
    }

    #[test]
    fn test_brightness_round_trip() {
        for value in 0..=100 {
            assert_eq!(brightness_from_hass(brightness_to_hass(value)), value);
        }
    }

    #[test]
    fn test_dial_to_kelvin_endpoints() {
        assert_eq!(dial_to_kelvin(0, MIN_K, MAX_K), 2700);
        assert_eq!(dial_to_kelvin(50, MIN_K, MAX_K), 4200);
        assert_eq!(dial_to_kelvin(100, MIN_K, MAX_K), 5700);
        assert_eq!(kelvin_to_dial(2700, MIN_K, MAX_K), 0);
        assert_eq!(kelvin_to_dial(5700, MIN_K, MAX_K), 100);
    }

    #[test]
    fn test_kelvin_mappings_are_inverse() {
        for dial in 0..=100 {
            let kelvin = dial_to_kelvin(dial, MIN_K, MAX_K);
            assert_eq!(kelvin_to_dial(kelvin, MIN_K, MAX_K), dial);
        }
        for kelvin in MIN_K..=MAX_K {
            let back = dial_to_kelvin(kelvin_to_dial(kelvin, MIN_K, MAX_K), MIN_K, MAX_K);
            assert!(back.abs_diff(kelvin) <= 15, "{kelvin} -> {back}");
        }
    }

    #[test]
    fn test_kelvin_outside_range_is_clamped() {
        assert_eq!(kelvin_to_dial(2000, MIN_K, MAX_K), 0);
        assert_eq!(kelvin_to_dial(6500, MIN_K, MAX_K), 100);
    }

    #[test]
    fn test_ring_brightness() {
        assert_eq!(ring_brightness_to_hass(1), 51);
        assert_eq!(ring_brightness_to_hass(5), 255);
        assert_eq!(ring_brightness_from_hass(255), 5);
        assert_eq!(ring_brightness_from_hass(1), 1);
        assert_eq!(ring_brightness_from_hass(0), 1);
        for level in 1..=5 {
            assert_eq!(ring_brightness_from_hass(ring_brightness_to_hass(level)), level);
        }
    }

    #[test]
    fn test_rgb_pack_unpack_exact() {
        assert_eq!(unpack_rgb(0xFF8000), (255, 128, 0));
        assert_eq!(pack_rgb(255, 128, 0), 0xFF8000);

        for color in (0..=0xFF_FFFFu32).step_by(97).chain([0, 0xFF_FFFF]) {
            let (r, g, b) = unpack_rgb(color);
            assert_eq!(pack_rgb(r, g, b), color);
        }
    }

    #[test]
    fn test_rgb_to_hs_primaries() {
        assert_eq!(rgb_to_hs(255, 0, 0), (0.0, 100.0));
        assert_eq!(rgb_to_hs(0, 255, 0), (120.0, 100.0));
        assert_eq!(rgb_to_hs(0, 0, 255), (240.0, 100.0));
        assert_eq!(rgb_to_hs(255, 255, 255), (0.0, 0.0));
        assert_eq!(rgb_to_hs(255, 128, 0), (30.118, 100.0));
    }

    #[test]
    fn test_hs_to_rgb_primaries() {
        assert_eq!(hs_to_rgb(0.0, 100.0), (255, 0, 0));
        assert_eq!(hs_to_rgb(120.0, 100.0), (0, 255, 0));
        assert_eq!(hs_to_rgb(240.0, 100.0), (0, 0, 255));
        assert_eq!(hs_to_rgb(0.0, 0.0), (255, 255, 255));
        assert_eq!(hs_to_rgb(360.0, 100.0), (255, 0, 0));
    }

    #[test]
    fn test_hs_round_trip_close() {
        for (r, g, b) in [(255, 128, 0), (10, 200, 255), (255, 0, 170), (64, 255, 64)] {
            let (h, s) = rgb_to_hs(r, g, b);
            let (r2, g2, b2) = hs_to_rgb(h, s);
            // full value: the brightest channel is restored to 255
            assert_eq!(r.max(g).max(b), 255);
            assert!(r.abs_diff(r2) <= 1 && g.abs_diff(g2) <= 1 && b.abs_diff(b2) <= 1);
        }
    }

    #[test]
    fn test_speed_percentage() {
        let range = (1, 12);
        assert_eq!(ranged_value_to_percentage(range, 12), 100);
        assert_eq!(ranged_value_to_percentage(range, 6), 50);
        assert_eq!(ranged_value_to_percentage(range, 1), 8);
        assert_eq!(percentage_to_ranged_value(range, 100), 12);
        assert_eq!(percentage_to_ranged_value(range, 50), 6);
        assert_eq!(percentage_to_ranged_value(range, 1), 1);

        for speed in 1..=12 {
            let pct = ranged_value_to_percentage(range, speed);
            assert_eq!(percentage_to_ranged_value(range, pct), speed);
        }
    }
}
