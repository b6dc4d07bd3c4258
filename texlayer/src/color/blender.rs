//! Gamma-correct color blending.

use std::sync::OnceLock;

use super::Color;

/// Gamma used to move channels into linear space before averaging.
const GAMMA: f64 = 2.2;

/// Fixed-point scale of the decode table.
const LINEAR_SCALE: f64 = (1u32 << 24) as f64;

/// `pow(v / 255, 2.2)` for every 8-bit value, in 8.24 fixed point.
///
/// Integer sums keep `blend` independent of argument order, which float
/// accumulation would not.
fn decode_table() -> &'static [u32; 256] {
    static TABLE: OnceLock<[u32; 256]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [0u32; 256];
        for (value, entry) in table.iter_mut().enumerate() {
            *entry = ((value as f64 / 255.0).powf(GAMMA) * LINEAR_SCALE).round() as u32;
        }
        table
    })
}

/// Largest 8-bit value whose decoded form does not exceed `linear`.
///
/// Equivalent to `floor(pow(linear, 1 / 2.2) * 255)` without the float
/// noise that would otherwise knock exact inputs down by one.
fn encode_floor(linear_fixed: u64, divisor: u64) -> u8 {
    let table = decode_table();
    let index = table.partition_point(|&entry| entry as u64 * divisor <= linear_fixed);
    index.saturating_sub(1) as u8
}

/// Pure blending functions over packed colors.
///
/// There is no state; the type only namespaces the functions.
#[derive(Debug, Clone, Copy)]
pub struct ColorBlender;

impl ColorBlender {
    /// Average four colors in linear space.
    ///
    /// Computes one mipmap pixel from the 2×2 block beneath it. A color with
    /// zero alpha counts as transparent black so stale RGB bits hidden under
    /// transparency do not bleed into the result.
    pub fn blend(first: Color, second: Color, third: Color, fourth: Color) -> Color {
        let table = decode_table();
        let samples = [first, second, third, fourth].map(|color| {
            if color.alpha() == 0 {
                Color::TRANSPARENT.channels()
            } else {
                color.channels()
            }
        });

        let mut blended = [0u8; 4];
        for (channel, out) in blended.iter_mut().enumerate() {
            let sum: u64 = samples
                .iter()
                .map(|sample| table[sample[channel] as usize] as u64)
                .sum();
            *out = encode_floor(sum, 4);
        }

        Color::from_channels(blended)
    }

    /// Composite `top` over `bottom`.
    ///
    /// Output alpha is `top + bottom * (1 - top)`; color channels are
    /// weighted the same way in linear space. When both inputs are fully
    /// transparent the result is transparent black.
    pub fn alpha_blend(top: Color, bottom: Color) -> Color {
        let top_alpha = top.alpha() as f64 / 255.0;
        let bottom_alpha = bottom.alpha() as f64 / 255.0;
        let bottom_weight = bottom_alpha * (1.0 - top_alpha);
        let out_alpha = top_alpha + bottom_weight;

        if out_alpha <= 0.0 {
            return Color::TRANSPARENT;
        }

        let table = decode_table();
        let top_channels = top.channels();
        let bottom_channels = bottom.channels();

        let mut out = [0u8; 4];
        out[0] = (out_alpha * 255.0).round().min(255.0) as u8;
        for channel in 1..4 {
            let top_linear = table[top_channels[channel] as usize] as f64;
            let bottom_linear = table[bottom_channels[channel] as usize] as f64;
            let linear = (top_linear * top_alpha + bottom_linear * bottom_weight) / out_alpha;
            out[channel] = encode_floor((linear + 0.5) as u64, 1);
        }

        Color::from_channels(out)
    }

    /// Linearly interpolate every channel from `start` toward `end`.
    ///
    /// `fraction` is clamped to `0.0..=1.0`.
    pub fn lerp(start: Color, end: Color, fraction: f32) -> Color {
        let fraction = fraction.clamp(0.0, 1.0);
        let start_channels = start.channels();
        let end_channels = end.channels();

        let mut out = [0u8; 4];
        for (channel, value) in out.iter_mut().enumerate() {
            let from = start_channels[channel] as f32;
            let to = end_channels[channel] as f32;
            *value = (from + (to - from) * fraction).round() as u8;
        }

        Color::from_channels(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_table_is_strictly_increasing() {
        let table = decode_table();
        assert_eq!(table[0], 0);
        assert_eq!(table[255], 1 << 24);
        assert!(table.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_blend_uniform_black_and_white() {
        assert_eq!(
            ColorBlender::blend(Color::BLACK, Color::BLACK, Color::BLACK, Color::BLACK),
            Color::BLACK
        );
        assert_eq!(
            ColorBlender::blend(Color::WHITE, Color::WHITE, Color::WHITE, Color::WHITE),
            Color::WHITE
        );
    }

    #[test]
    fn test_blend_is_gamma_correct() {
        // Two black and two white pixels average to ~186, not the naive 127.
        let blended = ColorBlender::blend(Color::BLACK, Color::WHITE, Color::BLACK, Color::WHITE);
        assert_eq!(blended.alpha(), 255);
        assert!(blended.red() > 180 && blended.red() < 190, "got {:?}", blended);
        assert_eq!(blended.red(), blended.green());
        assert_eq!(blended.green(), blended.blue());
    }

    #[test]
    fn test_blend_ignores_rgb_under_zero_alpha() {
        let hidden_red = Color::from_argb(0x00FF_0000);
        let blue = Color::new(0, 0, 255, 255);
        let blended = ColorBlender::blend(hidden_red, blue, blue, blue);
        let clean = ColorBlender::blend(Color::TRANSPARENT, blue, blue, blue);
        assert_eq!(blended, clean);
        assert_eq!(blended.red(), 0);
    }

    #[test]
    fn test_alpha_blend_opaque_top_wins() {
        let top = Color::new(12, 34, 56, 255);
        let bottom = Color::new(200, 100, 50, 255);
        assert_eq!(ColorBlender::alpha_blend(top, bottom), top);
    }

    #[test]
    fn test_alpha_blend_transparent_top_keeps_bottom() {
        let bottom = Color::new(200, 100, 50, 128);
        assert_eq!(ColorBlender::alpha_blend(Color::TRANSPARENT, bottom), bottom);
    }

    #[test]
    fn test_alpha_blend_both_transparent() {
        let top = Color::from_argb(0x00AB_CDEF);
        let bottom = Color::from_argb(0x0012_3456);
        assert_eq!(ColorBlender::alpha_blend(top, bottom), Color::TRANSPARENT);
    }

    #[test]
    fn test_alpha_blend_half_over_opaque() {
        let top = Color::new(255, 255, 255, 128);
        let blended = ColorBlender::alpha_blend(top, Color::BLACK);
        assert_eq!(blended.alpha(), 255);
        assert!(blended.red() > 128, "linear-space blend should brighten: {:?}", blended);
    }

    #[test]
    fn test_lerp_endpoints_and_midpoint() {
        let start = Color::new(0, 100, 200, 255);
        let end = Color::new(100, 200, 0, 55);
        assert_eq!(ColorBlender::lerp(start, end, 0.0), start);
        assert_eq!(ColorBlender::lerp(start, end, 1.0), end);
        assert_eq!(ColorBlender::lerp(start, end, 0.5), Color::new(50, 150, 100, 155));
        assert_eq!(ColorBlender::lerp(start, end, 7.0), end);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_blend_is_symmetric(a: u32, b: u32, c: u32, d: u32) {
                let (a, b, c, d) = (
                    Color::from_argb(a),
                    Color::from_argb(b),
                    Color::from_argb(c),
                    Color::from_argb(d),
                );
                prop_assert_eq!(
                    ColorBlender::blend(a, b, c, d),
                    ColorBlender::blend(d, c, b, a)
                );
            }

            #[test]
            fn test_blend_uniform_input_is_identity(argb in 0x0100_0000u32..=u32::MAX) {
                let color = Color::from_argb(argb);
                prop_assert_eq!(ColorBlender::blend(color, color, color, color), color);
            }
        }
    }
}
