//! On-screen recording indicator.
//!
//! A small solid box blinks in a corner of the preview while recording. It is
//! drawn after the frame was handed to the encoder, so it never reaches the
//! recorded stream.

use crate::collab::OverlayRect;

/// Placement, color and blink period of the indicator.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct IndicatorStyle {
    pub rect: OverlayRect,
    /// Straight-alpha RGBA.
    pub color: [f32; 4],
    /// The box is visible on ticks where `tick & blink_mask == 0`.
    /// A single bit `1 << n` blinks with a period of `2^(n+1)` frames.
    pub blink_mask: u32,
}

impl IndicatorStyle {
    #[inline]
    pub fn visible_at(&self, tick: u32) -> bool {
        tick & self.blink_mask == 0
    }
}

impl Default for IndicatorStyle {
    fn default() -> Self {
        Self {
            rect: OverlayRect::new(0, 0, 100, 100),
            color: [1.0, 0.0, 0.0, 1.0],
            blink_mask: 0x04,
        }
    }
}

/// Wrapping frame counter driving the blink. Never reset.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct FrameCounter(u32);

impl FrameCounter {
    /// Advances and returns the new tick.
    #[inline]
    pub fn advance(&mut self) -> u32 {
        self.0 = self.0.wrapping_add(1);
        self.0
    }

    #[inline]
    pub fn get(&self) -> u32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_wraps() {
        let mut c = FrameCounter(u32::MAX);
        assert_eq!(c.advance(), 0);
        assert_eq!(c.advance(), 1);
    }

    #[test]
    fn default_style_blinks_four_on_four_off() {
        let style = IndicatorStyle::default();
        let pattern: Vec<bool> = (0..16).map(|t| style.visible_at(t)).collect();
        assert_eq!(&pattern[..8], &[true, true, true, true, false, false, false, false]);
        assert_eq!(&pattern[..8], &pattern[8..]);
    }

    #[test]
    fn zero_mask_is_always_visible() {
        let style = IndicatorStyle { blink_mask: 0, ..IndicatorStyle::default() };
        assert!((0..32).all(|t| style.visible_at(t)));
    }
}
