//! Haptic feedback seam. The device buzzes short when work ends and long
//! when the break ends; the host build just logs.

use interval_core::Vibe;

pub trait Haptics {
    fn vibrate(&mut self, pattern: Vibe);
}

pub struct LogHaptics;

impl Haptics for LogHaptics {
    fn vibrate(&mut self, pattern: Vibe) {
        log::info!("vibration: {:?}", pattern);
    }
}
