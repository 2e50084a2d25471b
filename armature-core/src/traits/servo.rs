//! Servo output trait

/// Sink for physical joint angles
///
/// Writes are fire-and-forget: the arm is open-loop and assumes the
/// commanded angle is reached.
pub trait ServoOutput {
    /// Drive one channel to an absolute angle in degrees (0-180)
    fn write(&mut self, joint: usize, physical_deg: u8);
}

impl<T: ServoOutput + ?Sized> ServoOutput for &mut T {
    fn write(&mut self, joint: usize, physical_deg: u8) {
        (**self).write(joint, physical_deg)
    }
}
