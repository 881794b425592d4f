//! Frame clock and per-frame effect context.
//!
//! The render loop samples [`FrameClock`] once per frame and snapshots the
//! current [`RotationSpeed`] into a [`FrameContext`]. That context is the only
//! thing the passes see, so every consumer within a frame reads the same time.

use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};
use std::time::Instant;

use super::sway::SwayParams;

/// A sampled frame time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    /// Seconds since the clock started.
    pub seconds: f32,
    /// Number of frames sampled so far, starting at 1.
    pub frame: u64,
}

/// Monotonic elapsed-time source for the render loop.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    last: f32,
    frames: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            last: 0.0,
            frames: 0,
        }
    }

    /// Samples the clock for a new frame.
    pub fn tick(&mut self) -> FrameTime {
        let now = self.start.elapsed().as_secs_f32();
        self.sample(now)
    }

    /// Seconds as of the last tick, without advancing.
    pub fn elapsed(&self) -> f32 {
        self.last
    }

    fn sample(&mut self, seconds: f32) -> FrameTime {
        // Never go backwards, even if the caller feeds an older reading.
        self.last = seconds.max(self.last);
        self.frames += 1;
        FrameTime {
            seconds: self.last,
            frame: self.frames,
        }
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared, externally tunable rotation speed.
///
/// Cloning hands out another handle to the same value. Writers (keyboard
/// bindings, configuration) call [`RotationSpeed::set`]; the render loop reads
/// it once per frame.
#[derive(Debug, Clone)]
pub struct RotationSpeed(Arc<AtomicU32>);

impl RotationSpeed {
    pub const DEFAULT: f32 = 0.4;

    pub fn new(value: f32) -> Self {
        Self(Arc::new(AtomicU32::new(value.to_bits())))
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub fn set(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }

    /// Adds `delta` and returns the new value.
    pub fn adjust(&self, delta: f32) -> f32 {
        let value = self.get() + delta;
        self.set(value);
        value
    }
}

impl Default for RotationSpeed {
    fn default() -> Self {
        Self::new(Self::DEFAULT)
    }
}

/// Everything the effect reads during one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameContext {
    pub time: FrameTime,
    pub rotation_speed: f32,
}

impl FrameContext {
    pub fn new(time: FrameTime, rotation_speed: &RotationSpeed) -> Self {
        Self {
            time,
            rotation_speed: rotation_speed.get(),
        }
    }

    pub fn sway_params(&self) -> SwayParams {
        SwayParams::new(self.time.seconds, self.rotation_speed)
    }

    pub fn uniform(&self) -> SwayUniform {
        SwayUniform::new(self.sway_params())
    }
}

/// GPU layout of the sway parameters. MUST match `SwayUniforms` in the WGSL.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SwayUniform {
    pub time: f32,
    pub rotation_speed: f32,
    _padding: [f32; 2],
}

impl SwayUniform {
    pub fn new(params: SwayParams) -> Self {
        Self {
            time: params.time,
            rotation_speed: params.rotation_speed,
            _padding: [0.0; 2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::sway::rotation_angle;

    #[test]
    fn test_clock_is_monotonic() {
        let mut clock = FrameClock::new();
        let a = clock.sample(1.5);
        let b = clock.sample(0.5);
        let c = clock.sample(2.0);
        assert_eq!(a.seconds, 1.5);
        assert_eq!(b.seconds, 1.5);
        assert_eq!(c.seconds, 2.0);
        assert_eq!((a.frame, b.frame, c.frame), (1, 2, 3));
        assert_eq!(clock.elapsed(), 2.0);
    }

    #[test]
    fn test_tick_advances() {
        let mut clock = FrameClock::new();
        let first = clock.tick();
        let second = clock.tick();
        assert!(second.seconds >= first.seconds);
        assert_eq!(second.frame, first.frame + 1);
    }

    #[test]
    fn test_rotation_speed_handles_share_value() {
        let speed = RotationSpeed::default();
        let handle = speed.clone();
        assert_eq!(speed.get(), 0.4);

        handle.set(1.25);
        assert_eq!(speed.get(), 1.25);
        assert_eq!(speed.adjust(-0.25), 1.0);
        assert_eq!(handle.get(), 1.0);
    }

    #[test]
    fn test_speed_change_applies_to_later_frames_only() {
        let mut clock = FrameClock::new();
        let speed = RotationSpeed::new(0.4);

        let first = FrameContext::new(clock.sample(1.0), &speed);
        speed.set(0.8);
        let second = FrameContext::new(clock.sample(1.0), &speed);

        assert_eq!(first.rotation_speed, 0.4);
        assert_eq!(second.rotation_speed, 0.8);

        let y = 0.3;
        let a = rotation_angle(y, first.time.seconds, first.rotation_speed);
        let b = rotation_angle(y, second.time.seconds, second.rotation_speed);
        assert_eq!(b, a * 2.0);
    }

    #[test]
    fn test_uniform_layout() {
        assert_eq!(std::mem::size_of::<SwayUniform>(), 16);
        let ctx = FrameContext {
            time: FrameTime {
                seconds: 3.0,
                frame: 7,
            },
            rotation_speed: 0.4,
        };
        let uniform = ctx.uniform();
        assert_eq!(uniform.time, 3.0);
        assert_eq!(uniform.rotation_speed, 0.4);
    }
}
