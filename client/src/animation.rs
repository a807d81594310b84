//! The animation primitive the movement scheduler drives.
//!
//! The scheduler only needs a small surface: start an offset interpolation,
//! poll it once per frame, and occasionally stop it or stretch its duration
//! when the server's timing disagrees with the prediction.

/// What happened during one animation update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AnimationTick {
    /// Current interpolated offset, present while the animation advanced
    /// this frame (including the final frame).
    pub position: Option<(i32, i32, i32)>,
    /// Set on the frame the animation ran to completion.
    pub finished: bool,
}

/// A move animation between two display offsets.
///
/// `stop` halts immediately and does not produce a completion tick; callers
/// that cancel an animation perform their own cleanup.
pub trait MoveAnimation {
    fn start(&mut self, from: (i32, i32, i32), to: (i32, i32, i32), duration_ms: u32);
    fn stop(&mut self);
    fn is_running(&self) -> bool;
    fn duration(&self) -> u32;
    /// Changes the total duration while keeping the elapsed time, which
    /// speeds up or slows down the remainder without restarting.
    fn set_duration(&mut self, duration_ms: u32);
    fn time_remaining(&self) -> u32;
    fn update(&mut self, delta_ms: u32) -> AnimationTick;
}

/// Linear interpolation between two display offsets over a fixed duration.
#[derive(Debug, Default)]
pub struct OffsetAnimation {
    running: bool,
    duration: u32,
    elapsed: u32,
    from: (i32, i32, i32),
    to: (i32, i32, i32),
}

impl OffsetAnimation {
    pub fn new() -> Self {
        OffsetAnimation::default()
    }

    fn offset_at(&self, elapsed: u32) -> (i32, i32, i32) {
        if self.duration == 0 || elapsed >= self.duration {
            return self.to;
        }
        let t = elapsed as f32 / self.duration as f32;
        let lerp = |a: i32, b: i32| a + ((b - a) as f32 * t) as i32;
        (
            lerp(self.from.0, self.to.0),
            lerp(self.from.1, self.to.1),
            lerp(self.from.2, self.to.2),
        )
    }
}

impl MoveAnimation for OffsetAnimation {
    fn start(&mut self, from: (i32, i32, i32), to: (i32, i32, i32), duration_ms: u32) {
        self.from = from;
        self.to = to;
        self.duration = duration_ms;
        self.elapsed = 0;
        self.running = true;
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn duration(&self) -> u32 {
        self.duration
    }

    fn set_duration(&mut self, duration_ms: u32) {
        self.duration = duration_ms;
    }

    fn time_remaining(&self) -> u32 {
        self.duration.saturating_sub(self.elapsed)
    }

    fn update(&mut self, delta_ms: u32) -> AnimationTick {
        if !self.running {
            return AnimationTick::default();
        }
        self.elapsed = self.elapsed.saturating_add(delta_ms);
        if self.elapsed >= self.duration {
            self.running = false;
            AnimationTick {
                position: Some(self.to),
                finished: true,
            }
        } else {
            AnimationTick {
                position: Some(self.offset_at(self.elapsed)),
                finished: false,
            }
        }
    }
}
