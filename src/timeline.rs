use crate::easing::Ease;

/// A scalar tween from `from` to `to`, starting after `delay` seconds
#[derive(Debug, Clone, PartialEq)]
pub struct Tween {
    pub from: f32,
    pub to: f32,
    pub delay: f32,
    pub duration: f32,
    pub ease: Ease,
    elapsed: f32,
}

impl Tween {
    pub fn new(from: f32, to: f32, duration: f32, ease: Ease) -> Self {
        Self {
            from,
            to,
            delay: 0.0,
            duration: duration.max(0.0),
            ease,
            elapsed: 0.0,
        }
    }

    pub fn with_delay(mut self, delay: f32) -> Self {
        self.delay = delay.max(0.0);
        self
    }

    /// Advance by `dt` seconds
    pub fn advance(&mut self, dt: f32) {
        self.elapsed += dt.max(0.0);
    }

    /// Eased progress at an arbitrary local time
    pub fn progress_at(&self, time: f32) -> f32 {
        let local = time - self.delay;
        if local <= 0.0 {
            return 0.0;
        }
        if self.duration <= 0.0 {
            return 1.0;
        }
        self.ease.apply(local / self.duration)
    }

    pub fn value_at(&self, time: f32) -> f32 {
        self.from + (self.to - self.from) * self.progress_at(time)
    }

    pub fn value(&self) -> f32 {
        self.value_at(self.elapsed)
    }

    /// Time at which the tween reaches `to`
    pub fn end_time(&self) -> f32 {
        self.delay + self.duration
    }

    pub fn is_complete(&self) -> bool {
        self.elapsed >= self.end_time()
    }
}

/// Fold `time` into a forward-then-backward sweep of length `period` (yoyo repeat)
pub fn ping_pong(time: f32, period: f32) -> f32 {
    if period <= 0.0 {
        return 0.0;
    }
    let folded = time.rem_euclid(2.0 * period);
    if folded <= period {
        folded
    } else {
        2.0 * period - folded
    }
}

/// Where a cycle timeline currently is
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CyclePosition {
    /// Step being tweened towards
    pub step: usize,
    /// Step the tween started from
    pub previous: usize,
    /// Eased progress through the current step (0..=1)
    pub progress: f32,
}

/// Infinite repeating sequence of equal-length steps.
///
/// Each step tweens from the previous step's value to its own; the first step of the very
/// first pass starts from itself. `advance` reports every step entry exactly once.
#[derive(Debug, Clone)]
pub struct CycleTimeline {
    steps: usize,
    step_duration: f32,
    ease: Ease,
    /// Time within the current pass, kept in `0..steps * step_duration`
    elapsed: f32,
    wrapped: bool,
    entered: Option<usize>,
    killed: bool,
}

impl CycleTimeline {
    pub fn new(steps: usize, step_duration: f32, ease: Ease) -> Self {
        Self {
            steps,
            step_duration: step_duration.max(0.0),
            ease,
            elapsed: 0.0,
            wrapped: false,
            entered: None,
            killed: false,
        }
    }

    fn period(&self) -> f32 {
        self.steps as f32 * self.step_duration
    }

    fn step_index(&self) -> usize {
        if self.step_duration <= 0.0 || self.steps == 0 {
            return 0;
        }
        ((self.elapsed / self.step_duration) as usize).min(self.steps - 1)
    }

    /// Advance by `dt` seconds. Returns the step just entered, if any.
    pub fn advance(&mut self, dt: f32) -> Option<usize> {
        if self.killed || self.steps == 0 {
            return None;
        }

        self.elapsed += dt.max(0.0);
        let period = self.period();
        if period > 0.0 && self.elapsed >= period {
            self.elapsed = self.elapsed.rem_euclid(period);
            self.wrapped = true;
            // A full pass may have gone by; re-entering the same index still counts.
            self.entered = None;
        }

        let step = self.step_index();
        if self.entered == Some(step) {
            return None;
        }
        self.entered = Some(step);
        Some(step)
    }

    pub fn position(&self) -> CyclePosition {
        let step = self.step_index();
        let previous = if step == 0 {
            if self.wrapped {
                self.steps.saturating_sub(1)
            } else {
                0
            }
        } else {
            step - 1
        };
        let progress = if self.step_duration > 0.0 {
            let into_step = self.elapsed - step as f32 * self.step_duration;
            self.ease.apply(into_step / self.step_duration)
        } else {
            1.0
        };
        CyclePosition {
            step,
            previous,
            progress,
        }
    }

    /// Change the step length, keeping the relative position inside the pass
    pub fn set_step_duration(&mut self, step_duration: f32) {
        let step_duration = step_duration.max(0.0);
        if self.step_duration > 0.0 {
            self.elapsed *= step_duration / self.step_duration;
        }
        self.step_duration = step_duration;
    }

    /// Halt the timeline. Further `advance` calls are no-ops.
    pub fn kill(&mut self) {
        self.killed = true;
    }

    #[cfg(test)]
    pub fn is_killed(&self) -> bool {
        self.killed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tween_delay_and_completion() {
        let mut tween = Tween::new(10.0, 20.0, 2.0, Ease::Linear).with_delay(1.0);
        assert_eq!(tween.value(), 10.0);
        tween.advance(1.0);
        assert_eq!(tween.value(), 10.0);
        tween.advance(1.0);
        assert!((tween.value() - 15.0).abs() < 1e-5);
        assert!(!tween.is_complete());
        tween.advance(5.0);
        assert_eq!(tween.value(), 20.0);
        assert!(tween.is_complete());
    }

    #[test]
    fn test_zero_duration_tween_jumps() {
        let tween = Tween::new(0.0, 1.0, 0.0, Ease::Power2Out);
        assert_eq!(tween.value_at(0.001), 1.0);
    }

    #[test]
    fn test_ping_pong() {
        assert_eq!(ping_pong(0.0, 4.0), 0.0);
        assert_eq!(ping_pong(3.0, 4.0), 3.0);
        assert_eq!(ping_pong(5.0, 4.0), 3.0);
        assert_eq!(ping_pong(8.0, 4.0), 0.0);
        assert_eq!(ping_pong(9.0, 4.0), 1.0);
        assert_eq!(ping_pong(1.0, 0.0), 0.0);
    }

    #[test]
    fn test_cycle_enters_first_step_immediately() {
        let mut cycle = CycleTimeline::new(4, 8.0, Ease::SineInOut);
        assert_eq!(cycle.advance(0.0), Some(0));
        assert_eq!(cycle.advance(1.0), None);
        let pos = cycle.position();
        assert_eq!(pos.step, 0);
        assert_eq!(pos.previous, 0);
    }

    #[test]
    fn test_cycle_steps_and_wraps() {
        let mut cycle = CycleTimeline::new(3, 5.0, Ease::Linear);
        assert_eq!(cycle.advance(0.0), Some(0));
        assert_eq!(cycle.advance(5.0), Some(1));
        assert_eq!(cycle.advance(2.5), None);
        let pos = cycle.position();
        assert_eq!((pos.step, pos.previous), (1, 0));
        assert!((pos.progress - 0.5).abs() < 1e-5);
        assert_eq!(cycle.advance(2.5), Some(2));
        assert_eq!(cycle.advance(5.0), Some(0));
        // Second pass: step 0 morphs from the last step
        assert_eq!(cycle.position().previous, 2);
    }

    #[test]
    fn test_cycle_reports_same_index_after_full_pass() {
        let mut cycle = CycleTimeline::new(2, 1.0, Ease::Linear);
        assert_eq!(cycle.advance(0.5), Some(0));
        assert_eq!(cycle.advance(2.0), Some(0));
    }

    #[test]
    fn test_killed_cycle_is_inert() {
        let mut cycle = CycleTimeline::new(4, 8.0, Ease::Linear);
        cycle.advance(0.0);
        cycle.kill();
        cycle.kill();
        assert!(cycle.is_killed());
        assert_eq!(cycle.advance(100.0), None);
        assert_eq!(cycle.position().step, 0);
    }

    #[test]
    fn test_empty_cycle_never_fires() {
        let mut cycle = CycleTimeline::new(0, 8.0, Ease::Linear);
        assert_eq!(cycle.advance(10.0), None);
    }

    #[test]
    fn test_set_step_duration_keeps_relative_position() {
        let mut cycle = CycleTimeline::new(4, 8.0, Ease::Linear);
        cycle.advance(0.0);
        cycle.advance(12.0);
        cycle.set_step_duration(4.0);
        let pos = cycle.position();
        assert_eq!(pos.step, 1);
        assert!((pos.progress - 0.5).abs() < 1e-5);
        assert_eq!(cycle.step_duration, 4.0);
    }
}
