//! Loop schedule planner
//!
//! Pure computation of how many repetitions to stitch, how long each
//! crossfade lasts, where the transitions sit on the output timeline and how
//! long the result is.

use thiserror::Error;

use crate::domain::schedule::LoopSchedule;

/// Fewest repetitions that still contain a transition
pub const MIN_LOOPS: u32 = 2;

/// Largest share of one repetition a single crossfade may consume
pub const MAX_FADE_SHARE: f64 = 0.25;

/// Clamp bounds applied to requested parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannerLimits {
    pub max_loops: u32,
    pub min_fade: f64,
    pub max_fade: f64,
}

impl Default for PlannerLimits {
    fn default() -> Self {
        Self {
            max_loops: 10,
            min_fade: 0.10,
            max_fade: 1.0,
        }
    }
}

impl PlannerLimits {
    pub fn validate(&self) -> Result<(), PlannerError> {
        if self.max_loops < MIN_LOOPS {
            return Err(PlannerError::InvalidLimits(format!(
                "max_loops must be at least {}",
                MIN_LOOPS
            )));
        }

        if !self.min_fade.is_finite() || self.min_fade <= 0.0 {
            return Err(PlannerError::InvalidLimits(
                "min_fade must be finite and positive".to_string(),
            ));
        }

        if !self.max_fade.is_finite() || self.max_fade < self.min_fade {
            return Err(PlannerError::InvalidLimits(
                "max_fade must be finite and not below min_fade".to_string(),
            ));
        }

        Ok(())
    }
}

/// Planner failure
///
/// Upstream validation makes these unreachable for well-formed input; seeing
/// one means a configuration bug or a clip too short to crossfade.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlannerError {
    #[error("clip duration must be finite and positive, got {0}")]
    InvalidClipDuration(f64),

    #[error("requested fade must be finite, got {0}")]
    InvalidFade(f64),

    #[error("invalid planner limits: {0}")]
    InvalidLimits(String),

    #[error("crossfade of {fade:.3}s does not fit inside a {clip:.3}s clip")]
    FadeExceedsClip { fade: f64, clip: f64 },

    #[error("computed total duration {0:.3}s is not positive")]
    NonPositiveTotal(f64),
}

/// Computes the crossfade schedule for a clip
///
/// `requested_loops` is clamped to `[MIN_LOOPS, limits.max_loops]` and
/// `requested_fade` to `[limits.min_fade, limits.max_fade]`. The fade is then
/// capped at a quarter of the clip (never below `min_fade`), which takes
/// precedence over the request.
pub fn plan(
    clip_duration: f64,
    requested_loops: i64,
    requested_fade: f64,
    limits: &PlannerLimits,
) -> Result<LoopSchedule, PlannerError> {
    limits.validate()?;

    if !clip_duration.is_finite() || clip_duration <= 0.0 {
        return Err(PlannerError::InvalidClipDuration(clip_duration));
    }

    if !requested_fade.is_finite() {
        return Err(PlannerError::InvalidFade(requested_fade));
    }

    let loops = requested_loops.clamp(i64::from(MIN_LOOPS), i64::from(limits.max_loops)) as u32;
    let fade_requested = requested_fade.clamp(limits.min_fade, limits.max_fade);
    let fade = fade_requested.min(limits.min_fade.max(clip_duration * MAX_FADE_SHARE));

    // Offsets only increase while each repetition outlasts its fade.
    if fade >= clip_duration {
        return Err(PlannerError::FadeExceedsClip {
            fade,
            clip: clip_duration,
        });
    }

    let offsets: Vec<f64> = (1..loops)
        .map(|i| {
            let i = f64::from(i);
            i * clip_duration - i * fade
        })
        .collect();

    let total_duration = clip_duration * f64::from(loops) - fade * f64::from(loops - 1);
    if total_duration <= 0.0 {
        return Err(PlannerError::NonPositiveTotal(total_duration));
    }

    Ok(LoopSchedule::new(
        clip_duration,
        loops,
        fade,
        offsets,
        total_duration,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPS: f64 = 1e-9;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < EPS
    }

    #[test]
    fn test_five_second_clip_three_loops() {
        let schedule = plan(5.0, 3, 0.35, &PlannerLimits::default()).unwrap();

        assert_eq!(schedule.loops(), 3);
        assert!(approx(schedule.fade_seconds(), 0.35));
        assert_eq!(schedule.offsets().len(), 2);
        assert!(approx(schedule.offsets()[0], 4.65));
        assert!(approx(schedule.offsets()[1], 9.30));
        assert!(approx(schedule.total_duration(), 14.30));
    }

    #[test]
    fn test_short_clip_caps_fade_at_quarter() {
        let schedule = plan(1.0, 2, 1.0, &PlannerLimits::default()).unwrap();

        assert_eq!(schedule.loops(), 2);
        assert!(approx(schedule.fade_seconds(), 0.25));
        assert_eq!(schedule.offsets().len(), 1);
        assert!(approx(schedule.offsets()[0], 0.75));
        assert!(approx(schedule.total_duration(), 1.75));
    }

    #[test]
    fn test_requests_are_clamped() {
        let schedule = plan(8.0, 20, 0.01, &PlannerLimits::default()).unwrap();
        assert_eq!(schedule.loops(), 10);
        assert!(approx(schedule.fade_seconds(), 0.10));

        let schedule = plan(8.0, -4, 3.0, &PlannerLimits::default()).unwrap();
        assert_eq!(schedule.loops(), 2);
        assert!(approx(schedule.fade_seconds(), 1.0));
    }

    #[test]
    fn test_quarter_rule_never_drops_below_min_fade() {
        // 0.2 * 0.25 = 0.05, raised back to the 0.10 floor
        let schedule = plan(0.2, 3, 0.5, &PlannerLimits::default()).unwrap();
        assert!(approx(schedule.fade_seconds(), 0.10));
    }

    #[test]
    fn test_rejects_non_positive_clip() {
        let limits = PlannerLimits::default();
        assert_eq!(
            plan(0.0, 3, 0.35, &limits),
            Err(PlannerError::InvalidClipDuration(0.0))
        );
        assert!(matches!(
            plan(-2.0, 3, 0.35, &limits),
            Err(PlannerError::InvalidClipDuration(_))
        ));
        assert!(matches!(
            plan(f64::NAN, 3, 0.35, &limits),
            Err(PlannerError::InvalidClipDuration(_))
        ));
    }

    #[test]
    fn test_rejects_non_finite_fade() {
        assert!(matches!(
            plan(5.0, 3, f64::NAN, &PlannerLimits::default()),
            Err(PlannerError::InvalidFade(_))
        ));
    }

    #[test]
    fn test_rejects_clip_shorter_than_min_fade() {
        assert!(matches!(
            plan(0.08, 3, 0.35, &PlannerLimits::default()),
            Err(PlannerError::FadeExceedsClip { .. })
        ));
    }

    #[test]
    fn test_rejects_invalid_limits() {
        let limits = PlannerLimits {
            max_loops: 1,
            ..PlannerLimits::default()
        };
        assert!(matches!(
            plan(5.0, 3, 0.35, &limits),
            Err(PlannerError::InvalidLimits(_))
        ));

        let limits = PlannerLimits {
            min_fade: 0.5,
            max_fade: 0.2,
            ..PlannerLimits::default()
        };
        assert!(limits.validate().is_err());
    }

    #[test]
    fn test_plan_is_deterministic() {
        let limits = PlannerLimits::default();
        assert_eq!(plan(3.7, 6, 0.4, &limits), plan(3.7, 6, 0.4, &limits));
    }

    proptest! {
        #[test]
        fn prop_schedule_invariants(
            clip in 0.11f64..600.0,
            loops in 2i64..=10,
            fade in 0.10f64..=1.0,
        ) {
            let schedule = plan(clip, loops, fade, &PlannerLimits::default()).unwrap();

            let expected_fade = fade.min(0.10f64.max(clip * 0.25));
            prop_assert!(approx(schedule.fade_seconds(), expected_fade));
            prop_assert!(schedule.fade_seconds() < clip);

            prop_assert_eq!(schedule.offsets().len() as i64, loops - 1);
            for pair in schedule.offsets().windows(2) {
                prop_assert!(pair[0] < pair[1]);
            }

            let expected_total =
                clip * loops as f64 - schedule.fade_seconds() * (loops - 1) as f64;
            prop_assert!((schedule.total_duration() - expected_total).abs() < 1e-6);
            prop_assert!(schedule.total_duration() > 0.0);
        }

        #[test]
        fn prop_clamped_loops_stay_in_range(requested in any::<i64>()) {
            let schedule = plan(5.0, requested, 0.35, &PlannerLimits::default()).unwrap();
            prop_assert!((MIN_LOOPS..=10).contains(&schedule.loops()));
        }
    }
}
