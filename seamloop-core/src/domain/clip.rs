//! Source clip metadata

/// Measured properties of a source clip
///
/// Derived once per job from the duration probe. The duration is always
/// finite and strictly positive; there is no way to build one otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipMetadata {
    duration_seconds: f64,
}

impl ClipMetadata {
    /// Returns `None` unless `duration_seconds` is finite and > 0
    pub fn from_duration(duration_seconds: f64) -> Option<Self> {
        (duration_seconds.is_finite() && duration_seconds > 0.0)
            .then_some(Self { duration_seconds })
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_duration_accepts_positive() {
        let clip = ClipMetadata::from_duration(4.2).unwrap();
        assert_eq!(clip.duration_seconds(), 4.2);
    }

    #[test]
    fn test_from_duration_rejects_invalid() {
        assert!(ClipMetadata::from_duration(0.0).is_none());
        assert!(ClipMetadata::from_duration(-1.0).is_none());
        assert!(ClipMetadata::from_duration(f64::NAN).is_none());
        assert!(ClipMetadata::from_duration(f64::INFINITY).is_none());
    }
}
