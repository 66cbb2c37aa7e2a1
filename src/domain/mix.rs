//! Headroom-limited mixing arithmetic
//!
//! Pure sample math for the mixdown engine: a fixed decibel cut applied to
//! every contributor, then saturating summation per channel. Keeping this
//! free of I/O makes the numeric edge cases directly testable.

/// Default cut applied to every contributing sample, in decibels.
pub const DEFAULT_ATTENUATION_DB: f64 = 3.0;

/// One stereo sample frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StereoSample {
    pub left: i16,
    pub right: i16,
}

impl StereoSample {
    pub const SILENCE: Self = Self { left: 0, right: 0 };

    pub const fn new(left: i16, right: i16) -> Self {
        Self { left, right }
    }
}

/// Fixed gain reduction expressed as a linear factor.
///
/// Built from a positive decibel value: `from_db(3.0)` is a 3 dB cut, factor
/// `10^(-3/20)` ≈ 0.708. Zero decibels is the identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attenuation {
    factor: f64,
}

impl Attenuation {
    pub fn from_db(db: f64) -> Self {
        Self {
            factor: 10f64.powf(-db / 20.0),
        }
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Scale one sample, rounding to the nearest integer value.
    pub fn apply(&self, sample: i16) -> i16 {
        (f64::from(sample) * self.factor).round() as i16
    }
}

impl Default for Attenuation {
    fn default() -> Self {
        Self::from_db(DEFAULT_ATTENUATION_DB)
    }
}

/// Saturating accumulate of one channel value.
///
/// The first value folded into an empty (zero) accumulator is taken as-is.
/// Every later add checks the remaining headroom toward the extreme in the
/// new value's sign direction and clamps instead of wrapping.
pub fn peak_limited_add(acc: i16, value: i16) -> i16 {
    if acc == 0 {
        return value;
    }
    if acc > 0 {
        if i16::MAX - acc < value {
            return i16::MAX;
        }
    } else if i16::MIN - acc > value {
        return i16::MIN;
    }
    acc + value
}

/// Combine one lockstep round of per-track contributions into a single
/// output sample frame.
///
/// An empty round is silence and a one-track round passes through at full
/// level; with two or more tracks every contribution is attenuated before the
/// saturating sum. Finished tracks appear as explicit silence contributions,
/// so a round's width never changes mid-mix.
pub fn mix_round(contributions: &[StereoSample], attenuation: Attenuation) -> StereoSample {
    match contributions {
        [] => StereoSample::SILENCE,
        [only] => *only,
        many => many.iter().fold(StereoSample::SILENCE, |acc, sample| {
            StereoSample::new(
                peak_limited_add(acc.left, attenuation.apply(sample.left)),
                peak_limited_add(acc.right, attenuation.apply(sample.right)),
            )
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_attenuation_is_a_3_db_cut() {
        let att = Attenuation::default();
        assert!((att.factor() - 0.7079457843841379).abs() < 1e-12);
    }

    #[test]
    fn zero_db_is_identity() {
        let att = Attenuation::from_db(0.0);
        assert_eq!(att.apply(i16::MAX), i16::MAX);
        assert_eq!(att.apply(-1234), -1234);
    }

    #[test]
    fn apply_rounds_to_nearest() {
        let att = Attenuation::from_db(3.0);
        assert_eq!(att.apply(1000), 708);
        assert_eq!(att.apply(-1000), -708);
    }

    #[test]
    fn first_value_is_taken_as_is() {
        assert_eq!(peak_limited_add(0, 12345), 12345);
        assert_eq!(peak_limited_add(0, i16::MIN), i16::MIN);
    }

    #[test]
    fn adds_when_headroom_remains() {
        assert_eq!(peak_limited_add(100, -250), -150);
        assert_eq!(peak_limited_add(-4000, 500), -3500);
    }

    #[test]
    fn clamps_at_positive_extreme() {
        assert_eq!(peak_limited_add(i16::MAX, 1), i16::MAX);
        assert_eq!(peak_limited_add(30_000, 10_000), i16::MAX);
    }

    #[test]
    fn clamps_at_negative_extreme() {
        assert_eq!(peak_limited_add(-30_000, -10_000), i16::MIN);
        assert_eq!(peak_limited_add(i16::MIN, -1), i16::MIN);
    }

    #[test]
    fn empty_round_is_silence() {
        assert_eq!(
            mix_round(&[], Attenuation::default()),
            StereoSample::SILENCE
        );
    }

    #[test]
    fn single_track_round_passes_through_at_full_level() {
        let sample = StereoSample::new(9000, -9000);
        assert_eq!(mix_round(&[sample], Attenuation::default()), sample);
    }

    #[test]
    fn two_track_round_sums_attenuated_values() {
        let att = Attenuation::from_db(3.0);
        let mixed = mix_round(
            &[StereoSample::new(1000, 0), StereoSample::new(2000, -1000)],
            att,
        );
        assert_eq!(mixed.left, 708 + 1416);
        assert_eq!(mixed.right, -708);
    }

    #[test]
    fn finished_track_contributes_exact_silence() {
        let att = Attenuation::from_db(3.0);
        let mixed = mix_round(
            &[StereoSample::SILENCE, StereoSample::new(1000, 1000)],
            att,
        );
        assert_eq!(mixed, StereoSample::new(708, 708));
    }

    #[test]
    fn simultaneous_peaks_clamp_instead_of_wrapping() {
        let att = Attenuation::from_db(0.0);
        let mixed = mix_round(
            &[
                StereoSample::new(i16::MAX, i16::MAX),
                StereoSample::new(i16::MAX, i16::MAX),
            ],
            att,
        );
        assert_eq!(mixed, StereoSample::new(i16::MAX, i16::MAX));
    }
}
