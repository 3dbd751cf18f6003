use crate::core::error::ConfigError;

const Y_TOLERANCE_RANGE: (f64, f64) = (0.1, 1.0);
const X_TOLERANCE_FACTOR_RANGE: (f64, f64) = (0.5, 3.0);
const FRAGMENT_TEXT_THRESHOLD_RANGE: (f64, f64) = (1.0, 10.0);

/// Sensitivity knobs for a merge call.
///
/// Every instance is range-checked at construction, so the merge pipeline never
/// sees an invalid value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergingConfig {
    y_tolerance: f32,
    x_tolerance_factor: f32,
    enable_smart_clustering: bool,
    enable_second_pass: bool,
    fragment_text_threshold: usize,
}

impl MergingConfig {
    pub fn new(
        y_tolerance: f32,
        x_tolerance_factor: f32,
        enable_smart_clustering: bool,
        enable_second_pass: bool,
        fragment_text_threshold: usize,
    ) -> Result<Self, ConfigError> {
        validate_finite(y_tolerance, "y_tolerance")?;
        validate_range(y_tolerance.into(), Y_TOLERANCE_RANGE, "y_tolerance")?;
        validate_finite(x_tolerance_factor, "x_tolerance_factor")?;
        validate_range(
            x_tolerance_factor.into(),
            X_TOLERANCE_FACTOR_RANGE,
            "x_tolerance_factor",
        )?;
        validate_range(
            fragment_text_threshold as f64,
            FRAGMENT_TEXT_THRESHOLD_RANGE,
            "fragment_text_threshold",
        )?;

        Ok(Self {
            y_tolerance,
            x_tolerance_factor,
            enable_smart_clustering,
            enable_second_pass,
            fragment_text_threshold,
        })
    }

    /// Row clustering tolerance, as a fraction of the mean detection height.
    pub fn y_tolerance(&self) -> f32 {
        self.y_tolerance
    }

    /// Fixed within-row merge tolerance, as a multiple of the mean box width.
    pub fn x_tolerance_factor(&self) -> f32 {
        self.x_tolerance_factor
    }

    pub fn enable_smart_clustering(&self) -> bool {
        self.enable_smart_clustering
    }

    pub fn enable_second_pass(&self) -> bool {
        self.enable_second_pass
    }

    /// Maximum character count for a merged unit to count as a fragment.
    pub fn fragment_text_threshold(&self) -> usize {
        self.fragment_text_threshold
    }
}

impl Default for MergingConfig {
    fn default() -> Self {
        Self {
            y_tolerance: 0.4,
            x_tolerance_factor: 1.5,
            enable_smart_clustering: true,
            enable_second_pass: true,
            fragment_text_threshold: 2,
        }
    }
}

/// Prebuilt configurations for common kinds of source material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePreset {
    #[default]
    Default,
    /// Comics and game screens: loose lettering, speech bubbles.
    Comic,
    /// Dense printed documents.
    Document,
}

impl MergePreset {
    pub fn config(self) -> MergingConfig {
        match self {
            MergePreset::Default => MergingConfig::default(),
            MergePreset::Comic => MergingConfig {
                y_tolerance: 0.6,
                x_tolerance_factor: 2.0,
                enable_smart_clustering: true,
                enable_second_pass: true,
                fragment_text_threshold: 3,
            },
            MergePreset::Document => MergingConfig {
                y_tolerance: 0.3,
                x_tolerance_factor: 1.0,
                enable_smart_clustering: true,
                enable_second_pass: false,
                fragment_text_threshold: 1,
            },
        }
    }
}

impl From<MergePreset> for MergingConfig {
    fn from(preset: MergePreset) -> Self {
        preset.config()
    }
}

fn validate_finite(value: f32, field: &'static str) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NonFinite {
            field,
            value: value as f64,
        });
    }
    Ok(())
}

fn validate_range(value: f64, (min, max): (f64, f64), field: &'static str) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            field,
            min,
            max,
            value,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_is_valid() {
        let d = MergingConfig::default();
        let rebuilt = MergingConfig::new(
            d.y_tolerance(),
            d.x_tolerance_factor(),
            d.enable_smart_clustering(),
            d.enable_second_pass(),
            d.fragment_text_threshold(),
        );
        assert_eq!(rebuilt, Ok(d));
    }

    #[test]
    fn presets_pass_validation() {
        for preset in [MergePreset::Default, MergePreset::Comic, MergePreset::Document] {
            let c = preset.config();
            assert!(MergingConfig::new(
                c.y_tolerance(),
                c.x_tolerance_factor(),
                c.enable_smart_clustering(),
                c.enable_second_pass(),
                c.fragment_text_threshold(),
            )
            .is_ok());
        }
    }

    #[test]
    fn rejects_out_of_range_y_tolerance() {
        let err = MergingConfig::new(1.5, 1.5, true, true, 2).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::OutOfRange {
                field: "y_tolerance",
                ..
            }
        ));
    }

    #[test]
    fn rejects_out_of_range_x_factor_and_fragment_threshold() {
        assert!(matches!(
            MergingConfig::new(0.4, 0.2, true, true, 2),
            Err(ConfigError::OutOfRange {
                field: "x_tolerance_factor",
                ..
            })
        ));
        assert!(matches!(
            MergingConfig::new(0.4, 1.5, true, true, 0),
            Err(ConfigError::OutOfRange {
                field: "fragment_text_threshold",
                ..
            })
        ));
        assert!(matches!(
            MergingConfig::new(0.4, 1.5, true, true, 11),
            Err(ConfigError::OutOfRange {
                field: "fragment_text_threshold",
                ..
            })
        ));
    }

    #[test]
    fn rejects_nan_instead_of_clamping() {
        assert!(matches!(
            MergingConfig::new(f32::NAN, 1.5, true, true, 2),
            Err(ConfigError::NonFinite {
                field: "y_tolerance",
                ..
            })
        ));
    }

    #[test]
    fn accepts_range_bounds() {
        assert!(MergingConfig::new(0.1, 0.5, false, false, 1).is_ok());
        assert!(MergingConfig::new(1.0, 3.0, true, true, 10).is_ok());
    }
}
