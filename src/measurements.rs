//! Slider model for the four flower measurements.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One snapshot of the four sliders, in centimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurements {
    pub sepal_length: f64,
    pub sepal_width: f64,
    pub petal_length: f64,
    pub petal_width: f64,
}

impl Measurements {
    pub fn as_array(&self) -> [f64; 4] {
        [self.sepal_length, self.sepal_width, self.petal_length, self.petal_width]
    }

    pub fn get(&self, feature: Feature) -> f64 {
        match feature {
            Feature::SepalLength => self.sepal_length,
            Feature::SepalWidth => self.sepal_width,
            Feature::PetalLength => self.petal_length,
            Feature::PetalWidth => self.petal_width,
        }
    }

    /// Canonical text form, used for log fingerprints.
    pub fn key(&self) -> String {
        format!(
            "{:.1},{:.1},{:.1},{:.1}",
            self.sepal_length, self.sepal_width, self.petal_length, self.petal_width
        )
    }
}

impl Default for Measurements {
    fn default() -> Self {
        Self {
            sepal_length: 5.0,
            sepal_width: 3.0,
            petal_length: 1.0,
            petal_width: 0.2,
        }
    }
}

impl fmt::Display for Measurements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SL {:.1}  SW {:.1}  PL {:.1}  PW {:.1}",
            self.sepal_length, self.sepal_width, self.petal_length, self.petal_width
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    SepalLength,
    SepalWidth,
    PetalLength,
    PetalWidth,
}

impl Feature {
    pub const ALL: [Feature; 4] = [
        Feature::SepalLength,
        Feature::SepalWidth,
        Feature::PetalLength,
        Feature::PetalWidth,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Feature::SepalLength => "sl",
            Feature::SepalWidth => "sw",
            Feature::PetalLength => "pl",
            Feature::PetalWidth => "pw",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Feature::SepalLength => "sepal_length",
            Feature::SepalWidth => "sepal_width",
            Feature::PetalLength => "petal_length",
            Feature::PetalWidth => "petal_width",
        }
    }

    /// Slider bounds (min, max).
    pub fn range(&self) -> (f64, f64) {
        match self {
            Feature::SepalLength => (4.0, 8.0),
            Feature::SepalWidth => (2.0, 4.5),
            Feature::PetalLength => (1.0, 7.0),
            Feature::PetalWidth => (0.1, 2.5),
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim().to_lowercase();
        Feature::ALL
            .into_iter()
            .find(|f| f.key() == raw || f.name() == raw)
            .ok_or_else(|| anyhow!("unknown slider {:?} (expected sl, sw, pl or pw)", raw))
    }
}

pub const SLIDER_STEP: f64 = 0.1;

/// Current slider positions. Values are always inside their range and on
/// the step grid.
#[derive(Debug, Clone, Default)]
pub struct Sliders {
    current: Measurements,
}

impl Sliders {
    /// Sliders positioned at `initial`, clamped and snapped. Fails on a
    /// non-finite value.
    pub fn new(initial: Measurements) -> Result<Self> {
        let mut sliders = Self::default();
        for feature in Feature::ALL {
            sliders.set(feature, initial.get(feature))?;
        }
        Ok(sliders)
    }

    /// Moves one slider and returns the stored value.
    pub fn set(&mut self, feature: Feature, value: f64) -> Result<f64> {
        if !value.is_finite() {
            return Err(anyhow!("{} must be a finite number, got {}", feature.name(), value));
        }
        let (lo, hi) = feature.range();
        let steps_per_unit = (1.0 / SLIDER_STEP).round();
        let snapped = (value.clamp(lo, hi) * steps_per_unit).round() / steps_per_unit;
        let slot = match feature {
            Feature::SepalLength => &mut self.current.sepal_length,
            Feature::SepalWidth => &mut self.current.sepal_width,
            Feature::PetalLength => &mut self.current.petal_length,
            Feature::PetalWidth => &mut self.current.petal_width,
        };
        *slot = snapped;
        Ok(snapped)
    }

    /// Applies every change or none of them.
    pub fn apply(&mut self, changes: &[(Feature, f64)]) -> Result<()> {
        let mut next = self.clone();
        for (feature, value) in changes {
            next.set(*feature, *value)?;
        }
        *self = next;
        Ok(())
    }

    pub fn snapshot(&self) -> Measurements {
        self.current
    }

    /// Slider value labels, one decimal each.
    pub fn display(&self) -> [(Feature, String); 4] {
        Feature::ALL.map(|f| (f, format!("{:.1}", self.current.get(f))))
    }
}

/// Parses a line of slider assignments: `sl 5.1`, `sl=5.1`, or several
/// `key=value` pairs separated by whitespace.
pub fn parse_assignments(line: &str) -> Result<Vec<(Feature, f64)>> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() == 2 && !tokens[0].contains('=') {
        let feature = Feature::parse(tokens[0])?;
        return Ok(vec![(feature, parse_value(feature, tokens[1])?)]);
    }
    if tokens.is_empty() {
        return Err(anyhow!("empty slider assignment"));
    }
    tokens
        .iter()
        .map(|tok| {
            let (key, value) = tok
                .split_once('=')
                .ok_or_else(|| anyhow!("expected key=value, got {:?}", tok))?;
            let feature = Feature::parse(key)?;
            Ok((feature, parse_value(feature, value)?))
        })
        .collect()
}

fn parse_value(feature: Feature, raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .map_err(|e| anyhow!("bad value {:?} for {}: {}", raw, feature.name(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_clamps_to_range() {
        let mut s = Sliders::default();
        assert_eq!(s.set(Feature::PetalWidth, 9.0).unwrap(), 2.5);
        assert_eq!(s.set(Feature::SepalLength, 1.0).unwrap(), 4.0);
    }

    #[test]
    fn test_set_snaps_to_step() {
        let mut s = Sliders::default();
        assert_eq!(s.set(Feature::PetalLength, 4.26).unwrap(), 4.3);
        assert_eq!(s.set(Feature::SepalWidth, 3.04).unwrap(), 3.0);
        assert_eq!(s.snapshot().petal_length, 4.3);
    }

    #[test]
    fn test_set_rejects_non_finite() {
        let mut s = Sliders::default();
        assert!(s.set(Feature::SepalLength, f64::NAN).is_err());
        assert!(s.set(Feature::SepalLength, f64::INFINITY).is_err());
        assert_eq!(s.snapshot().sepal_length, 5.0);
    }

    #[test]
    fn test_new_rejects_non_finite() {
        let initial = Measurements {
            petal_width: f64::NAN,
            ..Measurements::default()
        };
        assert!(Sliders::new(initial).is_err());
        let clamped = Sliders::new(Measurements {
            sepal_length: 9.3,
            ..Measurements::default()
        })
        .unwrap();
        assert_eq!(clamped.snapshot().sepal_length, 8.0);
    }

    #[test]
    fn test_apply_is_all_or_nothing() {
        let mut s = Sliders::default();
        let err = s.apply(&[(Feature::SepalLength, 7.0), (Feature::PetalWidth, f64::NAN)]);
        assert!(err.is_err());
        assert_eq!(s.snapshot(), Measurements::default());

        s.apply(&[(Feature::SepalLength, 7.0), (Feature::PetalWidth, 1.5)]).unwrap();
        assert_eq!(s.snapshot().sepal_length, 7.0);
        assert_eq!(s.snapshot().petal_width, 1.5);
    }

    #[test]
    fn test_display_one_decimal() {
        let s = Sliders::new(Measurements {
            sepal_length: 5.1,
            sepal_width: 3.5,
            petal_length: 1.4,
            petal_width: 0.2,
        })
        .unwrap();
        let labels: Vec<String> = s.display().into_iter().map(|(_, v)| v).collect();
        assert_eq!(labels, vec!["5.1", "3.5", "1.4", "0.2"]);
    }

    #[test]
    fn test_parse_space_form() {
        let changes = parse_assignments("pl 4.5").unwrap();
        assert_eq!(changes, vec![(Feature::PetalLength, 4.5)]);
    }

    #[test]
    fn test_parse_multiple_pairs() {
        let changes = parse_assignments("sl=6.3 petal_width=1.8").unwrap();
        assert_eq!(
            changes,
            vec![(Feature::SepalLength, 6.3), (Feature::PetalWidth, 1.8)]
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_assignments("").is_err());
        assert!(parse_assignments("xx=1.0").is_err());
        assert!(parse_assignments("sl=abc").is_err());
        assert!(parse_assignments("sl 1 pw").is_err());
    }

    #[test]
    fn test_measurements_key() {
        assert_eq!(Measurements::default().key(), "5.0,3.0,1.0,0.2");
    }
}
