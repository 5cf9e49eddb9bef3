//! Indirect influence decaying with distance from the direct band.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::fieldgraph::spec::FieldGraphSpec;
use crate::fieldgraph::{FieldId, NodeSpec};

/// Decay applied to one class of categories.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClassDecay {
    /// Negative decay constant per world unit.
    pub constant: f32,
    /// Indirect strength as a fraction of the category weight.
    pub ratio: f32,
}

impl ClassDecay {
    pub const MOTORIZED: ClassDecay = ClassDecay {
        constant: -0.0003,
        ratio: 0.5,
    };

    pub const NON_MOTORIZED: ClassDecay = ClassDecay {
        constant: -0.0004,
        ratio: 0.5,
    };

    pub fn new(constant: f32, ratio: f32) -> Self {
        Self { constant, ratio }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.constant.is_finite() || self.constant >= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "decay constant must be negative, got {}",
                self.constant
            )));
        }
        if !self.ratio.is_finite() || self.ratio <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "indirect ratio must be positive, got {}",
                self.ratio
            )));
        }
        Ok(())
    }
}

pub fn indirect_field(key: &str) -> FieldId {
    format!("indirect/{key}")
}

/// Adds `exp(k * d) * weight * ratio` measured from the non-zero cells of `direct`,
/// masked beyond `cutoff`, and returns the indirect field id.
pub fn add_indirect_field(
    spec: &mut FieldGraphSpec,
    key: &str,
    weight: f32,
    direct: FieldId,
    cutoff: f32,
    decay: ClassDecay,
) -> FieldId {
    let distance = spec.push(
        format!("indirect_distance/{key}"),
        NodeSpec::distance(direct, cutoff),
    );
    let decayed = spec.push(
        format!("indirect_decay/{key}"),
        NodeSpec::decay(distance, decay.constant),
    );
    spec.push(
        indirect_field(key),
        NodeSpec::scale(decayed, weight * decay.ratio),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glam::Vec2;

    use super::*;
    use crate::fieldgraph::compiler::FieldGraphCompiler;
    use crate::fieldgraph::{FieldRuntime, PresenceRegistry, Raster, RasterGrid};

    /// Closed form of one indirect cell; `None` beyond `cutoff`.
    fn indirect_value(weight: f32, distance: f32, cutoff: f32, decay: ClassDecay) -> Option<f32> {
        (distance <= cutoff).then(|| (decay.constant * distance).exp() * weight * decay.ratio)
    }

    #[test]
    fn indirect_value_decreases_then_cuts_off() {
        let decay = ClassDecay::MOTORIZED;
        let mut last = f32::INFINITY;
        for step in 0..=145 {
            let d = step as f32 * 100.0;
            let v = indirect_value(10.0, d, 14_500.0, decay).expect("inside cutoff");
            assert!(v < last);
            assert!(v > 0.0);
            last = v;
        }
        assert_eq!(indirect_value(10.0, 0.0, 14_500.0, decay), Some(5.0));
        assert_eq!(indirect_value(10.0, 14_500.1, 14_500.0, decay), None);
    }

    #[test]
    fn non_motorized_decays_faster() {
        let d = 2_000.0;
        let m = indirect_value(4.0, d, 14_500.0, ClassDecay::MOTORIZED).unwrap();
        let n = indirect_value(4.0, d, 14_500.0, ClassDecay::NON_MOTORIZED).unwrap();
        assert!(n < m);
    }

    #[test]
    fn validate_rejects_growth() {
        assert!(ClassDecay::new(0.0003, 0.5).validate().is_err());
        assert!(ClassDecay::new(-0.0003, 0.0).validate().is_err());
        assert!(ClassDecay::MOTORIZED.validate().is_ok());
    }

    #[test]
    fn graph_matches_closed_form() {
        let grid = RasterGrid::new(Vec2::ZERO, 1000.0, 20, 1);
        let mut band = Raster::new(grid.clone());
        band.data[0] = 10.0;
        let mut layers = PresenceRegistry::new();
        layers.register("band", band);

        let mut spec = FieldGraphSpec::default();
        spec.add("direct", NodeSpec::presence("band"));
        let id = add_indirect_field(
            &mut spec,
            "road",
            10.0,
            "direct".into(),
            14_500.0,
            ClassDecay::MOTORIZED,
        );

        let program = FieldGraphCompiler::compile(&spec).unwrap();
        let mut rt = FieldRuntime::new(Arc::new(program), &layers, grid);
        let r = rt.bake(&id).unwrap();
        for (i, v) in r.data.iter().enumerate() {
            let d = i as f32 * 1000.0;
            match indirect_value(10.0, d, 14_500.0, ClassDecay::MOTORIZED) {
                Some(expected) => assert!((v - expected).abs() < 1e-4, "cell {i}"),
                None => assert!(v.is_nan(), "cell {i} beyond cutoff"),
            }
        }
    }
}
