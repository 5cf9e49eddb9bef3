//! Node specifications for the field graph.
//!
//! This module defines the raster-algebra operations available to driver graphs.
//! Each [`NodeSpec`] is a pure transform from its input fields to one output field;
//! masked cells (see [`crate::fieldgraph::Raster`]) propagate through arithmetic and are
//! skipped by [`NodeSpec::Max`].

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::fieldgraph::FieldId;

/// Parameters for a presence input node.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct PresenceParams {
    /// The presence layer id in the [`crate::fieldgraph::PresenceRegistry`].
    pub layer_id: String,
}

/// Parameters for a constant value node.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct ConstantParams {
    /// The constant value.
    pub value: f32,
}

/// Parameters for a scale node.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct ScaleParams {
    /// Scaling factor.
    pub factor: f32,
}

/// Parameters for a clamp node.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct ClampParams {
    /// Minimum value to clamp to.
    pub min: f32,
    /// Maximum value to clamp to.
    pub max: f32,
}

/// Parameters for threshold comparison nodes.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct ThresholdParams {
    pub threshold: f32,
}

/// Parameters for a distance node.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct DistanceParams {
    /// Search radius in world units; cells beyond it are masked.
    pub max_distance: f32,
}

/// Parameters for an exponential decay node.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct DecayParams {
    /// Negative decay constant applied as `exp(constant * value)`.
    pub constant: f32,
}

/// Parameters for a focal maximum node.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct FocalParams {
    /// Half-size of the square kernel in cells.
    pub radius_px: usize,
}

/// Parameters for an unmask node.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub struct UnmaskParams {
    /// Value written into masked cells.
    pub value: f32,
}

/// Specification of a node in the field graph.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
pub enum NodeSpec {
    Presence {
        /// Presence input parameters.
        params: PresenceParams,
    },
    Constant {
        /// Constant node parameters.
        params: ConstantParams,
    },
    Add {
        /// Input field ids to sum; a masked input masks the sum.
        inputs: Vec<FieldId>,
    },
    Mul {
        /// Input field ids to multiply.
        inputs: Vec<FieldId>,
    },
    Max {
        /// Input field ids to take the maximum of, skipping masked cells.
        inputs: Vec<FieldId>,
    },
    Scale {
        /// Input field ids to scale (first input used).
        inputs: Vec<FieldId>,
        /// Scale operation parameters.
        params: ScaleParams,
    },
    Clamp {
        /// Input field ids to clamp (first input used).
        inputs: Vec<FieldId>,
        /// Clamp operation parameters.
        params: ClampParams,
    },
    GreaterThan {
        /// Input field ids to compare (first input used).
        inputs: Vec<FieldId>,
        /// `1.0` where the input exceeds the threshold, `0.0` otherwise.
        params: ThresholdParams,
    },
    LessOrEqual {
        /// Input field ids to compare (first input used).
        inputs: Vec<FieldId>,
        /// `1.0` where the input is at most the threshold, `0.0` otherwise.
        params: ThresholdParams,
    },
    Distance {
        /// Input field ids whose non-zero cells are distance sources (first input used).
        inputs: Vec<FieldId>,
        /// Distance search parameters.
        params: DistanceParams,
    },
    Decay {
        /// Input field ids holding distances (first input used).
        inputs: Vec<FieldId>,
        /// Decay parameters.
        params: DecayParams,
    },
    FocalMax {
        /// Input field ids to filter (first input used).
        inputs: Vec<FieldId>,
        /// Kernel parameters.
        params: FocalParams,
    },
    Suppress {
        /// `[input, by]`: `input` is masked wherever `by` is non-zero.
        inputs: Vec<FieldId>,
    },
    Mask {
        /// `[input, mask]`: `input` is masked wherever `mask` is zero or masked.
        inputs: Vec<FieldId>,
    },
    Unmask {
        /// Input field ids to fill (first input used).
        inputs: Vec<FieldId>,
        /// Fill parameters.
        params: UnmaskParams,
    },
}

impl NodeSpec {
    /// Returns the input field IDs for this node.
    pub fn inputs(&self) -> &[FieldId] {
        match self {
            NodeSpec::Add { inputs }
            | NodeSpec::Mul { inputs }
            | NodeSpec::Max { inputs }
            | NodeSpec::Suppress { inputs }
            | NodeSpec::Mask { inputs }
            | NodeSpec::Scale { inputs, .. }
            | NodeSpec::Clamp { inputs, .. }
            | NodeSpec::GreaterThan { inputs, .. }
            | NodeSpec::LessOrEqual { inputs, .. }
            | NodeSpec::Distance { inputs, .. }
            | NodeSpec::Decay { inputs, .. }
            | NodeSpec::FocalMax { inputs, .. }
            | NodeSpec::Unmask { inputs, .. } => inputs,
            NodeSpec::Presence { .. } | NodeSpec::Constant { .. } => &[],
        }
    }

    /// Short operation name used in diagnostics.
    pub fn op_name(&self) -> &'static str {
        match self {
            NodeSpec::Presence { .. } => "Presence",
            NodeSpec::Constant { .. } => "Constant",
            NodeSpec::Add { .. } => "Add",
            NodeSpec::Mul { .. } => "Mul",
            NodeSpec::Max { .. } => "Max",
            NodeSpec::Scale { .. } => "Scale",
            NodeSpec::Clamp { .. } => "Clamp",
            NodeSpec::GreaterThan { .. } => "GreaterThan",
            NodeSpec::LessOrEqual { .. } => "LessOrEqual",
            NodeSpec::Distance { .. } => "Distance",
            NodeSpec::Decay { .. } => "Decay",
            NodeSpec::FocalMax { .. } => "FocalMax",
            NodeSpec::Suppress { .. } => "Suppress",
            NodeSpec::Mask { .. } => "Mask",
            NodeSpec::Unmask { .. } => "Unmask",
        }
    }

    /// Creates a presence input node reading `layer_id` as a 0/1 indicator.
    pub fn presence(layer_id: impl Into<String>) -> Self {
        NodeSpec::Presence {
            params: PresenceParams {
                layer_id: layer_id.into(),
            },
        }
    }

    /// Creates a new constant value node specification.
    pub fn constant(value: f32) -> Self {
        NodeSpec::Constant {
            params: ConstantParams { value },
        }
    }

    /// Creates a new addition node specification.
    pub fn add(inputs: Vec<FieldId>) -> Self {
        NodeSpec::Add { inputs }
    }

    /// Creates a new multiplication node specification.
    pub fn mul(inputs: Vec<FieldId>) -> Self {
        NodeSpec::Mul { inputs }
    }

    /// Creates a new maximum node specification.
    pub fn max(inputs: Vec<FieldId>) -> Self {
        NodeSpec::Max { inputs }
    }

    /// Creates a new scaling node specification.
    pub fn scale(input: FieldId, factor: f32) -> Self {
        NodeSpec::Scale {
            inputs: vec![input],
            params: ScaleParams { factor },
        }
    }

    /// Creates a new clamping node specification.
    pub fn clamp(input: FieldId, min: f32, max: f32) -> Self {
        NodeSpec::Clamp {
            inputs: vec![input],
            params: ClampParams { min, max },
        }
    }

    pub fn greater_than(input: FieldId, threshold: f32) -> Self {
        NodeSpec::GreaterThan {
            inputs: vec![input],
            params: ThresholdParams { threshold },
        }
    }

    pub fn less_or_equal(input: FieldId, threshold: f32) -> Self {
        NodeSpec::LessOrEqual {
            inputs: vec![input],
            params: ThresholdParams { threshold },
        }
    }

    /// Creates a distance-to-nearest-source node truncated at `max_distance`.
    pub fn distance(input: FieldId, max_distance: f32) -> Self {
        NodeSpec::Distance {
            inputs: vec![input],
            params: DistanceParams { max_distance },
        }
    }

    /// Creates an `exp(constant * x)` node.
    pub fn decay(input: FieldId, constant: f32) -> Self {
        NodeSpec::Decay {
            inputs: vec![input],
            params: DecayParams { constant },
        }
    }

    /// Creates a square-kernel focal maximum node.
    pub fn focal_max(input: FieldId, radius_px: usize) -> Self {
        NodeSpec::FocalMax {
            inputs: vec![input],
            params: FocalParams { radius_px },
        }
    }

    /// Creates a node that masks `input` wherever `by` registers any influence.
    pub fn suppress(input: FieldId, by: FieldId) -> Self {
        NodeSpec::Suppress {
            inputs: vec![input, by],
        }
    }

    /// Creates a node that masks `input` wherever `mask` is zero or masked.
    pub fn mask(input: FieldId, mask: FieldId) -> Self {
        NodeSpec::Mask {
            inputs: vec![input, mask],
        }
    }

    /// Creates a node that replaces masked cells with `value`.
    pub fn unmask(input: FieldId, value: f32) -> Self {
        NodeSpec::Unmask {
            inputs: vec![input],
            params: UnmaskParams { value },
        }
    }
}
