//! Combination policies that merge direct and indirect influence into one driver field.
//!
//! Each driver generation is a [`CombinationPolicy`]. [`CombinationPolicy::build_graph`]
//! turns a weight table into a [`FieldGraphSpec`] whose single
//! [`FieldSemantics::Driver`] field is the combined value with masked cells filled with
//! `0` and permanent water masked out.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::driver::category::{Category, CategoryWeightTable, InfluenceClass, InfraGroup};
use crate::driver::direct::{add_direct_fields, presence_field, InfluenceParams};
use crate::driver::indirect::{add_indirect_field, ClassDecay};
use crate::error::{Error, Result};
use crate::fieldgraph::spec::{FieldGraphSpec, FieldSemantics};
use crate::fieldgraph::{FieldId, NodeSpec};

/// Id of the final driver field in every generated graph.
pub const DRIVER_FIELD: &str = "driver";

/// Sum-then-clamp policy of the composite infrastructure driver.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct SumClampPolicy {
    /// Multiplier applied to the sum of non-road, non-rail groups.
    pub group_multiplier: f32,
    /// Value of a road or rail cell before local filtering.
    pub presence_value: f32,
    /// Radius in cells of the local maximum filter on roads and rail.
    pub focal_radius_px: usize,
    /// Decay constant of road indirect influence.
    pub decay_constant: f32,
    /// Fixed strength of road indirect influence.
    pub indirect_strength: f32,
    /// Ceiling of the combined road term.
    pub ceiling: f32,
}

impl Default for SumClampPolicy {
    fn default() -> Self {
        Self {
            group_multiplier: 2.0,
            presence_value: 2.0,
            focal_radius_px: 1,
            decay_constant: -0.0002,
            indirect_strength: 4.0,
            ceiling: 8.0,
        }
    }
}

/// Max-merged direct field through a local maximum filter, plus unclamped indirect
/// influence, times an emphasis factor.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct MaxLocalPolicy {
    pub kernel_px: usize,
    pub decay: ClassDecay,
    pub emphasis: f32,
}

impl Default for MaxLocalPolicy {
    fn default() -> Self {
        Self {
            kernel_px: 1,
            decay: ClassDecay::MOTORIZED,
            emphasis: 2.0,
        }
    }
}

/// Per class `max(direct, indirect)`, then the max across classes.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct PerClassMaxPolicy {
    pub classes: Vec<(InfluenceClass, ClassDecay)>,
}

impl Default for PerClassMaxPolicy {
    fn default() -> Self {
        Self {
            classes: vec![
                (InfluenceClass::Motorized, ClassDecay::MOTORIZED),
                (InfluenceClass::NonMotorized, ClassDecay::NON_MOTORIZED),
            ],
        }
    }
}

/// Generation-specific rule for merging influence fields.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub enum CombinationPolicy {
    SumClamp(SumClampPolicy),
    MaxLocal(MaxLocalPolicy),
    PerClassMax(PerClassMaxPolicy),
}

impl CombinationPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            CombinationPolicy::SumClamp(_) => "sum_clamp",
            CombinationPolicy::MaxLocal(_) => "max_local",
            CombinationPolicy::PerClassMax(_) => "per_class_max",
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            CombinationPolicy::SumClamp(p) => {
                if !(p.decay_constant < 0.0) {
                    return Err(Error::InvalidConfig("road decay constant must be negative".into()));
                }
                if !(p.ceiling > 0.0) {
                    return Err(Error::InvalidConfig("ceiling must be > 0".into()));
                }
                Ok(())
            }
            CombinationPolicy::MaxLocal(p) => {
                if !(p.emphasis > 0.0) {
                    return Err(Error::InvalidConfig("emphasis must be > 0".into()));
                }
                p.decay.validate()
            }
            CombinationPolicy::PerClassMax(p) => {
                if p.classes.is_empty() {
                    return Err(Error::InvalidConfig("per-class policy has no classes".into()));
                }
                for (i, (class, decay)) in p.classes.iter().enumerate() {
                    if p.classes[..i].iter().any(|(c, _)| c == class) {
                        return Err(Error::InvalidConfig(format!(
                            "class '{}' listed twice",
                            class.label()
                        )));
                    }
                    decay.validate()?;
                }
                Ok(())
            }
        }
    }

    /// Builds the driver graph for `table`.
    ///
    /// `water_mask` is the presence key of the land mask; cells where it is zero or
    /// masked are masked in the driver field.
    pub fn build_graph(
        &self,
        table: &CategoryWeightTable,
        params: &InfluenceParams,
        water_mask: &str,
    ) -> Result<FieldGraphSpec> {
        self.validate()?;
        params.validate()?;

        let mut spec = FieldGraphSpec::default();
        let combined = match self {
            CombinationPolicy::SumClamp(p) => build_sum_clamp(&mut spec, p, table, params)?,
            CombinationPolicy::MaxLocal(p) => build_max_local(&mut spec, p, table, params),
            CombinationPolicy::PerClassMax(p) => build_per_class_max(&mut spec, p, table, params)?,
        };

        let filled = spec.push("driver_filled", NodeSpec::unmask(combined, 0.0));
        let land = spec.push(presence_field(water_mask), NodeSpec::presence(water_mask));
        spec.add_with_semantics(
            DRIVER_FIELD,
            NodeSpec::mask(filled, land),
            FieldSemantics::Driver,
        );
        Ok(spec)
    }
}

fn tagged(spec: &mut FieldGraphSpec, id: &str, node: NodeSpec, semantics: FieldSemantics) -> FieldId {
    spec.add_with_semantics(id, node, semantics);
    id.to_string()
}

fn max_or_zero(spec: &mut FieldGraphSpec, id: &str, inputs: Vec<FieldId>) -> FieldId {
    if inputs.is_empty() {
        spec.push(id, NodeSpec::constant(0.0))
    } else {
        spec.push(id, NodeSpec::max(inputs))
    }
}

/// `sum(weight * presence)` over `members`.
fn weighted_sum(spec: &mut FieldGraphSpec, members: &[&Category], label: &str) -> FieldId {
    let terms: Vec<FieldId> = members
        .iter()
        .map(|c| {
            let presence = spec.push(presence_field(&c.key), NodeSpec::presence(c.key.clone()));
            spec.push(format!("weighted/{}", c.key), NodeSpec::scale(presence, c.weight))
        })
        .collect();
    spec.push(format!("group/{label}"), NodeSpec::add(terms))
}

fn build_sum_clamp(
    spec: &mut FieldGraphSpec,
    p: &SumClampPolicy,
    table: &CategoryWeightTable,
    params: &InfluenceParams,
) -> Result<FieldId> {
    if let Some(c) = table
        .iter()
        .find(|c| !matches!(c.class, Some(InfluenceClass::Group(_))))
    {
        return Err(Error::InvalidWeightConfiguration(format!(
            "{}: category '{}' has no infrastructure group",
            table.version(),
            c.key
        )));
    }

    let mut terms: Vec<FieldId> = Vec::new();
    let mut other_groups: Vec<FieldId> = Vec::new();

    for group in InfraGroup::ALL {
        let members = table.in_class(InfluenceClass::Group(group));
        if members.is_empty() {
            continue;
        }
        let label = group.as_str();
        let sum = weighted_sum(spec, &members, label);

        match group {
            InfraGroup::Highway | InfraGroup::Railway => {
                let present = spec.push(format!("{label}_present"), NodeSpec::greater_than(sum, 0.0));
                let flagged = spec.push(
                    format!("{label}_bool"),
                    NodeSpec::scale(present, p.presence_value),
                );
                let local = tagged(
                    spec,
                    &format!("{label}_local"),
                    NodeSpec::focal_max(flagged.clone(), p.focal_radius_px),
                    FieldSemantics::Direct,
                );

                if group == InfraGroup::Railway {
                    terms.push(local);
                    continue;
                }

                let distance = spec.push(
                    "highway_distance",
                    NodeSpec::distance(flagged, params.indirect_radius),
                );
                let decayed = spec.push(
                    "highway_decay",
                    NodeSpec::decay(distance, p.decay_constant),
                );
                let strength = spec.push(
                    "highway_indirect_masked",
                    NodeSpec::scale(decayed, p.indirect_strength),
                );
                let indirect = tagged(
                    spec,
                    "highway_indirect",
                    NodeSpec::unmask(strength, 0.0),
                    FieldSemantics::Indirect,
                );
                let total = spec.push("highway_sum", NodeSpec::add(vec![local, indirect]));
                terms.push(spec.push("highway_total", NodeSpec::clamp(total, 0.0, p.ceiling)));
            }
            _ => other_groups.push(sum),
        }
    }

    if !other_groups.is_empty() {
        let sum = spec.push("infrastructure_sum", NodeSpec::add(other_groups));
        terms.push(tagged(
            spec,
            "infrastructure",
            NodeSpec::scale(sum, p.group_multiplier),
            FieldSemantics::Direct,
        ));
    }

    Ok(if terms.is_empty() {
        spec.push("combined", NodeSpec::constant(0.0))
    } else {
        spec.push("combined", NodeSpec::add(terms))
    })
}

fn build_max_local(
    spec: &mut FieldGraphSpec,
    p: &MaxLocalPolicy,
    table: &CategoryWeightTable,
    params: &InfluenceParams,
) -> FieldId {
    let fields = add_direct_fields(spec, table.iter(), params, "all");

    let direct = max_or_zero(spec, "direct_max", fields.ids());
    spec.set_semantics(&direct, FieldSemantics::Direct);
    let filled = spec.push("direct_filled", NodeSpec::unmask(direct, 0.0));
    let local = spec.push("direct_local", NodeSpec::focal_max(filled, p.kernel_px));

    let indirects: Vec<FieldId> = fields
        .per_category
        .iter()
        .filter_map(|(key, id)| {
            let weight = table.weight(key)?;
            Some(add_indirect_field(
                spec,
                key,
                weight,
                id.clone(),
                params.indirect_cutoff(),
                p.decay,
            ))
        })
        .collect();
    let indirect = max_or_zero(spec, "indirect_max", indirects);
    spec.set_semantics(&indirect, FieldSemantics::Indirect);
    let indirect = spec.push("indirect_filled", NodeSpec::unmask(indirect, 0.0));

    let sum = spec.push("direct_plus_indirect", NodeSpec::add(vec![local, indirect]));
    spec.push("combined", NodeSpec::scale(sum, p.emphasis))
}

fn build_per_class_max(
    spec: &mut FieldGraphSpec,
    p: &PerClassMaxPolicy,
    table: &CategoryWeightTable,
    params: &InfluenceParams,
) -> Result<FieldId> {
    if let Some(c) = table
        .iter()
        .find(|c| !p.classes.iter().any(|(class, _)| Some(*class) == c.class))
    {
        return Err(Error::InvalidWeightConfiguration(format!(
            "{}: category '{}' belongs to no configured class",
            table.version(),
            c.key
        )));
    }

    // Fill suppression spans all classes: a mapped footway still hides an overlapping
    // secondary road record.
    let fields = add_direct_fields(spec, table.iter(), params, "all");

    let mut class_values: Vec<FieldId> = Vec::new();
    for (class, decay) in &p.classes {
        let label = class.label();
        let members: Vec<(&str, f32, &FieldId)> = fields
            .per_category
            .iter()
            .filter_map(|(key, id)| {
                let c = table.get(key)?;
                (c.class == Some(*class)).then_some((key.as_str(), c.weight, id))
            })
            .collect();
        if members.is_empty() {
            continue;
        }

        let direct = tagged(
            spec,
            &format!("class_direct/{label}"),
            NodeSpec::max(members.iter().map(|(_, _, id)| (*id).clone()).collect()),
            FieldSemantics::Direct,
        );
        let indirects: Vec<FieldId> = members
            .iter()
            .map(|(key, weight, id)| {
                add_indirect_field(
                    spec,
                    key,
                    *weight,
                    (*id).clone(),
                    params.indirect_cutoff(),
                    *decay,
                )
            })
            .collect();
        let indirect = tagged(
            spec,
            &format!("class_indirect/{label}"),
            NodeSpec::max(indirects),
            FieldSemantics::Indirect,
        );
        class_values.push(spec.push(
            format!("class/{label}"),
            NodeSpec::max(vec![direct, indirect]),
        ));
    }

    Ok(max_or_zero(spec, "combined", class_values))
}

/// Integer export quantization: `int(raw * scale)`, truncating toward zero.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quantization {
    pub scale: f32,
}

impl Default for Quantization {
    fn default() -> Self {
        Self { scale: 100.0 }
    }
}

impl Quantization {
    /// Quantizes one cell; masked cells stay undefined.
    #[inline]
    pub fn apply(&self, raw: f32) -> Option<i32> {
        if raw.is_nan() {
            None
        } else {
            Some((raw * self.scale) as i32)
        }
    }
}
