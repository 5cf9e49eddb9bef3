//! Direct (near-feature) influence.
//!
//! A category's direct field equals its weight wherever the Euclidean distance to the
//! nearest feature is within the direct radius, `0` elsewhere inside the search kernel
//! and masked beyond it.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::driver::category::Category;
use crate::error::{Error, Result};
use crate::fieldgraph::spec::FieldGraphSpec;
use crate::fieldgraph::{FieldId, NodeSpec};

/// Geometry of the influence bands, in world units.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InfluenceParams {
    /// Nominal width of a mapped feature.
    pub feature_width: f32,
    /// Total width of the direct-influence band, feature included.
    pub direct_width: f32,
    /// Maximum reach of indirect influence measured from the feature.
    pub indirect_radius: f32,
}

impl Default for InfluenceParams {
    fn default() -> Self {
        Self {
            feature_width: 300.0,
            direct_width: 1000.0,
            indirect_radius: 15_000.0,
        }
    }
}

impl InfluenceParams {
    /// `(direct_width - feature_width) / 2`.
    pub fn direct_radius(&self) -> f32 {
        (self.direct_width - self.feature_width) / 2.0
    }

    /// Search radius used when computing direct distances.
    pub fn kernel_radius(&self) -> f32 {
        self.direct_width / 2.0
    }

    /// Reach of indirect influence measured from the edge of the direct band.
    pub fn indirect_cutoff(&self) -> f32 {
        self.indirect_radius - self.kernel_radius()
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.feature_width >= 0.0) || !(self.direct_width > self.feature_width) {
            return Err(Error::InvalidConfig(
                "direct_width must exceed feature_width >= 0".into(),
            ));
        }
        if !(self.indirect_cutoff() > 0.0) {
            return Err(Error::InvalidConfig(
                "indirect_radius must exceed half the direct width".into(),
            ));
        }
        Ok(())
    }
}

pub fn presence_field(key: &str) -> FieldId {
    format!("presence/{key}")
}

pub fn direct_field(key: &str) -> FieldId {
    format!("direct/{key}")
}

/// Adds the presence, distance and weighted band nodes of `category` and returns the
/// direct field id.
pub fn add_direct_field(
    spec: &mut FieldGraphSpec,
    category: &Category,
    params: &InfluenceParams,
) -> FieldId {
    let key = &category.key;
    let presence = spec.push(presence_field(key), NodeSpec::presence(key.clone()));
    let distance = spec.push(
        format!("direct_distance/{key}"),
        NodeSpec::distance(presence, params.kernel_radius()),
    );
    let band = spec.push(
        format!("direct_band/{key}"),
        NodeSpec::less_or_equal(distance, params.direct_radius()),
    );
    spec.push(direct_field(key), NodeSpec::scale(band, category.weight))
}

/// Direct fields of one merge group after fill suppression.
#[derive(Clone, Debug, Default)]
pub struct DirectFields {
    /// `(category key, field id)` in category order. Fill entries point at the
    /// suppressed field.
    pub per_category: Vec<(String, FieldId)>,
    /// Max over primary direct fields, if any primaries exist.
    pub primary_max: Option<FieldId>,
}

impl DirectFields {
    pub fn ids(&self) -> Vec<FieldId> {
        self.per_category.iter().map(|(_, id)| id.clone()).collect()
    }
}

/// Builds direct fields for `categories` and suppresses fill categories wherever any
/// primary category registers direct influence.
///
/// `tag` names the merge nodes so several merge groups can live in one graph.
pub fn add_direct_fields<'c>(
    spec: &mut FieldGraphSpec,
    categories: impl IntoIterator<Item = &'c Category>,
    params: &InfluenceParams,
    tag: &str,
) -> DirectFields {
    let categories: Vec<&Category> = categories.into_iter().collect();

    let primary_ids: Vec<FieldId> = categories
        .iter()
        .filter(|c| !c.is_fill())
        .map(|c| add_direct_field(spec, c, params))
        .collect();

    let primary_max = match primary_ids.len() {
        0 => None,
        _ => Some(spec.push(format!("direct_primary/{tag}"), NodeSpec::max(primary_ids))),
    };

    let mut per_category = Vec::with_capacity(categories.len());
    for c in &categories {
        let direct = if spec.contains(&direct_field(&c.key)) {
            direct_field(&c.key)
        } else {
            add_direct_field(spec, c, params)
        };
        let id = match (&primary_max, c.is_fill()) {
            (Some(by), true) => spec.push(
                format!("direct_fill/{}", c.key),
                NodeSpec::suppress(direct, by.clone()),
            ),
            _ => direct,
        };
        per_category.push((c.key.clone(), id));
    }

    DirectFields {
        per_category,
        primary_max,
    }
}
