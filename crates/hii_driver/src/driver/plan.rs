//! Versioned driver plans.
//!
//! A [`DriverPlan`] bundles everything that distinguishes one driver generation from
//! another: the weight table, the combination policy, band geometry, quantization,
//! the freshness rules and the export destination. Built-in plans are available via
//! [`DriverPlan::builtin`].
use chrono::NaiveDate;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::driver::category::CategoryWeightTable;
use crate::driver::combine::{
    CombinationPolicy, MaxLocalPolicy, PerClassMaxPolicy, Quantization, SumClampPolicy,
};
use crate::driver::direct::InfluenceParams;
use crate::driver::weights;
use crate::error::{Error, Result};

/// Names accepted by [`DriverPlan::builtin`].
pub const BUILTIN_PLANS: [&str; 3] = ["infrastructure_v1", "road_v2", "road_v3"];

/// Key of the static land/water mask shared by the built-in plans.
pub const WATER_MASK_KEY: &str = "watermask";

fn date(y: i32, m: u32, d: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
        .ok_or_else(|| Error::InvalidConfig(format!("invalid date {y}-{m}-{d}")))
}

/// First day OpenStreetMap survey data is available to the road drivers.
pub fn osm_start() -> Result<NaiveDate> {
    date(2012, 9, 12)
}

/// Everything needed to compute one driver generation.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug)]
#[non_exhaustive]
pub struct DriverPlan {
    /// Driver id; also keys the compiled program cache.
    pub id: String,
    /// Export destination before the realm is appended, e.g. `driver/roads`.
    pub destination: String,
    pub weights: CategoryWeightTable,
    pub policy: CombinationPolicy,
    #[cfg_attr(feature = "serde", serde(default))]
    pub influence: InfluenceParams,
    /// Presence key of the static land mask; zero marks permanent water.
    pub water_mask: String,
    /// Integer quantization on export; `None` exports continuous values.
    #[cfg_attr(feature = "serde", serde(default))]
    pub quantization: Option<Quantization>,
    /// Runs dated before the cutoff skip the freshness check.
    #[cfg_attr(feature = "serde", serde(default))]
    pub freshness_cutoff: Option<NaiveDate>,
    /// Before the cutoff, use the fill categories alone when no primary category resolves.
    #[cfg_attr(feature = "serde", serde(default))]
    pub fill_only_fallback: bool,
}

impl DriverPlan {
    pub fn new(
        id: impl Into<String>,
        destination: impl Into<String>,
        weights: CategoryWeightTable,
        policy: CombinationPolicy,
    ) -> Self {
        Self {
            id: id.into(),
            destination: destination.into(),
            weights,
            policy,
            influence: InfluenceParams::default(),
            water_mask: WATER_MASK_KEY.to_string(),
            quantization: None,
            freshness_cutoff: None,
            fill_only_fallback: false,
        }
    }

    pub fn with_influence(mut self, influence: InfluenceParams) -> Self {
        self.influence = influence;
        self
    }

    pub fn with_water_mask(mut self, key: impl Into<String>) -> Self {
        self.water_mask = key.into();
        self
    }

    pub fn with_quantization(mut self, quantization: Quantization) -> Self {
        self.quantization = Some(quantization);
        self
    }

    pub fn with_freshness_cutoff(mut self, cutoff: NaiveDate) -> Self {
        self.freshness_cutoff = Some(cutoff);
        self
    }

    pub fn with_fill_only_fallback(mut self, enabled: bool) -> Self {
        self.fill_only_fallback = enabled;
        self
    }

    /// Composite infrastructure driver: sum-then-clamp, continuous output.
    pub fn infrastructure_v1() -> Result<Self> {
        Ok(Self::new(
            "infrastructure_v1",
            "driver/infrastructure",
            weights::infrastructure_weights()?,
            CombinationPolicy::SumClamp(SumClampPolicy::default()),
        ))
    }

    /// Mid-generation road driver: local maximum plus indirect, doubled.
    pub fn road_v2() -> Result<Self> {
        Ok(Self::new(
            "road_v2",
            "driver/roads",
            weights::road_weights_v2()?,
            CombinationPolicy::MaxLocal(MaxLocalPolicy::default()),
        )
        .with_quantization(Quantization::default())
        .with_freshness_cutoff(osm_start()?)
        .with_fill_only_fallback(true))
    }

    /// Final road driver: per-class maximum with motorized and non-motorized decay.
    pub fn road_v3() -> Result<Self> {
        Ok(Self::new(
            "road_v3",
            "driver/roads",
            weights::road_weights()?,
            CombinationPolicy::PerClassMax(PerClassMaxPolicy::default()),
        )
        .with_quantization(Quantization::default())
        .with_freshness_cutoff(osm_start()?)
        .with_fill_only_fallback(true))
    }

    /// Looks up a built-in plan by name.
    pub fn builtin(name: &str) -> Result<Self> {
        match name {
            "infrastructure_v1" | "infrastructure" => Self::infrastructure_v1(),
            "road_v2" => Self::road_v2(),
            "road_v3" | "road" => Self::road_v3(),
            other => Err(Error::InvalidConfig(format!(
                "unknown driver '{other}', expected one of {}",
                BUILTIN_PLANS.join(", ")
            ))),
        }
    }

    /// Parses a plan from RON text and validates it.
    #[cfg(feature = "ron")]
    pub fn from_ron(text: &str) -> Result<Self> {
        let plan: DriverPlan =
            ron::from_str(text).map_err(|e| Error::InvalidConfig(format!("plan: {e}")))?;
        plan.validate()?;
        Ok(plan)
    }

    /// Whether freshness bounds apply to a run dated `task_date`.
    pub fn freshness_applies(&self, task_date: NaiveDate) -> bool {
        self.freshness_cutoff.is_none_or(|cutoff| task_date >= cutoff)
    }

    /// Export destination for an optional realm.
    pub fn destination_for(&self, realm: Option<&str>) -> String {
        match realm.map(str::trim).filter(|r| !r.is_empty()) {
            Some(realm) => format!("{}/{}", self.destination.trim_end_matches('/'), realm),
            None => self.destination.clone(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(Error::InvalidConfig("plan id is empty".into()));
        }
        if self.destination.is_empty() {
            return Err(Error::InvalidConfig(format!("{}: destination is empty", self.id)));
        }
        if self.water_mask.is_empty() {
            return Err(Error::InvalidConfig(format!("{}: water mask key is empty", self.id)));
        }
        if self.weights.is_empty() {
            return Err(Error::InvalidWeightConfiguration(format!(
                "{}: weight table is empty",
                self.id
            )));
        }
        if let Some(q) = self.quantization {
            if !(q.scale > 0.0) || !q.scale.is_finite() {
                return Err(Error::InvalidConfig(format!(
                    "{}: quantization scale must be > 0",
                    self.id
                )));
            }
        }
        self.influence.validate()?;
        self.policy.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_plans_validate() {
        for name in BUILTIN_PLANS {
            let plan = DriverPlan::builtin(name).unwrap();
            assert_eq!(plan.id, name);
            plan.validate().unwrap();
        }
        assert!(DriverPlan::builtin("hii_lights").is_err());
    }

    #[test]
    fn generations_differ_in_output_contract() {
        let infra = DriverPlan::infrastructure_v1().unwrap();
        assert!(infra.quantization.is_none());
        assert!(infra.freshness_cutoff.is_none());
        assert!(!infra.fill_only_fallback);

        let road = DriverPlan::road_v3().unwrap();
        assert_eq!(road.quantization, Some(Quantization { scale: 100.0 }));
        assert_eq!(road.freshness_cutoff, Some(osm_start().unwrap()));
        assert!(road.fill_only_fallback);
        assert_eq!(road.influence.indirect_cutoff(), 14_500.0);
    }

    #[test]
    fn freshness_applies_from_the_cutoff() {
        let road = DriverPlan::road_v3().unwrap();
        assert!(!road.freshness_applies(date(2012, 9, 11).unwrap()));
        assert!(road.freshness_applies(date(2012, 9, 12).unwrap()));
        let infra = DriverPlan::infrastructure_v1().unwrap();
        assert!(infra.freshness_applies(date(2000, 1, 1).unwrap()));
    }

    #[test]
    fn destination_appends_realm() {
        let infra = DriverPlan::infrastructure_v1().unwrap();
        assert_eq!(infra.destination_for(None), "driver/infrastructure");
        assert_eq!(infra.destination_for(Some("  ")), "driver/infrastructure");
        assert_eq!(
            infra.destination_for(Some("sumatra_poc")),
            "driver/infrastructure/sumatra_poc"
        );
    }

    #[test]
    fn validate_rejects_bad_quantization() {
        let plan = DriverPlan::road_v2()
            .unwrap()
            .with_quantization(Quantization { scale: 0.0 });
        assert!(matches!(plan.validate(), Err(Error::InvalidConfig(_))));
    }

    #[cfg(feature = "ron")]
    #[test]
    fn plan_loads_from_ron() {
        let text = r#"(
            id: "rail_only",
            destination: "driver/rail",
            weights: (
                version: "rail_v1",
                categories: [
                    (key: "railway_rail", weight: 10.0, class: Some(Motorized)),
                    (key: "railway_tram", weight: 8.0, class: Some(Motorized)),
                ],
                namespaces: ["railway"],
            ),
            policy: PerClassMax((classes: [(Motorized, (constant: -0.0003, ratio: 0.5))])),
            water_mask: "watermask",
            quantization: Some((scale: 100.0)),
        )"#;
        let plan = DriverPlan::from_ron(text).unwrap();
        assert_eq!(plan.id, "rail_only");
        assert_eq!(plan.weights.weight("railway_tram"), Some(8.0));
        assert_eq!(plan.influence, InfluenceParams::default());
        assert!(plan.freshness_cutoff.is_none());

        let bad = text.replace("10.0", "-1.0");
        assert!(DriverPlan::from_ron(&bad).is_err());
    }
}
