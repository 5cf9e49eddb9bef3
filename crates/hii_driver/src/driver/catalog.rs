//! Catalog boundary for presence rasters.
//!
//! The driver never reads storage directly. A [`RasterCatalog`] resolves category keys
//! either to a static raster or, for time-stamped collections, to the most recent asset
//! at or before a reference date. Staleness is judged by the caller with
//! [`check_freshness`].
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use chrono::NaiveDate;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::fieldgraph::Raster;

/// How a presence layer is stored in the catalog.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// A single image with no date.
    Static,
    /// A dated collection; the most recent asset as of the task date is used.
    TimeStamped {
        /// Maximum age in days before the asset counts as stale.
        max_age_days: Option<u32>,
    },
}

impl Default for AssetKind {
    fn default() -> Self {
        AssetKind::TimeStamped { max_age_days: None }
    }
}

impl AssetKind {
    pub fn time_stamped(max_age_days: u32) -> Self {
        AssetKind::TimeStamped {
            max_age_days: Some(max_age_days),
        }
    }
}

/// Source of presence rasters.
pub trait RasterCatalog {
    /// Resolves a static dataset.
    fn resolve(&self, key: &str) -> Result<Arc<Raster>>;

    /// Resolves the most recent asset of a time-stamped collection at or before `as_of`.
    fn resolve_latest(&self, key: &str, as_of: NaiveDate) -> Result<(Arc<Raster>, NaiveDate)>;

    /// Every presence key the catalog knows, regardless of date.
    fn presence_keys(&self) -> BTreeSet<String>;
}

/// Fails with [`Error::StaleInput`] when `effective_date` is more than `max_age_days`
/// before `as_of`.
pub fn check_freshness(
    key: &str,
    as_of: NaiveDate,
    effective_date: NaiveDate,
    max_age_days: u32,
) -> Result<()> {
    let age_days = (as_of - effective_date).num_days();
    if age_days > i64::from(max_age_days) {
        return Err(Error::StaleInput {
            key: key.to_string(),
            as_of,
            effective_date,
            age_days,
            max_age_days,
        });
    }
    Ok(())
}

/// A catalog held entirely in memory.
#[derive(Default)]
pub struct InMemoryCatalog {
    statics: HashMap<String, Arc<Raster>>,
    collections: HashMap<String, BTreeMap<NaiveDate, Arc<Raster>>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_static(&mut self, key: impl Into<String>, raster: Raster) -> &mut Self {
        self.statics.insert(key.into(), Arc::new(raster));
        self
    }

    pub fn insert_dated(
        &mut self,
        key: impl Into<String>,
        date: NaiveDate,
        raster: Raster,
    ) -> &mut Self {
        self.collections
            .entry(key.into())
            .or_default()
            .insert(date, Arc::new(raster));
        self
    }

    /// Registers an empty collection so the key is known without any assets.
    pub fn declare_collection(&mut self, key: impl Into<String>) -> &mut Self {
        self.collections.entry(key.into()).or_default();
        self
    }

    pub fn len(&self) -> usize {
        self.statics.len() + self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RasterCatalog for InMemoryCatalog {
    fn resolve(&self, key: &str) -> Result<Arc<Raster>> {
        self.statics
            .get(key)
            .cloned()
            .ok_or_else(|| Error::NotFound {
                key: key.to_string(),
                detail: "no static asset".into(),
            })
    }

    fn resolve_latest(&self, key: &str, as_of: NaiveDate) -> Result<(Arc<Raster>, NaiveDate)> {
        let Some(collection) = self.collections.get(key) else {
            return Err(Error::NotFound {
                key: key.to_string(),
                detail: "no such collection".into(),
            });
        };
        collection
            .range(..=as_of)
            .next_back()
            .map(|(date, raster)| (Arc::clone(raster), *date))
            .ok_or_else(|| Error::NotFound {
                key: key.to_string(),
                detail: format!("no asset at or before {as_of}"),
            })
    }

    fn presence_keys(&self) -> BTreeSet<String> {
        self.statics
            .keys()
            .chain(self.collections.keys())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::fieldgraph::RasterGrid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn raster(value: f32) -> Raster {
        Raster::filled(RasterGrid::new(Vec2::ZERO, 1.0, 1, 1), value)
    }

    #[test]
    fn resolve_latest_picks_most_recent_not_after_as_of() {
        let mut catalog = InMemoryCatalog::new();
        catalog
            .insert_dated("highway_primary", date(2019, 1, 1), raster(1.0))
            .insert_dated("highway_primary", date(2020, 1, 1), raster(2.0))
            .insert_dated("highway_primary", date(2022, 1, 1), raster(3.0));

        let (r, effective) = catalog
            .resolve_latest("highway_primary", date(2021, 6, 1))
            .unwrap();
        assert_eq!(effective, date(2020, 1, 1));
        assert_eq!(r.data[0], 2.0);

        let (_, same_day) = catalog
            .resolve_latest("highway_primary", date(2022, 1, 1))
            .unwrap();
        assert_eq!(same_day, date(2022, 1, 1));
    }

    #[test]
    fn resolve_latest_before_first_asset_is_not_found() {
        let mut catalog = InMemoryCatalog::new();
        catalog.insert_dated("highway_primary", date(2013, 1, 1), raster(1.0));
        let err = catalog
            .resolve_latest("highway_primary", date(2010, 1, 1))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert!(catalog.resolve_latest("nope", date(2010, 1, 1)).is_err());
    }

    #[test]
    fn static_and_dated_keys_are_listed() {
        let mut catalog = InMemoryCatalog::new();
        catalog
            .insert_static("watermask", raster(1.0))
            .declare_collection("railway_rail");
        let keys: Vec<String> = catalog.presence_keys().into_iter().collect();
        assert_eq!(keys, vec!["railway_rail".to_string(), "watermask".to_string()]);
        assert!(catalog.resolve("watermask").is_ok());
        assert!(catalog.resolve("railway_rail").is_err());
    }

    #[test]
    fn freshness_bound_is_inclusive() {
        let as_of = date(2021, 1, 1);
        assert!(check_freshness("osm", as_of, date(2020, 1, 2), 365).is_ok());
        assert!(check_freshness("osm", as_of, date(2020, 1, 1), 366).is_ok());
        let err = check_freshness("osm", as_of, date(2019, 12, 31), 365).unwrap_err();
        assert!(matches!(err, Error::StaleInput { age_days: 367, .. }));
    }
}
