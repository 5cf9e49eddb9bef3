//! Infrastructure categories and versioned weight tables.
//!
//! A [`Category`] names one presence layer (e.g. `highway_primary`) together with its
//! importance weight and, for drivers that decay classes differently, its
//! [`InfluenceClass`]. A [`CategoryWeightTable`] is the validated, immutable set of
//! categories for one driver version.
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::driver::catalog::AssetKind;
use crate::error::{Error, Result};

/// Infrastructure groups summed separately by the composite infrastructure driver.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InfraGroup {
    Aeroway,
    Amenity,
    Barrier,
    Highway,
    Landuse,
    Leisure,
    ManMade,
    Military,
    Power,
    Railway,
    Waterway,
}

impl InfraGroup {
    pub const ALL: [InfraGroup; 11] = [
        InfraGroup::Aeroway,
        InfraGroup::Amenity,
        InfraGroup::Barrier,
        InfraGroup::Highway,
        InfraGroup::Landuse,
        InfraGroup::Leisure,
        InfraGroup::ManMade,
        InfraGroup::Military,
        InfraGroup::Power,
        InfraGroup::Railway,
        InfraGroup::Waterway,
    ];

    /// Key prefix shared by the group's presence layers.
    pub fn as_str(&self) -> &'static str {
        match self {
            InfraGroup::Aeroway => "aeroway",
            InfraGroup::Amenity => "amenity",
            InfraGroup::Barrier => "barrier",
            InfraGroup::Highway => "highway",
            InfraGroup::Landuse => "landuse",
            InfraGroup::Leisure => "leisure",
            InfraGroup::ManMade => "man_made",
            InfraGroup::Military => "military",
            InfraGroup::Power => "power",
            InfraGroup::Railway => "railway",
            InfraGroup::Waterway => "waterway",
        }
    }
}

/// Secondary grouping of a category.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InfluenceClass {
    Motorized,
    NonMotorized,
    Group(InfraGroup),
}

impl InfluenceClass {
    pub fn label(&self) -> &'static str {
        match self {
            InfluenceClass::Motorized => "motorized",
            InfluenceClass::NonMotorized => "non_motorized",
            InfluenceClass::Group(g) => g.as_str(),
        }
    }
}

/// How a category takes part in the direct-influence merge.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CategoryRole {
    #[default]
    Primary,
    /// A secondary catalog describing the same physical features as the primary
    /// categories. Its direct field only fills cells no primary category reaches.
    Fill,
}

/// One infrastructure type and its importance weight.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Category {
    /// Presence layer key, unique within a table.
    pub key: String,
    pub weight: f32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub class: Option<InfluenceClass>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub role: CategoryRole,
    /// How the presence layer is resolved from the catalog.
    #[cfg_attr(feature = "serde", serde(default))]
    pub asset: AssetKind,
}

impl Category {
    /// A primary, time-stamped category without class.
    pub fn new(key: impl Into<String>, weight: f32) -> Self {
        Self {
            key: key.into(),
            weight,
            class: None,
            role: CategoryRole::Primary,
            asset: AssetKind::default(),
        }
    }

    pub fn with_class(mut self, class: InfluenceClass) -> Self {
        self.class = Some(class);
        self
    }

    /// Marks the category as fill for the primary categories.
    pub fn as_fill(mut self) -> Self {
        self.role = CategoryRole::Fill;
        self
    }

    pub fn with_asset(mut self, asset: AssetKind) -> Self {
        self.asset = asset;
        self
    }

    #[inline]
    pub fn is_fill(&self) -> bool {
        self.role == CategoryRole::Fill
    }
}

/// Validated, versioned mapping from category key to weight and class.
///
/// Tables also declare the key namespaces they cover (e.g. `highway`). Every presence
/// layer a catalog offers inside a covered namespace must either carry a weight or be
/// listed as deliberately ignored; see [`CategoryWeightTable::validate_against`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "WeightTableDef", into = "WeightTableDef")
)]
#[derive(Clone, Debug)]
pub struct CategoryWeightTable {
    version: String,
    categories: Vec<Category>,
    index: HashMap<String, usize>,
    namespaces: BTreeSet<String>,
    ignored: BTreeSet<String>,
}

impl CategoryWeightTable {
    pub fn builder(version: impl Into<String>) -> CategoryWeightTableBuilder {
        CategoryWeightTableBuilder {
            version: version.into(),
            categories: Vec::new(),
            namespaces: BTreeSet::new(),
            ignored: BTreeSet::new(),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Category> {
        self.index.get(key).map(|&i| &self.categories[i])
    }

    pub fn weight(&self, key: &str) -> Option<f32> {
        self.get(key).map(|c| c.weight)
    }

    /// Categories in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.key.as_str())
    }

    pub fn primaries(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter().filter(|c| !c.is_fill())
    }

    pub fn fills(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter().filter(|c| c.is_fill())
    }

    pub fn namespaces(&self) -> &BTreeSet<String> {
        &self.namespaces
    }

    /// Categories grouped by class. Unclassified categories are omitted.
    pub fn by_class(&self) -> BTreeMap<InfluenceClass, Vec<&Category>> {
        let mut out: BTreeMap<InfluenceClass, Vec<&Category>> = BTreeMap::new();
        for c in &self.categories {
            if let Some(class) = c.class {
                out.entry(class).or_default().push(c);
            }
        }
        out
    }

    pub fn in_class(&self, class: InfluenceClass) -> Vec<&Category> {
        self.categories
            .iter()
            .filter(|c| c.class == Some(class))
            .collect()
    }

    /// Checks the table against the presence keys a catalog offers.
    ///
    /// Fails with [`Error::InvalidWeightConfiguration`] when a weighted category has no
    /// presence layer, or when the catalog offers a layer inside one of the table's
    /// namespaces that is neither weighted nor ignored.
    pub fn validate_against(&self, presence_keys: &BTreeSet<String>) -> Result<()> {
        let missing: Vec<&str> = self
            .keys()
            .filter(|k| !presence_keys.contains(*k))
            .collect();
        if !missing.is_empty() {
            return Err(Error::InvalidWeightConfiguration(format!(
                "{}: weighted categories without presence data: {}",
                self.version,
                missing.join(", ")
            )));
        }

        let unweighted: Vec<&str> = presence_keys
            .iter()
            .map(String::as_str)
            .filter(|k| self.covers(k) && !self.index.contains_key(*k) && !self.ignored.contains(*k))
            .collect();
        if !unweighted.is_empty() {
            return Err(Error::InvalidWeightConfiguration(format!(
                "{}: presence layers without weight: {}",
                self.version,
                unweighted.join(", ")
            )));
        }

        Ok(())
    }

    /// Whether `key` falls inside one of the table's namespaces.
    pub fn covers(&self, key: &str) -> bool {
        self.namespaces.iter().any(|ns| {
            key == ns
                || key
                    .strip_prefix(ns.as_str())
                    .is_some_and(|rest| rest.starts_with('_'))
        })
    }

    /// A table holding only the fill categories, promoted to primary.
    pub fn fill_only(&self) -> Result<CategoryWeightTable> {
        let fills: Vec<Category> = self
            .fills()
            .cloned()
            .map(|mut c| {
                c.role = CategoryRole::Primary;
                c
            })
            .collect();
        if fills.is_empty() {
            return Err(Error::InvalidWeightConfiguration(format!(
                "{}: no fill categories to fall back to",
                self.version
            )));
        }
        CategoryWeightTable::builder(format!("{}/fill_only", self.version))
            .categories(fills)
            .build()
    }
}

/// Builder for [`CategoryWeightTable`].
pub struct CategoryWeightTableBuilder {
    version: String,
    categories: Vec<Category>,
    namespaces: BTreeSet<String>,
    ignored: BTreeSet<String>,
}

impl CategoryWeightTableBuilder {
    pub fn category(mut self, category: Category) -> Self {
        self.categories.push(category);
        self
    }

    pub fn categories(mut self, categories: impl IntoIterator<Item = Category>) -> Self {
        self.categories.extend(categories);
        self
    }

    /// Adds `(key, weight)` pairs sharing one class and asset kind.
    pub fn weights<'k>(
        mut self,
        class: Option<InfluenceClass>,
        asset: AssetKind,
        weights: impl IntoIterator<Item = (&'k str, f32)>,
    ) -> Self {
        for (key, weight) in weights {
            let mut c = Category::new(key, weight).with_asset(asset);
            c.class = class;
            self.categories.push(c);
        }
        self
    }

    pub fn namespace(mut self, ns: impl Into<String>) -> Self {
        self.namespaces.insert(ns.into());
        self
    }

    /// Declares a presence key inside a covered namespace that deliberately carries no weight.
    pub fn ignore(mut self, key: impl Into<String>) -> Self {
        self.ignored.insert(key.into());
        self
    }

    pub fn build(self) -> Result<CategoryWeightTable> {
        if self.version.is_empty() {
            return Err(Error::InvalidConfig("weight table version is empty".into()));
        }

        let mut index = HashMap::with_capacity(self.categories.len());
        for (i, c) in self.categories.iter().enumerate() {
            if c.key.is_empty() {
                return Err(Error::InvalidWeightConfiguration(format!(
                    "{}: category key is empty",
                    self.version
                )));
            }
            if !c.weight.is_finite() || c.weight <= 0.0 {
                return Err(Error::InvalidWeightConfiguration(format!(
                    "{}: category '{}' has non-positive weight {}",
                    self.version, c.key, c.weight
                )));
            }
            if index.insert(c.key.clone(), i).is_some() {
                return Err(Error::InvalidWeightConfiguration(format!(
                    "{}: duplicate category '{}'",
                    self.version, c.key
                )));
            }
        }

        if let Some(key) = self.ignored.iter().find(|k| index.contains_key(k.as_str())) {
            return Err(Error::InvalidWeightConfiguration(format!(
                "{}: category '{}' is both weighted and ignored",
                self.version, key
            )));
        }

        Ok(CategoryWeightTable {
            version: self.version,
            categories: self.categories,
            index,
            namespaces: self.namespaces,
            ignored: self.ignored,
        })
    }
}

/// Serialized form of a [`CategoryWeightTable`].
#[cfg(feature = "serde")]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WeightTableDef {
    pub version: String,
    pub categories: Vec<Category>,
    #[serde(default)]
    pub namespaces: BTreeSet<String>,
    #[serde(default)]
    pub ignored: BTreeSet<String>,
}

#[cfg(feature = "serde")]
impl TryFrom<WeightTableDef> for CategoryWeightTable {
    type Error = Error;

    fn try_from(def: WeightTableDef) -> Result<Self> {
        let mut builder = CategoryWeightTable::builder(def.version).categories(def.categories);
        builder.namespaces = def.namespaces;
        builder.ignored = def.ignored;
        builder.build()
    }
}

#[cfg(feature = "serde")]
impl From<CategoryWeightTable> for WeightTableDef {
    fn from(table: CategoryWeightTable) -> Self {
        WeightTableDef {
            version: table.version,
            categories: table.categories,
            namespaces: table.namespaces,
            ignored: table.ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn small_table() -> CategoryWeightTable {
        CategoryWeightTable::builder("test")
            .namespace("highway")
            .ignore("highway_proposed")
            .category(Category::new("highway_primary", 9.0).with_class(InfluenceClass::Motorized))
            .category(Category::new("highway_path", 2.0).with_class(InfluenceClass::NonMotorized))
            .category(
                Category::new("groads", 10.0)
                    .with_class(InfluenceClass::Motorized)
                    .with_asset(AssetKind::Static)
                    .as_fill(),
            )
            .build()
            .expect("valid table")
    }

    #[test]
    fn lookups_and_grouping() {
        let table = small_table();
        assert_eq!(table.len(), 3);
        assert_eq!(table.weight("highway_path"), Some(2.0));
        assert_eq!(table.primaries().count(), 2);
        assert_eq!(table.fills().map(|c| c.key.as_str()).collect::<Vec<_>>(), vec!["groads"]);

        let classes = table.by_class();
        assert_eq!(classes[&InfluenceClass::Motorized].len(), 2);
        assert_eq!(classes[&InfluenceClass::NonMotorized].len(), 1);
    }

    #[test]
    fn rejects_bad_weights_and_duplicates() {
        let zero = CategoryWeightTable::builder("v")
            .category(Category::new("a", 0.0))
            .build();
        assert!(matches!(zero, Err(Error::InvalidWeightConfiguration(_))));

        let nan = CategoryWeightTable::builder("v")
            .category(Category::new("a", f32::NAN))
            .build();
        assert!(nan.is_err());

        let dup = CategoryWeightTable::builder("v")
            .category(Category::new("a", 1.0))
            .category(Category::new("a", 2.0))
            .build();
        assert!(matches!(dup, Err(Error::InvalidWeightConfiguration(msg)) if msg.contains("duplicate")));
    }

    #[test]
    fn validate_requires_presence_for_every_weight() {
        let table = small_table();
        let err = table
            .validate_against(&keys(&["highway_primary", "groads"]))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidWeightConfiguration(msg) if msg.contains("highway_path")));
    }

    #[test]
    fn validate_rejects_unweighted_layers_in_namespace() {
        let table = small_table();
        let offered = keys(&[
            "highway_primary",
            "highway_path",
            "highway_proposed",
            "groads",
            "railway_rail",
            "highwayman",
        ]);
        assert!(table.validate_against(&offered).is_ok());

        let mut with_extra = offered.clone();
        with_extra.insert("highway_bus_stop".into());
        let err = table.validate_against(&with_extra).unwrap_err();
        assert!(err.is_preflight());
        assert!(err.to_string().contains("highway_bus_stop"));
    }

    #[test]
    fn fill_only_promotes_fills() {
        let table = small_table();
        let fallback = table.fill_only().unwrap();
        assert_eq!(fallback.len(), 1);
        assert_eq!(fallback.version(), "test/fill_only");
        let groads = fallback.get("groads").unwrap();
        assert_eq!(groads.role, CategoryRole::Primary);
        assert_eq!(groads.class, Some(InfluenceClass::Motorized));

        let no_fill = CategoryWeightTable::builder("v")
            .category(Category::new("a", 1.0))
            .build()
            .unwrap();
        assert!(no_fill.fill_only().is_err());
    }

    #[test]
    fn man_made_namespace_uses_full_prefix() {
        let table = CategoryWeightTable::builder("infra")
            .namespace(InfraGroup::ManMade.as_str())
            .category(Category::new("man_made_pier", 10.0))
            .build()
            .unwrap();
        assert!(table.covers("man_made_tower"));
        assert!(!table.covers("man_hole"));
    }
}
