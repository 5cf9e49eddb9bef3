//! Built-in, versioned category weight tables.
//!
//! Weights follow the relative importance of OpenStreetMap feature keys
//! (<https://wiki.openstreetmap.org/wiki/Key:highway>) on a 2–10 scale.
use crate::driver::catalog::AssetKind;
use crate::driver::category::{
    Category, CategoryWeightTable, CategoryWeightTableBuilder, InfluenceClass, InfraGroup,
};
use crate::error::Result;

/// Maximum age of the OpenStreetMap road collection.
pub const OSM_MAX_AGE_DAYS: u32 = 365;

/// Key of the secondary global roads catalog used as fill by the road drivers.
pub const GROADS_KEY: &str = "groads";

/// Key of the global roads additions used by the infrastructure driver.
pub const GROADS_ADDITIONS_KEY: &str = "groads_additions";

const MOTORIZED: &[(&str, f32)] = &[
    ("highway_motorway", 10.0),
    ("highway_trunk", 10.0),
    ("highway_primary", 9.0),
    ("highway_secondary", 9.0),
    ("highway_tertiary", 8.0),
    ("highway_unclassified", 7.0),
    ("highway_residential", 7.0),
    ("highway_motorway_link", 10.0),
    ("highway_trunk_link", 10.0),
    ("highway_primary_link", 9.0),
    ("highway_secondary_link", 9.0),
    ("highway_tertiary_link", 8.0),
    ("highway_living_street", 7.0),
    ("highway_service", 8.0),
    ("highway_pedestrian", 6.0),
    ("highway_track", 5.0),
    ("highway_bus_guideway", 8.0),
    ("highway_escape", 8.0),
    ("highway_raceway", 8.0),
    ("highway_road", 10.0),
    ("highway_elevator", 8.0),
    ("highway_mini_roundabout", 8.0),
    ("highway_rest_area", 7.0),
    ("highway_turning_circle", 8.0),
];

const NON_MOTORIZED: &[(&str, f32)] = &[
    ("highway_footway", 2.0),
    ("highway_bridleway", 3.0),
    ("highway_steps", 4.0),
    ("highway_path", 2.0),
    ("highway_cycleway", 4.0),
];

fn road_builder(version: &str) -> CategoryWeightTableBuilder {
    let osm = AssetKind::time_stamped(OSM_MAX_AGE_DAYS);
    CategoryWeightTable::builder(version)
        .namespace(InfraGroup::Highway.as_str())
        .weights(Some(InfluenceClass::Motorized), osm, MOTORIZED.iter().copied())
        .weights(
            Some(InfluenceClass::NonMotorized),
            osm,
            NON_MOTORIZED.iter().copied(),
        )
        .category(
            Category::new(GROADS_KEY, 10.0)
                .with_class(InfluenceClass::Motorized)
                .with_asset(AssetKind::Static)
                .as_fill(),
        )
}

/// Road weights shared by the mid-generation and final road drivers.
pub fn road_weights() -> Result<CategoryWeightTable> {
    road_builder("road_v3").build()
}

pub fn road_weights_v2() -> Result<CategoryWeightTable> {
    road_builder("road_v2").build()
}

const AEROWAY: &[(&str, f32)] = &[
    ("aeroway_aerodrome", 10.0),
    ("aeroway_apron", 10.0),
    ("aeroway_hangar", 10.0),
    ("aeroway_helipad", 10.0),
    ("aeroway_heliport", 10.0),
    ("aeroway_runway", 10.0),
    ("aeroway_spaceport", 10.0),
    ("aeroway_taxiway", 10.0),
    ("aeroway_terminal", 10.0),
];

const AMENITY: &[(&str, f32)] = &[
    ("amenity_aerialway", 5.0),
    ("amenity_alpinecampwild", 4.0),
    ("amenity_fuel", 10.0),
    ("amenity_sanitary_dump_station", 10.0),
];

const BARRIER: &[(&str, f32)] = &[
    ("barrier_city_wall", 8.0),
    ("barrier_ditch", 8.0),
    ("barrier_hedge", 2.0),
    ("barrier_retaining_wall", 8.0),
    ("barrier_wall", 8.0),
];

const HIGHWAY: &[(&str, f32)] = &[
    ("highway_bridleway", 10.0),
    ("highway_bus_guideway", 10.0),
    ("highway_cycleway", 10.0),
    ("highway_elevator", 10.0),
    ("highway_escape", 4.0),
    ("highway_footway", 4.0),
    ("highway_living_street", 10.0),
    ("highway_mini_roundabout", 10.0),
    ("highway_motorway", 10.0),
    ("highway_motorway_link", 10.0),
    ("highway_path", 4.0),
    ("highway_pedestrian", 4.0),
    ("highway_primary", 10.0),
    ("highway_primary_link", 10.0),
    ("highway_raceway", 10.0),
    ("highway_rest_area", 10.0),
    ("highway_road", 10.0),
    ("highway_secondary", 10.0),
    ("highway_secondary_link", 10.0),
    ("highway_service", 10.0),
    ("highway_steps", 4.0),
    ("highway_tertiary", 10.0),
    ("highway_tertiary_link", 10.0),
    ("highway_track", 4.0),
    ("highway_trunk", 10.0),
    ("highway_trunk_link", 10.0),
    ("highway_turning_circle", 10.0),
    ("highway_unclassified", 10.0),
];

const LANDUSE: &[(&str, f32)] = &[
    ("landuse_basin", 10.0),
    ("landuse_cemetery", 4.0),
    ("landuse_industrial", 10.0),
    ("landuse_landfill", 10.0),
    ("landuse_quarry", 10.0),
    ("landuse_salt_pond", 4.0),
    ("landuse_village_green", 4.0),
];

const LEISURE: &[(&str, f32)] = &[
    ("leisure_beach_resort", 4.0),
    ("leisure_golf_course", 4.0),
    ("leisure_marina", 4.0),
    ("leisure_pitch", 4.0),
];

const MAN_MADE: &[(&str, f32)] = &[
    ("man_made_adit", 10.0),
    ("man_made_beacon", 10.0),
    ("man_made_breakwater", 10.0),
    ("man_made_chimney", 10.0),
    ("man_made_communications_tower", 10.0),
    ("man_made_dyke", 10.0),
    ("man_made_embankment", 10.0),
    ("man_made_gasometer", 10.0),
    ("man_made_groyne", 10.0),
    ("man_made_lighthouse", 10.0),
    ("man_made_mast", 10.0),
    ("man_made_mineshaft", 10.0),
    ("man_made_observatorytelescope", 10.0),
    ("man_made_petroleum_well", 10.0),
    ("man_made_pier", 10.0),
    ("man_made_pipeline", 10.0),
    ("man_made_pumping_station", 10.0),
    ("man_made_reservoir_covered", 10.0),
    ("man_made_silo", 10.0),
    ("man_made_snow_fence", 4.0),
    ("man_made_storage_tank", 10.0),
    ("man_made_tower", 10.0),
    ("man_made_wastewater_plant", 10.0),
    ("man_made_water_tower", 10.0),
    ("man_made_water_well", 10.0),
    ("man_made_water_works", 10.0),
    ("man_made_watermill", 10.0),
    ("man_made_windmill", 10.0),
    ("man_made_works", 10.0),
];

const MILITARY: &[(&str, f32)] = &[
    ("military_airfield", 10.0),
    ("military_ammunition", 10.0),
    ("military_barracks", 10.0),
    ("military_bunker", 10.0),
    ("military_checkpoint", 10.0),
    ("military_danger_area", 8.0),
    ("military_naval_base", 10.0),
    ("military_nuclear_explosion_site", 10.0),
    ("military_range", 8.0),
    ("military_trench", 8.0),
];

const POWER: &[(&str, f32)] = &[
    ("power_cable", 8.0),
    ("power_heliostat", 10.0),
    ("power_line", 8.0),
    ("power_substation", 10.0),
    ("power_xbio", 10.0),
    ("power_xcoal", 10.0),
    ("power_xhydro", 10.0),
    ("power_xnuclear", 10.0),
    ("power_xoil", 10.0),
    ("power_xother", 10.0),
    ("power_xsolar", 10.0),
    ("power_xwaste", 10.0),
    ("power_xwind", 10.0),
];

const RAILWAY: &[(&str, f32)] = &[
    ("railway_abandoned", 4.0),
    ("railway_disused", 4.0),
    ("railway_funicular", 10.0),
    ("railway_halt", 10.0),
    ("railway_light_rail", 10.0),
    ("railway_miniature", 10.0),
    ("railway_monorail", 10.0),
    ("railway_narrow_gauge", 10.0),
    ("railway_platform", 10.0),
    ("railway_preserved", 10.0),
    ("railway_rail", 10.0),
    ("railway_station", 10.0),
    ("railway_subway", 10.0),
    ("railway_tram", 10.0),
];

const WATERWAY: &[(&str, f32)] = &[
    ("waterway_canal", 10.0),
    ("waterway_dam", 10.0),
    ("waterway_ditch", 4.0),
    ("waterway_drain", 4.0),
    ("waterway_lock_gate", 10.0),
    ("waterway_weir", 4.0),
];

fn group_weights(group: InfraGroup) -> &'static [(&'static str, f32)] {
    match group {
        InfraGroup::Aeroway => AEROWAY,
        InfraGroup::Amenity => AMENITY,
        InfraGroup::Barrier => BARRIER,
        InfraGroup::Highway => HIGHWAY,
        InfraGroup::Landuse => LANDUSE,
        InfraGroup::Leisure => LEISURE,
        InfraGroup::ManMade => MAN_MADE,
        InfraGroup::Military => MILITARY,
        InfraGroup::Power => POWER,
        InfraGroup::Railway => RAILWAY,
        InfraGroup::Waterway => WATERWAY,
    }
}

/// Weights of the composite infrastructure driver, one table across all groups.
pub fn infrastructure_weights() -> Result<CategoryWeightTable> {
    let osm = AssetKind::TimeStamped { max_age_days: None };
    let mut builder = CategoryWeightTable::builder("infrastructure_v1")
        // Residential streets carry no infrastructure weight in this generation.
        .ignore("highway_residential");
    for group in InfraGroup::ALL {
        builder = builder.namespace(group.as_str()).weights(
            Some(InfluenceClass::Group(group)),
            osm,
            group_weights(group).iter().copied(),
        );
    }
    builder
        .category(
            Category::new(GROADS_ADDITIONS_KEY, 10.0)
                .with_class(InfluenceClass::Group(InfraGroup::Highway))
                .with_asset(AssetKind::Static),
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::category::CategoryRole;

    #[test]
    fn road_table_has_both_classes_and_one_fill() {
        let table = road_weights().unwrap();
        assert_eq!(table.len(), MOTORIZED.len() + NON_MOTORIZED.len() + 1);
        assert_eq!(table.in_class(InfluenceClass::NonMotorized).len(), 5);
        assert_eq!(table.weight("highway_primary"), Some(9.0));
        assert_eq!(table.weight("highway_footway"), Some(2.0));

        let fills: Vec<_> = table.fills().collect();
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].key, GROADS_KEY);
        assert_eq!(fills[0].asset, AssetKind::Static);
        assert_eq!(
            table.get("highway_track").unwrap().asset,
            AssetKind::time_stamped(365)
        );
    }

    #[test]
    fn weights_stay_within_observed_range() {
        for table in [road_weights().unwrap(), infrastructure_weights().unwrap()] {
            assert!(table.iter().all(|c| (2.0..=10.0).contains(&c.weight)));
        }
    }

    #[test]
    fn infrastructure_table_groups_every_category() {
        let table = infrastructure_weights().unwrap();
        let classes = table.by_class();
        assert_eq!(classes.len(), InfraGroup::ALL.len());
        assert_eq!(
            classes[&InfluenceClass::Group(InfraGroup::Highway)].len(),
            HIGHWAY.len() + 1
        );
        // Summed into the highway group like any mapped road.
        assert_eq!(
            table.get(GROADS_ADDITIONS_KEY).unwrap().role,
            CategoryRole::Primary
        );
        assert_eq!(table.fills().count(), 0);
        assert!(table.fill_only().is_err());
        assert_eq!(table.weight("man_made_snow_fence"), Some(4.0));
        assert!(table.covers("man_made_crane"));
    }

    #[test]
    fn road_highway_keys_cover_infrastructure_highway_keys() {
        let roads = road_weights().unwrap();
        for (key, _) in HIGHWAY {
            assert!(roads.get(key).is_some(), "{key}");
        }
    }
}
