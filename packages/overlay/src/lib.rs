#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! GeoJSON map layers.
//!
//! Every layer is a `FeatureCollection` of `Point` features. Circle-style
//! layers carry `radius` (meters) and `color` properties for the map client
//! to draw with; every feature carries a `layer` property so the combined
//! collection can be split back apart.

use crime_oracle_hotspot_models::{Centroid, Hotspot, HotspotTier};
use crime_oracle_incident_models::{IncidentPoint, PoliceStation};
use crime_oracle_projection_models::ProjectionReport;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};

/// Radius of a hotspot circle, in meters.
pub const HOTSPOT_RADIUS_METERS: f64 = 700.0;

/// Radius of a predicted-risk ring, in meters.
pub const PREDICTION_RADIUS_METERS: f64 = 1200.0;

/// Predicted counts above this get a risk ring.
pub const PREDICTION_RING_THRESHOLD: u64 = 15;

/// Station marker color.
pub const STATION_COLOR: &str = "blue";

/// Predicted-risk ring color.
pub const PREDICTION_COLOR: &str = "darkred";

/// Layer names used in the `layer` property.
pub mod layer {
    /// One point per incident.
    pub const INCIDENTS: &str = "incidents";
    /// Hotspot circles.
    pub const HOTSPOTS: &str = "hotspots";
    /// Police station markers.
    pub const STATIONS: &str = "stations";
    /// Predicted-risk rings.
    pub const PREDICTIONS: &str = "predictions";
}

/// Circle color for a hotspot tier.
#[must_use]
pub const fn tier_color(tier: HotspotTier) -> &'static str {
    match tier {
        HotspotTier::High => "red",
        HotspotTier::Medium => "orange",
        HotspotTier::Low => "lime",
    }
}

/// Everything a full map needs.
#[derive(Debug, Clone, Copy)]
pub struct MapLayers<'a> {
    /// Historical incidents.
    pub incidents: &'a [IncidentPoint],
    /// Partitioned hotspots.
    pub hotspots: &'a [Hotspot],
    /// Police stations.
    pub stations: &'a [PoliceStation],
    /// Projection to draw rings for, if any.
    pub report: Option<&'a ProjectionReport>,
}

impl MapLayers<'_> {
    /// Concatenates every layer into one collection: incidents, hotspots,
    /// stations, then predictions.
    #[must_use]
    pub fn to_feature_collection(&self) -> FeatureCollection {
        let mut features = incident_layer(self.incidents).features;
        features.extend(hotspot_layer(self.hotspots).features);
        features.extend(station_layer(self.stations).features);
        if let Some(report) = self.report {
            features.extend(prediction_layer(report, self.hotspots).features);
        }
        collection(features)
    }
}

/// One point per incident, with its category and date when known.
#[must_use]
pub fn incident_layer(incidents: &[IncidentPoint]) -> FeatureCollection {
    collection(
        incidents
            .iter()
            .map(|incident| {
                let mut properties = layer_properties(layer::INCIDENTS);
                if let Some(category) = &incident.category {
                    properties.insert("category".to_string(), category.clone().into());
                }
                if let Some(date) = incident.occurred_on {
                    properties.insert("date".to_string(), date.to_string().into());
                }
                point_feature(incident.latitude, incident.longitude, properties)
            })
            .collect(),
    )
}

/// One circle per hotspot, colored by tier.
#[must_use]
pub fn hotspot_layer(hotspots: &[Hotspot]) -> FeatureCollection {
    collection(
        hotspots
            .iter()
            .map(|hotspot| {
                let mut properties = layer_properties(layer::HOTSPOTS);
                properties.insert("index".to_string(), hotspot.index.into());
                properties.insert("name".to_string(), hotspot.name.clone().into());
                properties.insert("memberCount".to_string(), hotspot.member_count.into());
                properties.insert("tier".to_string(), hotspot.tier.to_string().into());
                properties.insert("color".to_string(), tier_color(hotspot.tier).into());
                properties.insert("radius".to_string(), HOTSPOT_RADIUS_METERS.into());
                point_at(hotspot.centroid, properties)
            })
            .collect(),
    )
}

/// One marker per police station.
#[must_use]
pub fn station_layer(stations: &[PoliceStation]) -> FeatureCollection {
    collection(
        stations
            .iter()
            .map(|station| {
                let mut properties = layer_properties(layer::STATIONS);
                properties.insert("name".to_string(), station.name.clone().into());
                properties.insert("color".to_string(), STATION_COLOR.into());
                point_feature(station.latitude, station.longitude, properties)
            })
            .collect(),
    )
}

/// One ring per projection whose predicted count exceeds
/// [`PREDICTION_RING_THRESHOLD`], centered on the matching hotspot.
/// Projections whose hotspot index is not in `hotspots` are skipped.
#[must_use]
pub fn prediction_layer(report: &ProjectionReport, hotspots: &[Hotspot]) -> FeatureCollection {
    collection(
        report
            .projections
            .iter()
            .filter(|p| p.predicted_count > PREDICTION_RING_THRESHOLD)
            .filter_map(|p| {
                let hotspot = hotspots.iter().find(|h| h.index == p.hotspot_index)?;
                let mut properties = layer_properties(layer::PREDICTIONS);
                properties.insert("name".to_string(), p.hotspot_name.clone().into());
                properties.insert("date".to_string(), p.target_date.to_string().into());
                properties.insert("predictedCount".to_string(), p.predicted_count.into());
                properties.insert("tier".to_string(), p.tier.to_string().into());
                properties.insert("alert".to_string(), p.alert.into());
                properties.insert("color".to_string(), PREDICTION_COLOR.into());
                properties.insert("radius".to_string(), PREDICTION_RADIUS_METERS.into());
                Some(point_at(hotspot.centroid, properties))
            })
            .collect(),
    )
}

/// Mean incident position, for centering a map. `None` when empty.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn map_center(incidents: &[IncidentPoint]) -> Option<Centroid> {
    if incidents.is_empty() {
        return None;
    }
    let n = incidents.len() as f64;
    let (lat, lon) = incidents.iter().fold((0.0, 0.0), |(lat, lon), i| {
        (lat + i.latitude, lon + i.longitude)
    });
    Some(Centroid {
        latitude: lat / n,
        longitude: lon / n,
    })
}

fn layer_properties(name: &str) -> JsonObject {
    let mut properties = JsonObject::new();
    properties.insert("layer".to_string(), JsonValue::from(name));
    properties
}

fn point_at(centroid: Centroid, properties: JsonObject) -> Feature {
    point_feature(centroid.latitude, centroid.longitude, properties)
}

/// GeoJSON positions are `[longitude, latitude]`.
fn point_feature(latitude: f64, longitude: f64, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![longitude, latitude]))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

const fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}
