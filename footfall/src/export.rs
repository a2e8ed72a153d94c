//! GeoJSON views of everything the engine produces, for renderers and for debugging.

use geojson::{Feature, FeatureCollection};

use crate::{Area, Attractor, AttractorSource, ForceField, HourOfWeek, PresencePoint};

fn feature(geometry: geojson::Geometry) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties: None,
        foreign_members: None,
    }
}

fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

pub fn attractors_to_geojson(attractors: &[Attractor]) -> FeatureCollection {
    let mut features = Vec::new();
    for a in attractors {
        if !a.pt.is_valid() {
            continue;
        }
        let mut f = feature(a.pt.to_geojson());
        f.set_property("id", a.id.clone());
        f.set_property("strength", a.strength);
        f.set_property(
            "source",
            match a.source {
                AttractorSource::Observed => "observed",
                AttractorSource::Inferred => "inferred",
            },
        );
        f.set_property("tags", a.tags.iter().cloned().collect::<Vec<_>>());
        features.push(f);
    }
    collection(features)
}

/// One point per grid cell. Cells with no force are left out unless `include_zero` is set.
pub fn field_to_geojson(field: &ForceField, include_zero: bool) -> FeatureCollection {
    let mut features = Vec::new();
    for cell in field.cells() {
        if !include_zero && cell.fx == 0.0 && cell.fy == 0.0 {
            continue;
        }
        let mut f = feature(cell.pt.to_geojson());
        f.set_property("fx", cell.fx);
        f.set_property("fy", cell.fy);
        f.set_property("magnitude", (cell.fx * cell.fx + cell.fy * cell.fy).sqrt());
        features.push(f);
    }
    collection(features)
}

pub fn points_to_geojson(points: &[PresencePoint]) -> FeatureCollection {
    let features = points
        .iter()
        .map(|p| {
            let mut f = feature(p.pt.to_geojson());
            f.set_property("id", p.id.0);
            f.set_property("area", p.area.0.clone());
            f.set_property("anchored", p.anchored);
            if let Some(ref attractor) = p.attractor {
                f.set_property("attractor", attractor.clone());
            }
            if p.is_static {
                f.set_property("static", true);
            }
            if let Some(ref color) = p.color {
                f.set_property("color", color.clone());
            }
            f
        })
        .collect();
    collection(features)
}

/// Well-formed areas with their average presence at this hour, if there is one.
pub fn areas_to_geojson(areas: &[Area], hour: HourOfWeek) -> FeatureCollection {
    let mut features = Vec::new();
    for area in areas {
        let ring = match area.polygon() {
            Ok(ring) => ring,
            Err(_) => continue,
        };
        let mut f = feature(ring.to_geojson());
        f.set_property("id", area.id.0.clone());
        if let Some(presence) = area.average_presence(hour) {
            f.set_property("average_presence", presence);
        }
        features.push(f);
    }
    collection(features)
}
