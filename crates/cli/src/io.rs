//! GeoJSON exchange: parcel, road and building layers.
//!
//! Parcel properties `community`, `section`, `number`, `mark` (code -1 / 0 / 1)
//! and `simulated` map onto `ParcelAttributes`; any other property is carried
//! through `extra` as a string.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use geo::{Geometry as GeoGeometry, LineString, MultiPolygon, Polygon};
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, Value};
use serde_json::Value as JsonValue;

use parcelsplit::{Mark, Parcel, ParcelAttributes};

const KNOWN: [&str; 5] = ["community", "section", "number", "mark", "simulated"];

fn read_features(path: &Path) -> Result<Vec<Feature>> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let doc: GeoJson = raw
        .parse()
        .with_context(|| format!("parsing GeoJSON {}", path.display()))?;
    Ok(match doc {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(g) => vec![Feature {
            bbox: None,
            geometry: Some(g),
            id: None,
            properties: None,
            foreign_members: None,
        }],
    })
}

fn to_geo(feature: &Feature) -> Result<Option<GeoGeometry<f64>>> {
    match &feature.geometry {
        Some(g) => Ok(Some(GeoGeometry::try_from(g.value.clone())?)),
        None => Ok(None),
    }
}

fn areal(geom: GeoGeometry<f64>) -> Option<MultiPolygon<f64>> {
    match geom {
        GeoGeometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        GeoGeometry::MultiPolygon(mp) => Some(mp),
        _ => None,
    }
}

fn text(v: &JsonValue) -> String {
    match v {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

fn attributes(props: Option<&JsonObject>) -> Result<ParcelAttributes> {
    let mut attrs = ParcelAttributes::default();
    let Some(props) = props else {
        return Ok(attrs);
    };
    for (key, value) in props {
        match key.as_str() {
            "community" => attrs.community = text(value),
            "section" => attrs.section = text(value),
            "number" => attrs.number = text(value),
            "mark" => {
                attrs.mark = match value {
                    JsonValue::Null => Mark::Unset,
                    JsonValue::Bool(b) => {
                        if *b {
                            Mark::Split
                        } else {
                            Mark::Skip
                        }
                    }
                    other => {
                        let code = other
                            .as_i64()
                            .or_else(|| other.as_str().and_then(|s| s.trim().parse().ok()))
                            .ok_or_else(|| anyhow!("mark must be an integer code, got {other}"))?;
                        Mark::from_code(code).ok_or_else(|| anyhow!("unknown mark code {code}"))?
                    }
                }
            }
            "simulated" => {
                attrs.simulated = match value {
                    JsonValue::Bool(b) => *b,
                    JsonValue::Number(n) => n.as_i64() == Some(1),
                    JsonValue::String(s) => matches!(s.as_str(), "true" | "1"),
                    _ => false,
                }
            }
            _ => {
                attrs.extra.insert(key.clone(), text(value));
            }
        }
    }
    Ok(attrs)
}

/// Parcels of a GeoJSON layer; features with non-areal geometry are an error.
pub fn read_parcels(path: &Path) -> Result<Vec<Parcel>> {
    let mut out = Vec::new();
    for (i, feature) in read_features(path)?.iter().enumerate() {
        let Some(geom) = to_geo(feature)? else {
            tracing::warn!(feature = i, "parcel without geometry skipped");
            continue;
        };
        let Some(geometry) = areal(geom) else {
            bail!("feature {i} of {} is not a polygon", path.display());
        };
        let attrs = attributes(feature.properties.as_ref())
            .with_context(|| format!("feature {i} of {}", path.display()))?;
        out.push(Parcel::new(geometry, attrs));
    }
    Ok(out)
}

/// Road lines; polygon features contribute their rings.
pub fn read_lines(path: &Path) -> Result<Vec<LineString<f64>>> {
    let mut out = Vec::new();
    for feature in read_features(path)? {
        match to_geo(&feature)? {
            Some(GeoGeometry::LineString(ls)) => out.push(ls),
            Some(GeoGeometry::MultiLineString(mls)) => out.extend(mls.0),
            Some(geom) => {
                if let Some(mp) = areal(geom) {
                    for p in mp.0 {
                        let (exterior, interiors) = p.into_inner();
                        out.push(exterior);
                        out.extend(interiors);
                    }
                }
            }
            None => {}
        }
    }
    Ok(out)
}

/// Polygons of a layer (buildings); other geometry types are ignored.
pub fn read_polygons(path: &Path) -> Result<Vec<Polygon<f64>>> {
    let mut out = Vec::new();
    for feature in read_features(path)? {
        if let Some(mp) = to_geo(&feature)?.and_then(areal) {
            out.extend(mp.0);
        }
    }
    Ok(out)
}

fn feature(parcel: &Parcel) -> Feature {
    let a = &parcel.attributes;
    let mut props = JsonObject::new();
    props.insert("community".into(), a.community.clone().into());
    props.insert("section".into(), a.section.clone().into());
    props.insert("number".into(), a.number.clone().into());
    props.insert("mark".into(), a.mark.code().into());
    props.insert("simulated".into(), a.simulated.into());
    for (k, v) in &a.extra {
        if !KNOWN.contains(&k.as_str()) {
            props.insert(k.clone(), v.clone().into());
        }
    }
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::from(&parcel.geometry))),
        id: None,
        properties: Some(props),
        foreign_members: None,
    }
}

/// Write parcels as a `FeatureCollection`, creating parent directories.
pub fn write_parcels(path: &Path, parcels: &[Parcel]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating output dir {}", parent.display()))?;
        }
    }
    let fc = FeatureCollection {
        bbox: None,
        features: parcels.iter().map(feature).collect(),
        foreign_members: None,
    };
    fs::write(path, GeoJson::from(fc).to_string())
        .with_context(|| format!("writing {}", path.display()))
}
