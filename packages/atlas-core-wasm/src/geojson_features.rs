use serde_json::{json, Map, Value};

use crate::console_log;
use crate::error::DecodeError;

/// Label used for features that carry no `name` property.
pub const UNKNOWN_FEATURE_NAME: &str = "Unknown";

/// A decoded GeoJSON document. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: GeometryCoordinates,
    pub properties: Option<Properties>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    pub name: Option<String>,
    pub number: Option<i64>,
}

impl Feature {
    /// Display name, falling back to "Unknown".
    pub fn name(&self) -> &str {
        self.properties
            .as_ref()
            .and_then(|p| p.name.as_deref())
            .unwrap_or(UNKNOWN_FEATURE_NAME)
    }
}

/// Coordinates of one geometry, with the array rank fixed by the variant.
///
/// `MultiPoint`, `MultiLineString` and `GeometryCollection` are valid GeoJSON
/// and decode strictly, but the pipeline does not render them.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryCoordinates {
    Point(Vec<f64>),
    LineString(Vec<Vec<f64>>),
    Polygon(Vec<Vec<Vec<f64>>>),
    MultiPolygon(Vec<Vec<Vec<Vec<f64>>>>),
    MultiPoint(Vec<Vec<f64>>),
    MultiLineString(Vec<Vec<Vec<f64>>>),
    GeometryCollection(Vec<GeometryCoordinates>),
}

impl GeometryCoordinates {
    /// The GeoJSON type tag for this geometry.
    pub fn kind(&self) -> &'static str {
        match self {
            GeometryCoordinates::Point(_) => "Point",
            GeometryCoordinates::LineString(_) => "LineString",
            GeometryCoordinates::Polygon(_) => "Polygon",
            GeometryCoordinates::MultiPolygon(_) => "MultiPolygon",
            GeometryCoordinates::MultiPoint(_) => "MultiPoint",
            GeometryCoordinates::MultiLineString(_) => "MultiLineString",
            GeometryCoordinates::GeometryCollection(_) => "GeometryCollection",
        }
    }

    /// Re-encode the coordinate payload with the same nesting it was decoded from.
    pub fn coordinates_to_value(&self) -> Value {
        match self {
            GeometryCoordinates::Point(c) => json!(c),
            GeometryCoordinates::LineString(c) => json!(c),
            GeometryCoordinates::Polygon(c) => json!(c),
            GeometryCoordinates::MultiPolygon(c) => json!(c),
            GeometryCoordinates::MultiPoint(c) => json!(c),
            GeometryCoordinates::MultiLineString(c) => json!(c),
            GeometryCoordinates::GeometryCollection(geometries) => {
                Value::Array(geometries.iter().map(|g| g.to_value()).collect())
            }
        }
    }

    /// Re-encode as a GeoJSON geometry object.
    pub fn to_value(&self) -> Value {
        match self {
            GeometryCoordinates::GeometryCollection(_) => json!({
                "type": self.kind(),
                "geometries": self.coordinates_to_value(),
            }),
            _ => json!({
                "type": self.kind(),
                "coordinates": self.coordinates_to_value(),
            }),
        }
    }

    /// Visit every coordinate pair with at least two components.
    pub fn for_each_lon_lat<F: FnMut(f64, f64)>(&self, f: &mut F) {
        fn visit<F: FnMut(f64, f64)>(positions: &[Vec<f64>], f: &mut F) {
            for p in positions.iter().filter(|p| p.len() >= 2) {
                f(p[0], p[1]);
            }
        }
        match self {
            GeometryCoordinates::Point(p) => {
                if p.len() >= 2 {
                    f(p[0], p[1]);
                }
            }
            GeometryCoordinates::LineString(line) | GeometryCoordinates::MultiPoint(line) => {
                visit(line, f)
            }
            GeometryCoordinates::Polygon(rings) | GeometryCoordinates::MultiLineString(rings) => {
                rings.iter().for_each(|r| visit(r, f))
            }
            GeometryCoordinates::MultiPolygon(polygons) => polygons
                .iter()
                .flat_map(|rings| rings.iter())
                .for_each(|r| visit(r, f)),
            GeometryCoordinates::GeometryCollection(geometries) => {
                geometries.iter().for_each(|g| g.for_each_lon_lat(f))
            }
        }
    }
}

/// Decode a GeoJSON FeatureCollection from raw bytes.
///
/// Decoding is strict: each geometry's coordinate nesting must match its
/// type tag, and an unknown tag fails the whole document. Missing
/// properties are not an error.
pub fn decode_feature_collection(bytes: &[u8]) -> Result<FeatureCollection, DecodeError> {
    console_log!(target: MapData, "JSON data loaded: {} bytes", bytes.len());

    let document: Value = serde_json::from_slice(bytes)?;
    let root = expect_object(&document, "$")?;

    match root.get("type").and_then(Value::as_str) {
        Some("FeatureCollection") => {}
        Some(other) => {
            return Err(DecodeError::NotAFeatureCollection {
                found: other.to_string(),
            })
        }
        None => {
            return Err(DecodeError::MissingField {
                field: "type",
                location: "$".to_string(),
            })
        }
    }

    let raw_features = root
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| DecodeError::MissingField {
            field: "features",
            location: "$".to_string(),
        })?;

    let features = raw_features
        .iter()
        .enumerate()
        .map(|(i, raw)| decode_feature(raw, &format!("features[{}]", i)))
        .collect::<Result<Vec<_>, _>>()?;

    console_log!(target: MapData, "GeoJSON decoded successfully, total features: {}", features.len());
    Ok(FeatureCollection { features })
}

fn decode_feature(raw: &Value, location: &str) -> Result<Feature, DecodeError> {
    let object = expect_object(raw, location)?;

    let geometry_location = format!("{}.geometry", location);
    let geometry = match object.get("geometry") {
        Some(g) if !g.is_null() => decode_geometry(g, &geometry_location)?,
        _ => {
            return Err(DecodeError::MissingField {
                field: "geometry",
                location: location.to_string(),
            })
        }
    };

    let properties = object
        .get("properties")
        .and_then(Value::as_object)
        .map(|p| Properties {
            name: p.get("name").and_then(Value::as_str).map(str::to_string),
            number: p.get("number").and_then(Value::as_i64),
        });

    Ok(Feature {
        geometry,
        properties,
    })
}

fn decode_geometry(raw: &Value, location: &str) -> Result<GeometryCoordinates, DecodeError> {
    let object = expect_object(raw, location)?;
    let geometry_type = object
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| DecodeError::MissingField {
            field: "type",
            location: location.to_string(),
        })?;

    if geometry_type == "GeometryCollection" {
        let members = object
            .get("geometries")
            .and_then(Value::as_array)
            .ok_or_else(|| DecodeError::MissingField {
                field: "geometries",
                location: location.to_string(),
            })?;
        let geometries = members
            .iter()
            .enumerate()
            .map(|(i, g)| decode_geometry(g, &format!("{}.geometries[{}]", location, i)))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(GeometryCoordinates::GeometryCollection(geometries));
    }

    const KNOWN: [&str; 6] = ["Point", "LineString", "Polygon", "MultiPolygon", "MultiPoint", "MultiLineString"];
    if !KNOWN.contains(&geometry_type) {
        return Err(DecodeError::UnknownGeometryType {
            geometry_type: geometry_type.to_string(),
            location: location.to_string(),
        });
    }

    let coordinates_location = format!("{}.coordinates", location);
    let coordinates = object
        .get("coordinates")
        .ok_or_else(|| DecodeError::MissingField {
            field: "coordinates",
            location: location.to_string(),
        })?;

    let ctx = RankContext { geometry_type };
    let loc = coordinates_location.as_str();
    match geometry_type {
        "Point" => Ok(GeometryCoordinates::Point(ctx.position(coordinates, loc)?)),
        "LineString" => Ok(GeometryCoordinates::LineString(ctx.positions(coordinates, loc)?)),
        "Polygon" => Ok(GeometryCoordinates::Polygon(ctx.rings(coordinates, loc)?)),
        "MultiPolygon" => Ok(GeometryCoordinates::MultiPolygon(ctx.polygons(coordinates, loc)?)),
        "MultiPoint" => Ok(GeometryCoordinates::MultiPoint(ctx.positions(coordinates, loc)?)),
        "MultiLineString" => Ok(GeometryCoordinates::MultiLineString(ctx.rings(coordinates, loc)?)),
        other => Err(DecodeError::UnknownGeometryType {
            geometry_type: other.to_string(),
            location: location.to_string(),
        }),
    }
}

fn expect_object<'a>(value: &'a Value, location: &str) -> Result<&'a Map<String, Value>, DecodeError> {
    value.as_object().ok_or_else(|| DecodeError::MissingField {
        field: "object",
        location: location.to_string(),
    })
}

// Carries the declared type tag so rank errors can name it.
struct RankContext<'a> {
    geometry_type: &'a str,
}

impl RankContext<'_> {
    fn mismatch(&self, location: &str, detail: impl Into<String>) -> DecodeError {
        DecodeError::RankMismatch {
            geometry_type: self.geometry_type.to_string(),
            location: location.to_string(),
            detail: detail.into(),
        }
    }

    fn array<'v>(&self, value: &'v Value, location: &str) -> Result<&'v Vec<Value>, DecodeError> {
        match value {
            Value::Array(items) => Ok(items),
            Value::Number(_) => Err(self.mismatch(location, "expected an array, found a number (missing array level)")),
            other => Err(self.mismatch(location, format!("expected an array, found {}", json_kind(other)))),
        }
    }

    // Rank 1: [lon, lat, ...]
    fn position(&self, value: &Value, location: &str) -> Result<Vec<f64>, DecodeError> {
        self.array(value, location)?
            .iter()
            .enumerate()
            .map(|(i, v)| match v {
                Value::Number(n) => n
                    .as_f64()
                    .ok_or_else(|| self.mismatch(&format!("{}[{}]", location, i), "number out of range")),
                Value::Array(_) => Err(self.mismatch(
                    &format!("{}[{}]", location, i),
                    "expected a number, found an array (extra array level)",
                )),
                other => Err(self.mismatch(
                    &format!("{}[{}]", location, i),
                    format!("expected a number, found {}", json_kind(other)),
                )),
            })
            .collect()
    }

    // Rank 2: [[lon, lat], ...]
    fn positions(&self, value: &Value, location: &str) -> Result<Vec<Vec<f64>>, DecodeError> {
        self.array(value, location)?
            .iter()
            .enumerate()
            .map(|(i, v)| self.position(v, &format!("{}[{}]", location, i)))
            .collect()
    }

    // Rank 3: [[[lon, lat], ...], ...]
    fn rings(&self, value: &Value, location: &str) -> Result<Vec<Vec<Vec<f64>>>, DecodeError> {
        self.array(value, location)?
            .iter()
            .enumerate()
            .map(|(i, v)| self.positions(v, &format!("{}[{}]", location, i)))
            .collect()
    }

    // Rank 4
    fn polygons(&self, value: &Value, location: &str) -> Result<Vec<Vec<Vec<Vec<f64>>>>, DecodeError> {
        self.array(value, location)?
            .iter()
            .enumerate()
            .map(|(i, v)| self.rings(v, &format!("{}[{}]", location, i)))
            .collect()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
