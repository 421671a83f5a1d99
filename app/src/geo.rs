//! Coordinates, bounding boxes and the map viewport.

use geojson::{GeoJson, Geometry, Value};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Axis-aligned box given by its south-west and north-east corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl Bounds {
    pub fn new(south_west: LatLng, north_east: LatLng) -> Self {
        Self {
            south_west,
            north_east,
        }
    }

    /// Box of `span` degrees on each side of `center`.
    pub fn around(center: LatLng, span: f64) -> Self {
        Self::new(
            LatLng::new(center.lat - span, center.lng - span),
            LatLng::new(center.lat + span, center.lng + span),
        )
    }

    /// Smallest box holding every point, `None` when there are none.
    pub fn from_points(points: impl IntoIterator<Item = LatLng>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut bounds = Self::new(first, first);
        for p in points {
            bounds.extend(p);
        }
        Some(bounds)
    }

    pub fn extend(&mut self, p: LatLng) {
        self.south_west.lat = self.south_west.lat.min(p.lat);
        self.south_west.lng = self.south_west.lng.min(p.lng);
        self.north_east.lat = self.north_east.lat.max(p.lat);
        self.north_east.lng = self.north_east.lng.max(p.lng);
    }

    /// Edges are inclusive.
    pub fn contains(&self, p: LatLng) -> bool {
        p.lat >= self.south_west.lat
            && p.lat <= self.north_east.lat
            && p.lng >= self.south_west.lng
            && p.lng <= self.north_east.lng
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(
            f64::midpoint(self.south_west.lat, self.north_east.lat),
            f64::midpoint(self.south_west.lng, self.north_east.lng),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub bounds: Bounds,
    pub zoom: u8,
}

impl Viewport {
    pub fn new(bounds: Bounds, zoom: u8) -> Self {
        Self { bounds, zoom }
    }

    /// Approximate viewport of a 512-pixel square map at `zoom`, for when
    /// no map library reports real bounds.
    pub fn centered(center: LatLng, zoom: u8) -> Self {
        let half_span = 360.0 / f64::from(1u32 << zoom.min(24));
        Self::new(Bounds::around(center, half_span), zoom)
    }

    pub fn center(&self) -> LatLng {
        self.bounds.center()
    }

    /// Text for the location line of the status bar.
    pub fn describe(&self) -> String {
        let c = self.center();
        format!("{:.4} lon / {:.4} lat / {} zoom", c.lng, c.lat, self.zoom)
    }
}

/// Bounds of every coordinate in a GeoJSON document.
pub fn geojson_bounds(geojson: &GeoJson) -> Option<Bounds> {
    let mut points = Vec::new();
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                if let Some(geometry) = &feature.geometry {
                    collect_positions(geometry, &mut points);
                }
            }
        }
        GeoJson::Feature(feature) => {
            if let Some(geometry) = &feature.geometry {
                collect_positions(geometry, &mut points);
            }
        }
        GeoJson::Geometry(geometry) => collect_positions(geometry, &mut points),
    }
    Bounds::from_points(points)
}

fn collect_positions(geometry: &Geometry, out: &mut Vec<LatLng>) {
    match &geometry.value {
        Value::Point(p) => push(p, out),
        Value::MultiPoint(ps) | Value::LineString(ps) => {
            for p in ps {
                push(p, out);
            }
        }
        Value::MultiLineString(lines) | Value::Polygon(lines) => {
            for p in lines.iter().flatten() {
                push(p, out);
            }
        }
        Value::MultiPolygon(polygons) => {
            for p in polygons.iter().flatten().flatten() {
                push(p, out);
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                collect_positions(g, out);
            }
        }
    }
}

// GeoJSON positions are [lon, lat]
fn push(pos: &[f64], out: &mut Vec<LatLng>) {
    if let [lng, lat, ..] = pos {
        out.push(LatLng::new(*lat, *lng));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_is_inclusive() {
        let b = Bounds::new(LatLng::new(49.0, -123.0), LatLng::new(50.0, -122.0));
        assert!(b.contains(LatLng::new(49.5, -122.5)));
        assert!(b.contains(LatLng::new(49.0, -123.0)));
        assert!(!b.contains(LatLng::new(50.1, -122.5)));
        assert!(!b.contains(LatLng::new(49.5, -121.9)));
    }

    #[test]
    fn test_from_points() {
        let b = Bounds::from_points([
            LatLng::new(1.0, 5.0),
            LatLng::new(-2.0, 7.0),
            LatLng::new(0.5, 4.0),
        ])
        .unwrap();
        assert_eq!(b.south_west, LatLng::new(-2.0, 4.0));
        assert_eq!(b.north_east, LatLng::new(1.0, 7.0));
        assert!(Bounds::from_points([]).is_none());
    }

    #[test]
    fn test_centered_viewport_shrinks_with_zoom() {
        let center = LatLng::new(49.28, -123.12);
        let wide = Viewport::centered(center, 12);
        let close = Viewport::centered(center, 16);
        assert_eq!(close.zoom, 16);
        assert!(wide.bounds.contains(close.bounds.north_east));
        assert!(!close.bounds.contains(wide.bounds.north_east));
        assert!((close.center().lat - 49.28).abs() < 1e-9);
    }

    #[test]
    fn test_viewport_describe() {
        let vp = Viewport::new(
            Bounds::around(LatLng::new(49.28273, -123.12074), 0.01),
            16,
        );
        assert_eq!(vp.describe(), "-123.1207 lon / 49.2827 lat / 16 zoom");
    }

    #[test]
    fn test_geojson_bounds_of_line() {
        let json = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {},
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[-123.2, 49.2], [-123.0, 49.3], [-123.1, 49.25]]
                }
            }]
        }"#;
        let geojson: GeoJson = json.parse().unwrap();
        let b = geojson_bounds(&geojson).unwrap();
        assert_eq!(b.south_west, LatLng::new(49.2, -123.2));
        assert_eq!(b.north_east, LatLng::new(49.3, -123.0));
    }
}
