//! Map rendering
//!
//! A [`MapScene`] holds everything drawn for one assessment. It renders to a
//! standalone Leaflet page or to a GeoJSON feature collection; it keeps no
//! state beyond what it is handed.

use crate::models::{Coordinates, FireLocations, SpreadProjection};
use crate::remote_sensing::TileLayer;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value as GeoValue};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const DEFAULT_ZOOM: u8 = 9;
pub const OVERLAY_OPACITY: f64 = 0.6;

const LEAFLET_VERSION: &str = "1.9.4";
const CARTO_ATTRIBUTION: &str =
    "&copy; OpenStreetMap contributors &copy; CARTO";

/// Base map theme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapTheme {
    #[default]
    Light,
    Dark,
}

impl MapTheme {
    #[must_use]
    pub fn from_dark_mode(dark_mode: bool) -> Self {
        if dark_mode { Self::Dark } else { Self::Light }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            MapTheme::Light => "CartoDB positron",
            MapTheme::Dark => "CartoDB dark_matter",
        }
    }

    #[must_use]
    pub fn tile_url(self) -> &'static str {
        match self {
            MapTheme::Light => "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png",
            MapTheme::Dark => "https://{s}.basemaps.cartocdn.com/dark_all/{z}/{x}/{y}{r}.png",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FireMarker {
    pub label: String,
    pub coordinates: Coordinates,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapScene {
    pub center: Coordinates,
    pub zoom: u8,
    pub theme: MapTheme,
    pub overlays: Vec<TileLayer>,
    pub markers: Vec<FireMarker>,
    pub spread: Option<SpreadProjection>,
}

impl MapScene {
    #[must_use]
    pub fn new(center: Coordinates, theme: MapTheme) -> Self {
        Self {
            center,
            zoom: DEFAULT_ZOOM,
            theme,
            overlays: Vec::new(),
            markers: Vec::new(),
            spread: None,
        }
    }

    #[must_use]
    pub fn with_overlay(mut self, layer: TileLayer) -> Self {
        self.overlays.push(layer);
        self
    }

    #[must_use]
    pub fn with_fires(mut self, fires: &FireLocations) -> Self {
        self.markers.extend(fires.iter().map(|fire| FireMarker {
            label: fire.label.clone(),
            coordinates: fire.coordinates,
        }));
        self
    }

    #[must_use]
    pub fn with_spread(mut self, spread: SpreadProjection) -> Self {
        self.spread = Some(spread);
        self
    }

    /// Markers, spread cone, downwind line and endpoint as GeoJSON
    #[must_use]
    pub fn to_geojson(&self) -> FeatureCollection {
        let mut features: Vec<Feature> = self
            .markers
            .iter()
            .map(|marker| {
                feature(
                    point(marker.coordinates),
                    json!({"kind": "fire", "label": marker.label}),
                )
            })
            .collect();

        if let Some(spread) = &self.spread {
            let mut ring: Vec<Vec<f64>> = spread.cone.iter().map(|c| position(*c)).collect();
            if let Some(first) = ring.first().cloned() {
                ring.push(first);
            }
            features.push(feature(
                Geometry::new(GeoValue::Polygon(vec![ring])),
                json!({"kind": "spread_cone"}),
            ));
            features.push(feature(
                Geometry::new(GeoValue::LineString(vec![
                    position(spread.origin),
                    position(spread.endpoint),
                ])),
                json!({"kind": "spread_line", "distance_km": spread.distance_km}),
            ));
            features.push(feature(
                point(spread.endpoint),
                json!({
                    "kind": "spread_endpoint",
                    "bearing_deg": spread.bearing_deg,
                    "direction": spread.direction,
                }),
            ));
        }

        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }

    /// Map container and script, for embedding in a larger page
    #[must_use]
    pub fn to_html_fragment(&self, element_id: &str) -> String {
        let overlays: Vec<Value> = self
            .overlays
            .iter()
            .map(|layer| {
                json!({
                    "name": layer.name,
                    "url": layer.url_template,
                    "attribution": layer.attribution,
                })
            })
            .collect();

        let scene = json!({
            "center": [self.center.latitude, self.center.longitude],
            "zoom": self.zoom,
            "base": {
                "name": self.theme.name(),
                "url": self.theme.tile_url(),
                "attribution": CARTO_ATTRIBUTION,
            },
            "overlays": overlays,
            "overlayOpacity": OVERLAY_OPACITY,
            "features": self.to_geojson(),
        });
        let scene = script_safe(&scene.to_string());

        format!(
            r#"<div id="{element_id}" class="firewatch-map" style="height:600px"></div>
<script>
(function () {{
  const scene = {scene};
  const map = L.map("{element_id}").setView(scene.center, scene.zoom);
  L.control.scale().addTo(map);
  const base = L.tileLayer(scene.base.url, {{ attribution: scene.base.attribution, subdomains: "abcd", maxZoom: 20 }}).addTo(map);
  const overlays = {{}};
  for (const layer of scene.overlays) {{
    overlays[layer.name] = L.tileLayer(layer.url, {{ attribution: layer.attribution, opacity: scene.overlayOpacity }}).addTo(map);
  }}
  L.control.layers({{ [scene.base.name]: base }}, overlays).addTo(map);
  L.geoJSON(scene.features, {{
    style: function (f) {{
      if (f.properties.kind === "spread_cone") return {{ color: "orange", fillOpacity: 0.3 }};
      if (f.properties.kind === "spread_line") return {{ color: "silver", weight: 5, dashArray: "5" }};
      return {{}};
    }},
    pointToLayer: function (f, latlng) {{
      if (f.properties.kind === "spread_endpoint") {{
        const arrow = '<div style="transform:rotate(' + f.properties.bearing_deg + 'deg);color:silver;font-size:20px;-webkit-text-stroke:1px black">&#9650;</div>';
        return L.marker(latlng, {{ icon: L.divIcon({{ html: arrow, className: "", iconSize: [20, 20], iconAnchor: [10, 10] }}) }});
      }}
      return L.marker(latlng, {{ icon: L.divIcon({{ html: "&#128293;", className: "", iconSize: [24, 24], iconAnchor: [12, 12] }}) }})
        .bindPopup(document.createTextNode(f.properties.label));
    }}
  }}).addTo(map);
}})();
</script>"#
        )
    }

    /// Standalone Leaflet document
    #[must_use]
    pub fn to_html(&self, title: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<meta name="viewport" content="width=device-width, initial-scale=1">
{head}
</head>
<body style="margin:0">
{map}
</body>
</html>
"#,
            title = escape_html(title),
            head = leaflet_head(),
            map = self.to_html_fragment("map"),
        )
    }
}

/// Stylesheet and script tags Leaflet needs
#[must_use]
pub fn leaflet_head() -> String {
    format!(
        r#"<link rel="stylesheet" href="https://unpkg.com/leaflet@{LEAFLET_VERSION}/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@{LEAFLET_VERSION}/dist/leaflet.js"></script>"#
    )
}

#[must_use]
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// JSON may contain `</script>` inside string values
fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/")
}

fn position(c: Coordinates) -> Vec<f64> {
    vec![c.longitude, c.latitude]
}

fn point(c: Coordinates) -> Geometry {
    Geometry::new(GeoValue::Point(position(c)))
}

fn feature(geometry: Geometry, properties: Value) -> Feature {
    let properties: Option<JsonObject> = match properties {
        Value::Object(map) => Some(map),
        _ => None,
    };
    Feature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties,
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::project_spread;
    use crate::models::{FireLocation, WeatherReading};

    fn fires() -> FireLocations {
        let mut fires = FireLocations::new();
        fires.insert(FireLocation {
            label: "Concow </script><b>".to_string(),
            coordinates: Coordinates::new(39.8, -121.5),
            brightness: Some(341.0),
        });
        fires
    }

    #[test]
    fn test_theme_selects_base_tiles() {
        assert!(MapTheme::from_dark_mode(true).tile_url().contains("dark_all"));
        assert!(MapTheme::from_dark_mode(false).tile_url().contains("light_all"));
    }

    #[test]
    fn test_scene_without_prediction_has_no_spread() {
        let scene = MapScene::new(Coordinates::new(39.8, -121.5), MapTheme::Light).with_fires(&fires());
        let collection = scene.to_geojson();
        assert_eq!(collection.features.len(), 1);
        assert_eq!(scene.zoom, DEFAULT_ZOOM);
    }

    #[test]
    fn test_spread_adds_cone_line_and_endpoint() {
        let origin = Coordinates::new(39.8, -121.5);
        let spread = project_spread(origin, &WeatherReading::new(30.0, 15.0, 6.0, 90.0));
        let scene = MapScene::new(origin, MapTheme::Dark)
            .with_fires(&fires())
            .with_spread(spread);

        let collection = scene.to_geojson();
        let kinds: Vec<_> = collection
            .features
            .iter()
            .map(|f| f.property("kind").and_then(Value::as_str).unwrap().to_string())
            .collect();
        assert_eq!(kinds, vec!["fire", "spread_cone", "spread_line", "spread_endpoint"]);

        let Some(GeoValue::Polygon(rings)) = collection.features[1].geometry.as_ref().map(|g| &g.value) else {
            panic!("cone is not a polygon");
        };
        // 12 cone vertices plus the closing point
        assert_eq!(rings[0].len(), 13);
        assert_eq!(rings[0].first(), rings[0].last());
    }

    #[test]
    fn test_html_embeds_layers_and_escapes_labels() {
        let scene = MapScene::new(Coordinates::new(39.8, -121.5), MapTheme::Light)
            .with_overlay(TileLayer {
                name: "Fire Alerts".to_string(),
                url_template: "https://tiles.test/{z}/{x}/{y}".to_string(),
                attribution: "VIIRS NOAA20 NRT".to_string(),
            })
            .with_fires(&fires());

        let html = scene.to_html("Fire <map>");
        assert!(html.contains("leaflet@1.9.4"));
        assert!(html.contains("https://tiles.test/{z}/{x}/{y}"));
        assert!(html.contains("<title>Fire &lt;map&gt;</title>"));
        assert!(!html.contains("Concow </script>"));
        assert!(html.contains("Concow <\\/script>"));
    }
}
