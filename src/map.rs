//! Static Leaflet map of the matched cities.
//!
//! The page pulls Leaflet and the heat-map plugin from a CDN and embeds the
//! city data as JSON; nothing else is needed to open it in a browser.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use crate::analyzers::tier::HotspotTier;
use crate::analyzers::types::CityRecord;

const MAP_CENTER: (f64, f64) = (39.5, -98.35);
const MAP_ZOOM: u8 = 4;

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Air quality hotspots</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<script src="https://unpkg.com/leaflet.heat@0.2.0/dist/leaflet-heat.js"></script>
<style>
html, body, #map { height: 100%; margin: 0; }
.legend { background: #fff; padding: 6px 10px; font: 12px sans-serif; border-radius: 4px; }
.legend i { display: inline-block; width: 10px; height: 10px; margin-right: 6px; border: 1px solid #000; }
</style>
</head>
<body>
<div id="map"></div>
<script>
var map = L.map("map").setView(__CENTER__, __ZOOM__);
L.tileLayer("https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png", {
  attribution: "&copy; OpenStreetMap contributors &copy; CARTO",
  subdomains: "abcd",
  maxZoom: 19
}).addTo(map);

var heat = __HEAT__;
if (heat.length > 0) {
  L.heatLayer(heat, { max: __HEAT_MAX__ }).addTo(map);
}

var markers = __MARKERS__;
markers.forEach(function (m) {
  L.circleMarker([m.lat, m.lon], {
    radius: 5,
    color: "black",
    weight: 1,
    fill: true,
    fillColor: m.color,
    fillOpacity: 0.7
  }).bindPopup(m.popup).addTo(map);
});

var legend = L.control({ position: "bottomright" });
legend.onAdd = function () {
  var div = L.DomUtil.create("div", "legend");
  div.innerHTML = __LEGEND__;
  return div;
};
legend.addTo(map);
</script>
</body>
</html>
"#;

#[derive(Serialize)]
struct Marker {
    lat: f64,
    lon: f64,
    color: &'static str,
    popup: String,
}

/// Renders the full HTML page for `records`.
///
/// PM2.5 readings at or above `heat_max` (µg/m³) show at full heat intensity.
pub fn render_map(records: &[CityRecord], heat_max: f64) -> Result<String> {
    let heat: Vec<[f64; 3]> = records
        .iter()
        .map(|r| [r.latitude, r.longitude, r.pm25])
        .collect();

    let markers: Vec<Marker> = records
        .iter()
        .map(|r| Marker {
            lat: r.latitude,
            lon: r.longitude,
            color: r.tier.color(),
            popup: popup_html(r),
        })
        .collect();

    let legend: String = HotspotTier::ALL
        .iter()
        .map(|tier| format!("<i style=\"background:{}\"></i>{}<br>", tier.color(), tier))
        .collect();

    let html = TEMPLATE
        .replace("__CENTER__", &script_json(&[MAP_CENTER.0, MAP_CENTER.1])?)
        .replace("__ZOOM__", &MAP_ZOOM.to_string())
        .replace("__HEAT_MAX__", &script_json(&heat_max)?)
        .replace("__HEAT__", &script_json(&heat)?)
        .replace("__MARKERS__", &script_json(&markers)?)
        .replace("__LEGEND__", &script_json(&format!("<b>Hotspot tier</b><br>{legend}"))?);

    Ok(html)
}

#[tracing::instrument(skip_all, fields(path = %path.display(), cities = records.len()))]
pub fn write_map(path: &Path, records: &[CityRecord], heat_max: f64) -> Result<()> {
    let html = render_map(records, heat_max)?;
    std::fs::write(path, html).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn popup_html(r: &CityRecord) -> String {
    format!(
        "<b>{}</b><br>PM2.5: {:.1} µg/m³<br>CO₂: {:.1} kt/day<br>TRI facilities: {}\
         <br>Facility density: {:.2} per 100 km²<br>Hotspot score: {:.1} ({})",
        escape_html(&r.city),
        r.pm25,
        r.co2,
        r.tri_facilities,
        r.facility_density,
        r.hotspot_score,
        r.tier,
    )
}

/// JSON safe to inline in a `<script>` block.
fn script_json(value: &impl Serialize) -> Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
