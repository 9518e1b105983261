use crate::feed::EarthquakeFeature;
use anyhow::{bail, Context, Result};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Marker radius in screen pixels per unit of magnitude
pub const RADIUS_PER_MAGNITUDE: f64 = 3.5;

/// Number of magnitude buckets (and palette entries)
pub const BUCKETS: usize = 6;

/// Thresholds scanned from the top down; a magnitude strictly greater than the
/// threshold selects the paired palette index. Anything else lands in bucket 0.
const THRESHOLDS: [(f64, usize); BUCKETS - 1] = [(5.0, 5), (4.0, 4), (3.0, 3), (2.0, 2), (1.0, 1)];

/// 24-bit color, printed as lowercase `#rrggbb`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let hex = s.trim();
        let digits = match hex.strip_prefix('#') {
            Some(d) if d.len() == 6 && d.is_ascii() => d,
            _ => bail!("expected a color like #rrggbb, got {s:?}"),
        };
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16).with_context(|| format!("bad hex digits in {s:?}"))
        };
        Ok(Rgb::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Six bucket colors, lowest magnitude bucket first
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    colors: [Rgb; BUCKETS],
}

impl Palette {
    /// The canonical green-to-red preset
    pub const CLASSIC: Palette = Palette {
        colors: [
            Rgb::new(0x98, 0xee, 0x00),
            Rgb::new(0xbd, 0xdd, 0x1c),
            Rgb::new(0xea, 0xd1, 0x16),
            Rgb::new(0xea, 0x99, 0x17),
            Rgb::new(0xd8, 0x66, 0x15),
            Rgb::new(0xd1, 0x19, 0x19),
        ],
    };

    pub fn new(colors: [Rgb; BUCKETS]) -> Self {
        Self { colors }
    }

    pub fn colors(&self) -> &[Rgb; BUCKETS] {
        &self.colors
    }

    /// Index of the bucket a magnitude falls into (0 = lowest)
    pub fn bucket(magnitude: f64) -> usize {
        THRESHOLDS
            .iter()
            .find(|(threshold, _)| magnitude > *threshold)
            .map(|&(_, idx)| idx)
            .unwrap_or(0)
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::CLASSIC
    }
}

/// Parses six comma-separated `#rrggbb` colors, lowest bucket first
impl FromStr for Palette {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let parsed = s
            .split(',')
            .map(str::parse::<Rgb>)
            .collect::<Result<Vec<_>>>()?;
        let colors: [Rgb; BUCKETS] = parsed
            .try_into()
            .map_err(|v: Vec<Rgb>| anyhow::anyhow!("palette needs {BUCKETS} colors, got {}", v.len()))?;
        Ok(Self { colors })
    }
}

/// Visual style of one circle marker. Serializes to Leaflet path options.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Style {
    /// Screen pixels. Negative for negative magnitudes; renderers draw nothing then.
    pub radius: f64,
    #[serde(rename = "fillColor")]
    pub fill_color: Rgb,
    #[serde(rename = "color")]
    pub stroke_color: Rgb,
    #[serde(rename = "weight")]
    pub stroke_weight: f64,
    #[serde(rename = "fillOpacity")]
    pub fill_opacity: f64,
    #[serde(rename = "opacity")]
    pub stroke_opacity: f64,
}

/// Popup content for one feature
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Popup {
    pub heading: String,
    pub body: String,
}

impl Popup {
    /// HTML fragment bound to a Leaflet marker. `body` is inserted as-is.
    pub fn to_html(&self) -> String {
        format!("<h3>{}</h3><hr><p>{}</p>", self.heading, self.body)
    }
}

/// One legend row: a color and the lower bound of its magnitude range
#[derive(Clone, Debug, PartialEq)]
pub struct LegendEntry {
    pub lower_bound: f64,
    /// `None` for the open-ended top row
    pub upper_bound: Option<f64>,
    pub color: Rgb,
}

impl LegendEntry {
    /// `"N–M"` for bounded rows, `"N+"` for the top row
    pub fn label(&self) -> String {
        match self.upper_bound {
            Some(upper) => format!("{}\u{2013}{}", js_number(self.lower_bound), js_number(upper)),
            None => format!("{}+", js_number(self.lower_bound)),
        }
    }

    pub fn markup(&self) -> String {
        let range = match self.upper_bound {
            Some(upper) => format!("{}&ndash;{}<br>", js_number(self.lower_bound), js_number(upper)),
            None => format!("{}+", js_number(self.lower_bound)),
        };
        format!("<i style=\"background:{}\"></i> {}", self.color, range)
    }
}

/// Turns features into marker styles, popups and legend rows
#[derive(Clone, Debug, Default)]
pub struct FeatureStyler {
    palette: Palette,
}

impl FeatureStyler {
    pub fn new(palette: Palette) -> Self {
        Self { palette }
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Strict `>` thresholds at 5, 4, 3, 2, 1. NaN lands in the lowest bucket.
    pub fn color_for_magnitude(&self, magnitude: f64) -> Rgb {
        self.palette.colors[Palette::bucket(magnitude)]
    }

    pub fn style_for_feature(&self, feature: &EarthquakeFeature) -> Style {
        let magnitude = feature.magnitude_or_nan();
        Style {
            radius: magnitude * RADIUS_PER_MAGNITUDE,
            fill_color: self.color_for_magnitude(magnitude),
            stroke_color: Rgb::BLACK,
            stroke_weight: 0.5,
            fill_opacity: 1.0,
            stroke_opacity: 0.9,
        }
    }

    pub fn popup(&self, feature: &EarthquakeFeature) -> Popup {
        let magnitude = feature.magnitude.map(js_number).unwrap_or_else(|| "null".to_string());
        Popup {
            heading: format!("Magnitude: {magnitude}"),
            body: feature.place.clone().unwrap_or_else(|| "null".to_string()),
        }
    }

    pub fn popup_html(&self, feature: &EarthquakeFeature) -> String {
        self.popup(feature).to_html()
    }

    /// Legend rows from bound 0 to the open-ended 5+ row
    pub fn legend_entries(&self) -> Vec<LegendEntry> {
        self.palette
            .colors
            .iter()
            .enumerate()
            .map(|(i, &color)| LegendEntry {
                lower_bound: i as f64,
                upper_bound: (i + 1 < BUCKETS).then(|| (i + 1) as f64),
                color,
            })
            .collect()
    }
}

/// Formats a number the way a browser prints it (`5`, `6.1`, `1e-7`, `NaN`)
pub fn js_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        let sign = if value > 0.0 { "" } else { "-" };
        format!("{sign}Infinity")
    } else if value == 0.0 {
        "0".to_string()
    } else if value.abs() < 1e-6 || value.abs() >= 1e21 {
        // Exponent form with an explicit sign, as in `1e+21`
        let formatted = format!("{value:e}");
        match formatted.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => format!("{mantissa}e+{exponent}"),
            _ => formatted,
        }
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quake(magnitude: Option<f64>, place: &str) -> EarthquakeFeature {
        EarthquakeFeature {
            magnitude,
            place: Some(place.to_string()),
            longitude: -122.0,
            latitude: 37.0,
        }
    }

    #[test]
    fn test_buckets_use_strict_thresholds() {
        let styler = FeatureStyler::default();
        assert_eq!(styler.color_for_magnitude(5.0).to_string(), "#d86615");
        assert_eq!(styler.color_for_magnitude(5.01).to_string(), "#d11919");
        assert_eq!(styler.color_for_magnitude(4.0).to_string(), "#ea9917");
        assert_eq!(styler.color_for_magnitude(3.0).to_string(), "#ead116");
        assert_eq!(styler.color_for_magnitude(2.0).to_string(), "#bddd1c");
        assert_eq!(styler.color_for_magnitude(1.0).to_string(), "#98ee00");
        assert_eq!(styler.color_for_magnitude(-3.0).to_string(), "#98ee00");
    }

    #[test]
    fn test_nan_falls_to_default() {
        let styler = FeatureStyler::default();
        assert_eq!(styler.color_for_magnitude(f64::NAN), Palette::CLASSIC.colors()[0]);
    }

    #[test]
    fn test_severity_never_decreases() {
        let mut last = 0;
        for step in -20..=100 {
            let m = step as f64 * 0.1;
            let bucket = Palette::bucket(m);
            assert!(bucket >= last, "bucket dropped at {m}");
            assert!(Palette::CLASSIC.colors().contains(&Palette::CLASSIC.colors()[bucket]));
            last = bucket;
        }
        assert_eq!(last, BUCKETS - 1);
    }

    #[test]
    fn test_style_radius_scales_with_magnitude() {
        let styler = FeatureStyler::default();
        let style = styler.style_for_feature(&quake(Some(4.2), "x"));
        assert!((style.radius - 14.7).abs() < 1e-9);
        assert_eq!(style.stroke_color, Rgb::BLACK);
        assert_eq!(style.stroke_weight, 0.5);

        let negative = styler.style_for_feature(&quake(Some(-0.5), "x"));
        assert_eq!(negative.radius, -1.75);

        let missing = styler.style_for_feature(&quake(None, "x"));
        assert!(missing.radius.is_nan());
    }

    #[test]
    fn test_popup_html() {
        let styler = FeatureStyler::default();
        let html = styler.popup_html(&quake(Some(6.1), "10km N of X"));
        assert!(html.contains("Magnitude: 6.1"));
        assert!(html.contains("10km N of X"));
        assert_eq!(html, "<h3>Magnitude: 6.1</h3><hr><p>10km N of X</p>");
    }

    #[test]
    fn test_popup_keeps_place_unescaped() {
        let styler = FeatureStyler::default();
        let html = styler.popup_html(&quake(Some(5.0), "<b>Here</b>"));
        assert_eq!(html, "<h3>Magnitude: 5</h3><hr><p><b>Here</b></p>");
    }

    #[test]
    fn test_popup_missing_fields() {
        let styler = FeatureStyler::default();
        let feature = EarthquakeFeature {
            magnitude: None,
            place: None,
            longitude: 0.0,
            latitude: 0.0,
        };
        assert_eq!(styler.popup_html(&feature), "<h3>Magnitude: null</h3><hr><p>null</p>");
    }

    #[test]
    fn test_legend_rows() {
        let entries = FeatureStyler::default().legend_entries();
        assert_eq!(entries.len(), 6);
        assert_eq!(entries[0].label(), "0\u{2013}1");
        assert_eq!(entries[5].label(), "5+");
        assert_eq!(entries[0].markup(), "<i style=\"background:#98ee00\"></i> 0&ndash;1<br>");
        assert_eq!(entries[5].markup(), "<i style=\"background:#d11919\"></i> 5+");
    }

    #[test]
    fn test_palette_parse() {
        let palette: Palette = "#000000,#111111,#222222,#333333,#444444,#FFFFFF".parse().unwrap();
        assert_eq!(palette.colors()[5].to_string(), "#ffffff");

        assert!("#000000,#111111".parse::<Palette>().is_err());
        assert!("#zz0000,#111111,#222222,#333333,#444444,#555555".parse::<Palette>().is_err());
        assert!("red".parse::<Rgb>().is_err());
    }

    #[test]
    fn test_js_number() {
        assert_eq!(js_number(5.0), "5");
        assert_eq!(js_number(6.1), "6.1");
        assert_eq!(js_number(0.000001), "0.000001");
        assert_eq!(js_number(1e-7), "1e-7");
        assert_eq!(js_number(-2.5e-8), "-2.5e-8");
        assert_eq!(js_number(1e21), "1e+21");
        assert_eq!(js_number(1.5e22), "1.5e+22");
        assert_eq!(js_number(123456789012345680000.0), "123456789012345680000");
        assert_eq!(js_number(-0.0), "0");
        assert_eq!(js_number(f64::NAN), "NaN");
    }
}
