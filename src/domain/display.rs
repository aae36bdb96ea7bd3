// Mapping of measured values to icons and card colours
use super::error::MappingError;
use serde::{Deserialize, Serialize};

/// Font Awesome glyphs used by the cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Icon {
    Snowflake,
    TemperatureEmpty,
    TemperatureQuarter,
    TemperatureHalf,
    TemperatureThreeQuarters,
    TemperatureFull,
    Sun,
    CloudSun,
    Cloud,
    CloudSunRain,
    CloudRain,
    CloudShowersHeavy,
}

impl Icon {
    pub fn name(self) -> &'static str {
        match self {
            Icon::Snowflake => "snowflake",
            Icon::TemperatureEmpty => "temperature-empty",
            Icon::TemperatureQuarter => "temperature-quarter",
            Icon::TemperatureHalf => "temperature-half",
            Icon::TemperatureThreeQuarters => "temperature-three-quarters",
            Icon::TemperatureFull => "temperature-full",
            Icon::Sun => "sun",
            Icon::CloudSun => "cloud-sun",
            Icon::Cloud => "cloud",
            Icon::CloudSunRain => "cloud-sun-rain",
            Icon::CloudRain => "cloud-rain",
            Icon::CloudShowersHeavy => "cloud-showers-heavy",
        }
    }

    pub fn css_class(self) -> String {
        format!("fa-solid fa-{}", self.name())
    }
}

/// What a card shows under its text: a glyph, or a short message when no glyph fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Indicator {
    Icon(Icon),
    Text(&'static str),
}

pub const GET_INSIDE: Indicator = Indicator::Text("Get inside!");

/// Half-open bins `[previous upper, upper)`; values past the last edge (and NaN)
/// fall through to `fallback`.
#[derive(Debug, Clone, Copy)]
pub struct Bins {
    edges: &'static [(f64, Indicator)],
    fallback: Indicator,
}

impl Bins {
    pub const fn new(edges: &'static [(f64, Indicator)], fallback: Indicator) -> Self {
        Self { edges, fallback }
    }

    pub fn classify(&self, value: f64) -> Indicator {
        self.edges
            .iter()
            .find(|(upper, _)| value < *upper)
            .map(|(_, indicator)| *indicator)
            .unwrap_or(self.fallback)
    }

    pub fn edges(&self) -> impl Iterator<Item = f64> + '_ {
        self.edges.iter().map(|(upper, _)| *upper)
    }
}

const TEMPERATURE_EDGES: &[(f64, Indicator)] = &[
    (0.0, Indicator::Icon(Icon::Snowflake)),
    (5.0, Indicator::Icon(Icon::TemperatureEmpty)),
    (10.0, Indicator::Icon(Icon::TemperatureQuarter)),
    (20.0, Indicator::Icon(Icon::TemperatureHalf)),
    (25.0, Indicator::Icon(Icon::TemperatureThreeQuarters)),
    (30.0, Indicator::Icon(Icon::TemperatureFull)),
];

// Cloud cover (%) when nothing is falling
const DRY_SKY_EDGES: &[(f64, Indicator)] = &[
    (25.0, Indicator::Icon(Icon::Sun)),
    (75.0, Indicator::Icon(Icon::CloudSun)),
];

// Cloud cover (%) under light rain, 0 < mm < 1
const LIGHT_RAIN_SKY_EDGES: &[(f64, Indicator)] = &[(50.0, Indicator::Icon(Icon::CloudSunRain))];

// Precipitation (mm) from 1mm upwards
const RAIN_EDGES: &[(f64, Indicator)] = &[
    (2.0, Indicator::Icon(Icon::Cloud)),
    (4.0, Indicator::Icon(Icon::CloudRain)),
    (8.0, Indicator::Icon(Icon::CloudShowersHeavy)),
];

pub const TEMPERATURE_BINS: Bins = Bins::new(TEMPERATURE_EDGES, GET_INSIDE);
const DRY_SKY_BINS: Bins = Bins::new(DRY_SKY_EDGES, Indicator::Icon(Icon::Cloud));
const LIGHT_RAIN_SKY_BINS: Bins = Bins::new(LIGHT_RAIN_SKY_EDGES, Indicator::Icon(Icon::CloudRain));
const RAIN_BINS: Bins = Bins::new(RAIN_EDGES, GET_INSIDE);

pub fn classify_temperature(celsius: f64) -> Indicator {
    TEMPERATURE_BINS.classify(celsius)
}

/// Pick a sky glyph from precipitation (mm), refined by cloud cover (%) when it is dry
/// or only drizzling.
pub fn classify_sky(precipitation: f64, cloud_cover: f64) -> Indicator {
    if precipitation <= 0.0 {
        DRY_SKY_BINS.classify(cloud_cover)
    } else if precipitation < 1.0 {
        LIGHT_RAIN_SKY_BINS.classify(cloud_cover)
    } else {
        RAIN_BINS.classify(precipitation)
    }
}

/// What to do with a value outside the colour scale's range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutOfRange {
    /// Extrapolate; channels leaving 0..=1 fail to encode.
    #[default]
    Reject,
    /// Pin the value to the nearest endpoint colour.
    Clamp,
}

/// Colour with channels as floats, nominally in 0..=1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

// Rounding slack from blending two channels that are both at a bound
const GAMUT_TOLERANCE: f64 = 1e-9;

const NAMED_COLOURS: &[(&str, [u8; 3])] = &[
    ("black", [0, 0, 0]),
    ("blue", [0, 0, 255]),
    ("dimgray", [105, 105, 105]),
    ("dimgrey", [105, 105, 105]),
    ("gray", [128, 128, 128]),
    ("green", [0, 128, 0]),
    ("grey", [128, 128, 128]),
    ("lightblue", [173, 216, 230]),
    ("lightgray", [211, 211, 211]),
    ("lightgrey", [211, 211, 211]),
    ("navy", [0, 0, 128]),
    ("orange", [255, 165, 0]),
    ("red", [255, 0, 0]),
    ("skyblue", [135, 206, 235]),
    ("steelblue", [70, 130, 180]),
    ("white", [255, 255, 255]),
    ("yellow", [255, 255, 0]),
];

impl Rgba {
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
            a: 1.0,
        }
    }

    /// Parse a CSS colour name or `#rrggbb` / `#rrggbbaa`.
    pub fn parse(spec: &str) -> Result<Self, MappingError> {
        let spec = spec.trim();
        let unknown = || MappingError::UnknownColour(spec.to_string());

        if let Some(hex) = spec.strip_prefix('#') {
            if !matches!(hex.len(), 6 | 8) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(unknown());
            }
            let channel = |i: usize| {
                u8::from_str_radix(&hex[i..i + 2], 16)
                    .map(|c| c as f64 / 255.0)
                    .map_err(|_| unknown())
            };
            let alpha = if hex.len() == 8 { channel(6)? } else { 1.0 };
            return Ok(Self {
                r: channel(0)?,
                g: channel(2)?,
                b: channel(4)?,
                a: alpha,
            });
        }

        let lower = spec.to_ascii_lowercase();
        NAMED_COLOURS
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|(_, [r, g, b])| Self::from_rgb8(*r, *g, *b))
            .ok_or_else(unknown)
    }

    pub fn channels(&self) -> [f64; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Per-channel `self * (1 - t) + other * t`, with no clamping of `t`.
    pub fn lerp(&self, other: &Rgba, t: f64) -> Rgba {
        let mix = |a: f64, b: f64| a * (1.0 - t) + b * t;
        Rgba {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }

    /// Encode as `#rrggbbaa`.
    pub fn to_hex(&self) -> Result<String, MappingError> {
        let mut hex = String::with_capacity(9);
        hex.push('#');
        for channel in self.channels() {
            if !(-GAMUT_TOLERANCE..=1.0 + GAMUT_TOLERANCE).contains(&channel) {
                return Err(MappingError::OutOfGamut(channel));
            }
            let byte = (channel.clamp(0.0, 1.0) * 255.0).round() as u8;
            hex.push_str(&format!("{:02x}", byte));
        }
        Ok(hex)
    }
}

/// Linear gradient between two colours over `[min, max]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColourScale {
    min: f64,
    max: f64,
    low: Rgba,
    high: Rgba,
    out_of_range: OutOfRange,
}

impl ColourScale {
    pub fn new(min: f64, max: f64, low: Rgba, high: Rgba) -> Result<Self, MappingError> {
        if !min.is_finite() || !max.is_finite() || min == max {
            return Err(MappingError::EmptyRange { min, max });
        }
        Ok(Self {
            min,
            max,
            low,
            high,
            out_of_range: OutOfRange::Reject,
        })
    }

    pub fn from_names(min: f64, max: f64, low: &str, high: &str) -> Result<Self, MappingError> {
        Self::new(min, max, Rgba::parse(low)?, Rgba::parse(high)?)
    }

    pub fn with_out_of_range(mut self, policy: OutOfRange) -> Self {
        self.out_of_range = policy;
        self
    }

    /// Position of `value` in the range: 0 at `min`, 1 at `max`, unclamped.
    pub fn normalize(&self, value: f64) -> f64 {
        (value - self.min) / (self.max - self.min)
    }

    pub fn blend(&self, value: f64) -> Rgba {
        let t = match self.out_of_range {
            OutOfRange::Reject => self.normalize(value),
            OutOfRange::Clamp => self.normalize(value).clamp(0.0, 1.0),
        };
        self.low.lerp(&self.high, t)
    }

    pub fn colour_for(&self, value: f64) -> Result<String, MappingError> {
        self.blend(value).to_hex()
    }
}

/// Colour scales used by the weather cards.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    pub temperature: ColourScale,
    pub precipitation: ColourScale,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temperature_scale() -> ColourScale {
        ColourScale::from_names(0.0, 40.0, "lightblue", "red").unwrap()
    }

    #[test]
    fn test_temperature_bins() {
        let cases = [
            (-12.0, Indicator::Icon(Icon::Snowflake)),
            (-0.1, Indicator::Icon(Icon::Snowflake)),
            (0.0, Indicator::Icon(Icon::TemperatureEmpty)),
            (4.9, Indicator::Icon(Icon::TemperatureEmpty)),
            (5.0, Indicator::Icon(Icon::TemperatureQuarter)),
            (10.0, Indicator::Icon(Icon::TemperatureHalf)),
            (19.9, Indicator::Icon(Icon::TemperatureHalf)),
            (22.0, Indicator::Icon(Icon::TemperatureThreeQuarters)),
            (25.0, Indicator::Icon(Icon::TemperatureFull)),
            (30.0, GET_INSIDE),
            (45.0, GET_INSIDE),
        ];

        for (value, expected) in cases {
            assert_eq!(classify_temperature(value), expected, "value {}", value);
        }
    }

    #[test]
    fn test_bins_are_total_and_contiguous() {
        let edges: Vec<f64> = TEMPERATURE_BINS.edges().collect();
        assert!(edges.windows(2).all(|w| w[0] < w[1]));

        // each value lands in the first bin whose upper edge exceeds it
        let mut value = -20.0;
        while value < 50.0 {
            let expected_bin = edges.iter().position(|upper| value < *upper);
            let indicator = classify_temperature(value);
            match expected_bin {
                Some(i) => assert_eq!(indicator, TEMPERATURE_BINS.edges[i].1),
                None => assert_eq!(indicator, GET_INSIDE),
            }
            value += 0.25;
        }

        assert_eq!(classify_temperature(f64::NAN), GET_INSIDE);
        assert_eq!(classify_temperature(f64::NEG_INFINITY), Indicator::Icon(Icon::Snowflake));
        assert_eq!(classify_temperature(f64::INFINITY), GET_INSIDE);
    }

    #[test]
    fn test_sky_uses_cloud_cover_when_dry() {
        assert_eq!(classify_sky(0.0, 10.0), Indicator::Icon(Icon::Sun));
        assert_eq!(classify_sky(0.0, 25.0), Indicator::Icon(Icon::CloudSun));
        assert_eq!(classify_sky(0.0, 90.0), Indicator::Icon(Icon::Cloud));
    }

    #[test]
    fn test_sky_uses_cloud_cover_when_drizzling() {
        assert_eq!(classify_sky(0.4, 20.0), Indicator::Icon(Icon::CloudSunRain));
        assert_eq!(classify_sky(0.4, 50.0), Indicator::Icon(Icon::CloudRain));
    }

    #[test]
    fn test_sky_ignores_cloud_cover_in_rain() {
        for cloud in [0.0, 50.0, 100.0] {
            assert_eq!(classify_sky(1.0, cloud), Indicator::Icon(Icon::Cloud));
            assert_eq!(classify_sky(3.0, cloud), Indicator::Icon(Icon::CloudRain));
            assert_eq!(classify_sky(7.9, cloud), Indicator::Icon(Icon::CloudShowersHeavy));
            assert_eq!(classify_sky(8.0, cloud), GET_INSIDE);
        }
        assert_eq!(classify_sky(f64::NAN, 0.0), GET_INSIDE);
    }

    #[test]
    fn test_named_and_hex_colours() {
        assert_eq!(Rgba::parse("LightBlue").unwrap(), Rgba::from_rgb8(173, 216, 230));
        assert_eq!(Rgba::parse("#ff0000").unwrap(), Rgba::from_rgb8(255, 0, 0));
        assert_eq!(Rgba::parse("#00000080").unwrap().a, 128.0 / 255.0);
        assert!(matches!(Rgba::parse("chartreuse-ish"), Err(MappingError::UnknownColour(_))));
        assert!(matches!(Rgba::parse("#12345"), Err(MappingError::UnknownColour(_))));
        assert!(matches!(Rgba::parse("#+1+2+3"), Err(MappingError::UnknownColour(_))));
        assert!(matches!(Rgba::parse("#ff00zz"), Err(MappingError::UnknownColour(_))));
    }

    #[test]
    fn test_endpoints_are_exact() {
        let scale = temperature_scale();
        assert_eq!(scale.blend(0.0), Rgba::parse("lightblue").unwrap());
        assert_eq!(scale.blend(40.0), Rgba::parse("red").unwrap());
        assert_eq!(scale.colour_for(0.0).unwrap(), "#add8e6ff");
        assert_eq!(scale.colour_for(40.0).unwrap(), "#ff0000ff");
    }

    #[test]
    fn test_normalized_position() {
        let scale = temperature_scale();
        assert!((scale.normalize(22.0) - 0.55).abs() < 1e-12);
        assert_eq!(classify_temperature(22.0), Indicator::Icon(Icon::TemperatureThreeQuarters));
    }

    #[test]
    fn test_channels_move_monotonically() {
        let scale = temperature_scale();
        let samples: Vec<[f64; 4]> = (0..=40).map(|v| scale.blend(v as f64).channels()).collect();

        for pair in samples.windows(2) {
            assert!(pair[1][0] >= pair[0][0], "red should rise");
            assert!(pair[1][1] <= pair[0][1], "green should fall");
            assert!(pair[1][2] <= pair[0][2], "blue should fall");
            assert_eq!(pair[1][3], pair[0][3]);
        }
    }

    #[test]
    fn test_same_input_same_colour() {
        let scale = ColourScale::from_names(0.0, 10.0, "skyblue", "dimgrey").unwrap();
        assert_eq!(scale.colour_for(3.7).unwrap(), scale.colour_for(3.7).unwrap());
    }

    #[test]
    fn test_out_of_range_is_rejected_by_default() {
        let scale = temperature_scale();
        assert!(matches!(scale.colour_for(-5.0), Err(MappingError::OutOfGamut(_))));
        assert!(matches!(scale.colour_for(60.0), Err(MappingError::OutOfGamut(_))));
    }

    #[test]
    fn test_clamp_pins_to_endpoints() {
        let scale = temperature_scale().with_out_of_range(OutOfRange::Clamp);
        assert_eq!(scale.colour_for(-5.0).unwrap(), "#add8e6ff");
        assert_eq!(scale.colour_for(60.0).unwrap(), "#ff0000ff");
    }

    #[test]
    fn test_empty_range_is_rejected() {
        let result = ColourScale::from_names(10.0, 10.0, "red", "blue");
        assert_eq!(result, Err(MappingError::EmptyRange { min: 10.0, max: 10.0 }));
    }
}
