use anyhow::{anyhow, Context, Result};
use ratatui::style::Color;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub input: InputConfig,
    pub years: YearsConfig,
    pub glyphs: GlyphConfig,
    pub palette: PaletteConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    pub table: PathBuf,
    pub geometry: PathBuf,
    /// Feature property holding the country name used for the join
    pub name_property: String,
    /// Object to extract when the geometry file is a TopoJSON topology
    pub object: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            table: PathBuf::from("data/Cereals1980-2016.csv"),
            geometry: PathBuf::from("data/africa.json"),
            name_property: "geounit".to_string(),
            object: "continent_Africa_subunits".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct YearsConfig {
    pub recent: i32,
    pub earlier: i32,
}

impl Default for YearsConfig {
    fn default() -> Self {
        Self {
            recent: 2016,
            earlier: 1980,
        }
    }
}

impl YearsConfig {
    /// Years of interest, newest first
    pub fn both(&self) -> [i32; 2] {
        [self.recent.max(self.earlier), self.recent.min(self.earlier)]
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct GlyphConfig {
    /// Circle radius range in braille pixels
    pub circle_range: (f64, f64),
    /// Bar height range in braille pixels
    pub bar_range: (f64, f64),
    pub bar_width: i32,
    /// Frames for glyphs to grow to full size; 0 draws them at once
    pub animation_frames: u32,
    /// Yield scale steps shown as pictogram glyphs in the tooltip
    pub yield_steps: u32,
}

impl Default for GlyphConfig {
    fn default() -> Self {
        Self {
            circle_range: (1.0, 8.0),
            bar_range: (2.0, 16.0),
            bar_width: 2,
            animation_frames: 30,
            yield_steps: 10,
        }
    }
}

/// Hex colors (`#rrggbb`) for each layer
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PaletteConfig {
    pub area_earlier: String,
    pub area_recent: String,
    pub prod_earlier: String,
    pub prod_recent: String,
    pub highlight: String,
    pub outline: String,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            area_earlier: "#00e676".to_string(),
            area_recent: "#66ffa6".to_string(),
            prod_earlier: "#e65800".to_string(),
            prod_recent: "#ff9c66".to_string(),
            highlight: "#ff6691".to_string(),
            outline: "#5f6b73".to_string(),
        }
    }
}

/// Palette resolved to terminal colors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub area_earlier: Color,
    pub area_recent: Color,
    pub prod_earlier: Color,
    pub prod_recent: Color,
    pub highlight: Color,
    pub outline: Color,
}

impl PaletteConfig {
    pub fn resolve(&self) -> Result<Palette> {
        Ok(Palette {
            area_earlier: hex_to_color(&self.area_earlier)?,
            area_recent: hex_to_color(&self.area_recent)?,
            prod_earlier: hex_to_color(&self.prod_earlier)?,
            prod_recent: hex_to_color(&self.prod_recent)?,
            highlight: hex_to_color(&self.highlight)?,
            outline: hex_to_color(&self.outline)?,
        })
    }
}

pub fn hex_to_color(hex: &str) -> Result<Color> {
    let digits = hex.trim_start_matches('#');
    if digits.len() != 6 || !digits.is_ascii() {
        return Err(anyhow!("Invalid color {:?}: expected #rrggbb", hex));
    }
    let channel = |i: usize| {
        u8::from_str_radix(&digits[i..i + 2], 16).with_context(|| format!("Invalid color {:?}", hex))
    };
    Ok(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log file for the interactive view (the terminal belongs to the UI)
    pub file: PathBuf,
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("cereal-map.log"),
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse TOML configuration")
    }

    /// Load the file if given, defaults otherwise
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.years.recent == self.years.earlier {
            return Err(anyhow!(
                "Years of interest must differ, both are {}",
                self.years.recent
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.years.both(), [2016, 1980]);
        assert_eq!(config.input.name_property, "geounit");
        assert_eq!(config.input.object, "continent_Africa_subunits");
    }

    #[test]
    fn test_partial_sections_override() {
        let config = AppConfig::from_toml(
            r##"
            [input]
            geometry = "maps/continent.geojson"

            [years]
            recent = 2010

            [glyphs]
            circle_range = [2.0, 35.0]

            [palette]
            highlight = "#112233"
            "##,
        )
        .unwrap();

        assert_eq!(config.input.geometry, PathBuf::from("maps/continent.geojson"));
        assert_eq!(config.input.table, InputConfig::default().table);
        assert_eq!(config.years.both(), [2010, 1980]);
        assert_eq!(config.glyphs.circle_range, (2.0, 35.0));
        assert_eq!(config.glyphs.bar_width, 2);
        assert_eq!(config.palette.resolve().unwrap().highlight, Color::Rgb(0x11, 0x22, 0x33));
    }

    #[test]
    fn test_years_ordered_newest_first() {
        let years = YearsConfig { recent: 1980, earlier: 2016 };
        assert_eq!(years.both(), [2016, 1980]);
    }

    #[test]
    fn test_bad_color_is_rejected() {
        assert!(hex_to_color("#12345").is_err());
        assert!(hex_to_color("#zz0000").is_err());
        assert_eq!(hex_to_color("00e676").unwrap(), Color::Rgb(0, 0xe6, 0x76));
    }

    #[test]
    fn test_equal_years_are_rejected() {
        let config = AppConfig::from_toml("[years]\nrecent = 1980\nearlier = 1980").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("must differ"));

        let path = std::env::temp_dir().join(format!("cereal-map-years-{}.toml", std::process::id()));
        fs::write(&path, "[years]\nrecent = 2016\nearlier = 2016\n").unwrap();
        let loaded = AppConfig::load(Some(&path));
        fs::remove_file(&path).unwrap();
        assert!(loaded.is_err());

        assert!(AppConfig::load(None).is_ok());
    }

    #[test]
    fn test_wrong_type_is_an_error() {
        assert!(AppConfig::from_toml("[years]\nrecent = \"soon\"").is_err());
    }
}
