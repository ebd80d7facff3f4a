use std::env::vars;

use anyhow::{bail, Context};
use serde::Deserialize;
use tracing::info;

use crate::qrcode::EcLevel;

/// Everything that shapes the generated image. Passed explicitly through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    /// RGB colour of dark modules. Light modules and the quiet zone are always white.
    pub dark_color: [u8; 3],
    pub ec_level: EcLevel,
    /// Width of the light border, in modules.
    pub quiet_zone: u32,
    /// Pixel size used when the request gives none, or a non-positive one.
    pub default_size: u32,
    /// Requests above this are clamped to it.
    pub max_size: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            dark_color: [56, 88, 112],
            ec_level: EcLevel::High,
            quiet_zone: 4,
            default_size: 300,
            max_size: 4000,
        }
    }
}

impl RenderConfig {
    /// Maps a requested size onto the size actually rendered.
    pub fn resolve_size(&self, requested: i64) -> u32 {
        if requested <= 0 {
            self.default_size
        } else {
            u32::try_from(requested).map_or(self.max_size, |size| size.min(self.max_size))
        }
    }
}

/// The validated service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    server_addr: String,
    port: u16,
    render: RenderConfig,
}

// Raw environment variables, before defaults and validation.
#[derive(Deserialize)]
struct RawConfig {
    server_addr: Option<String>,
    port: Option<u16>,
    qr_ec_level: Option<String>,
    qr_dark_color: Option<String>,
    qr_default_size: Option<u32>,
    qr_max_size: Option<u32>,
    qr_quiet_zone: Option<u32>,
}

impl Config {
    /// A configuration with default values, for tests.
    pub fn new_for_test() -> Self {
        Self {
            server_addr: "127.0.0.1".to_string(),
            port: 8080,
            render: RenderConfig::default(),
        }
    }

    pub fn server_addr(&self) -> &str {
        &self.server_addr
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn render(&self) -> &RenderConfig {
        &self.render
    }

    /// Reads the configuration from environment variables and applies defaults.
    pub fn init() -> anyhow::Result<Self> {
        info!("Loading configuration from environment variables");
        let raw: RawConfig = serde_env::from_iter(vars())?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> anyhow::Result<Self> {
        let RawConfig {
            server_addr,
            port,
            qr_ec_level,
            qr_dark_color,
            qr_default_size,
            qr_max_size,
            qr_quiet_zone,
        } = raw;
        let defaults = RenderConfig::default();

        let server_addr = server_addr.unwrap_or_else(|| {
            info!("SERVER_ADDR not set, defaulting to 127.0.0.1");
            "127.0.0.1".to_string()
        });
        let port = port.unwrap_or(8080);

        let ec_level = match qr_ec_level {
            Some(level) => level
                .parse::<EcLevel>()
                .map_err(anyhow::Error::msg)
                .context("invalid QR_EC_LEVEL")?,
            None => defaults.ec_level,
        };

        let dark_color = match qr_dark_color {
            Some(color) => parse_hex_color(&color).context("invalid QR_DARK_COLOR")?,
            None => defaults.dark_color,
        };

        let default_size = qr_default_size.unwrap_or(defaults.default_size);
        let max_size = qr_max_size.unwrap_or(defaults.max_size);
        if default_size == 0 {
            bail!("QR_DEFAULT_SIZE must be positive");
        }
        if max_size < default_size {
            bail!("QR_MAX_SIZE ({max_size}) must not be below QR_DEFAULT_SIZE ({default_size})");
        }

        Ok(Self {
            server_addr,
            port,
            render: RenderConfig {
                dark_color,
                ec_level,
                quiet_zone: qr_quiet_zone.unwrap_or(defaults.quiet_zone),
                default_size,
                max_size,
            },
        })
    }
}

/// Parses `#rrggbb` (the `#` is optional).
fn parse_hex_color(s: &str) -> anyhow::Result<[u8; 3]> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        bail!("expected a colour like #385870, got {s:?}");
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
    Ok([channel(0)?, channel(2)?, channel(4)?])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_env::from_iter;

    #[test]
    fn defaults_when_nothing_is_set() {
        let raw: RawConfig =
            from_iter(Vec::<(&str, &str)>::new()).expect("RawConfig should deserialize");
        let config = Config::from_raw(raw).expect("empty config should build");
        assert_eq!(config.server_addr(), "127.0.0.1");
        assert_eq!(config.port(), 8080);
        assert_eq!(config.render(), &RenderConfig::default());
        assert_eq!(config.render().dark_color, [56, 88, 112]);
        assert_eq!(config.render().ec_level, EcLevel::High);
    }

    #[test]
    fn overrides_are_applied() {
        let raw: RawConfig = from_iter(vec![
            ("SERVER_ADDR", "0.0.0.0"),
            ("PORT", "9000"),
            ("QR_EC_LEVEL", "m"),
            ("QR_DARK_COLOR", "#000000"),
            ("QR_DEFAULT_SIZE", "200"),
            ("QR_MAX_SIZE", "1000"),
            ("QR_QUIET_ZONE", "2"),
        ])
        .expect("RawConfig should deserialize");

        let config = Config::from_raw(raw).expect("config should build");
        assert_eq!(config.server_addr(), "0.0.0.0");
        assert_eq!(config.port(), 9000);
        let render = config.render();
        assert_eq!(render.ec_level, EcLevel::Medium);
        assert_eq!(render.dark_color, [0, 0, 0]);
        assert_eq!(render.default_size, 200);
        assert_eq!(render.max_size, 1000);
        assert_eq!(render.quiet_zone, 2);
    }

    #[test]
    fn bad_ec_level_is_rejected() {
        let raw: RawConfig =
            from_iter(vec![("QR_EC_LEVEL", "X")]).expect("RawConfig should deserialize");
        let err = Config::from_raw(raw).unwrap_err();
        assert!(format!("{err:#}").contains("QR_EC_LEVEL"));
    }

    #[test]
    fn bad_color_is_rejected() {
        let raw: RawConfig =
            from_iter(vec![("QR_DARK_COLOR", "blue")]).expect("RawConfig should deserialize");
        let err = Config::from_raw(raw).unwrap_err();
        assert!(format!("{err:#}").contains("QR_DARK_COLOR"));
    }

    #[test]
    fn max_below_default_is_rejected() {
        let raw: RawConfig = from_iter(vec![("QR_DEFAULT_SIZE", "500"), ("QR_MAX_SIZE", "100")])
            .expect("RawConfig should deserialize");
        assert!(Config::from_raw(raw).is_err());
    }

    #[test]
    fn hex_colors() {
        assert_eq!(parse_hex_color("#385870").unwrap(), [56, 88, 112]);
        assert_eq!(parse_hex_color("ffFFff").unwrap(), [255, 255, 255]);
        assert!(parse_hex_color("#12345").is_err());
        assert!(parse_hex_color("#zzzzzz").is_err());
    }

    #[test]
    fn size_resolution() {
        let render = RenderConfig::default();
        assert_eq!(render.resolve_size(0), 300);
        assert_eq!(render.resolve_size(-20), 300);
        assert_eq!(render.resolve_size(150), 150);
        assert_eq!(render.resolve_size(10_000), 4000);
        assert_eq!(render.resolve_size(i64::MAX), 4000);
    }
}
