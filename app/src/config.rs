use crate::error::{Result, ViewerError};

pub const DEFAULT_API_SERVER: &str = "http://localhost:8080";
pub const DEFAULT_TILE_SERVERS: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const DEFAULT_NEARBY_MIN_ZOOM: u8 = 16;
pub const DEFAULT_ZOOM: u8 = 12;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_server: String,
    pub tiles: TileConfig,
    /// Lowest zoom level at which nearby stops are fetched.
    pub nearby_min_zoom: u8,
    pub default_zoom: u8,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileConfig {
    pub servers: String,
    pub attribution: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_server: option_env!("API_SERVER")
                .unwrap_or(DEFAULT_API_SERVER)
                .to_string(),
            tiles: TileConfig {
                servers: DEFAULT_TILE_SERVERS.to_string(),
                attribution: String::new(),
            },
            nearby_min_zoom: DEFAULT_NEARBY_MIN_ZOOM,
            default_zoom: DEFAULT_ZOOM,
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let api_server = dotenvy::var("API_SERVER")
            .ok()
            .filter(|s| !s.is_empty())
            .map_or(defaults.api_server, |s| s.trim_end_matches('/').to_string());

        let servers = dotenvy::var("TILE_SERVERS")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.tiles.servers);

        let attribution = dotenvy::var("TILE_ATTRIBUTION").unwrap_or_default();

        let nearby_min_zoom = parse_env_u8("NEARBY_MIN_ZOOM", DEFAULT_NEARBY_MIN_ZOOM)?;
        let default_zoom = parse_env_u8("DEFAULT_ZOOM", DEFAULT_ZOOM)?;

        let request_timeout_secs = dotenvy::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<u64>()
            .map_err(|_| ViewerError::Config("Invalid REQUEST_TIMEOUT_SECS".to_string()))?;

        if request_timeout_secs == 0 {
            return Err(ViewerError::Config(
                "REQUEST_TIMEOUT_SECS must be positive".to_string(),
            ));
        }

        Ok(Config {
            api_server,
            tiles: TileConfig {
                servers,
                attribution,
            },
            nearby_min_zoom,
            default_zoom,
            request_timeout_secs,
        })
    }

    /// Attribution line shown under the map tiles.
    pub fn tile_attribution(&self) -> String {
        let osm = "&copy; <a href=\"https://openstreetmap.org/copyright\">OpenStreetMap contributors</a>";
        if self.tiles.attribution.is_empty() {
            osm.to_string()
        } else {
            format!("{osm} | {}", self.tiles.attribution)
        }
    }
}

fn parse_env_u8(key: &str, default: u8) -> Result<u8> {
    dotenvy::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<u8>()
        .map_err(|_| ViewerError::Config(format!("Invalid {key}")))
}
