/// Default study area
pub const DEFAULT_PLACE_NAME: &str = "Denkendorf, Baden-Württemberg, Deutschland";
pub const DEFAULT_SHORT_NAME: &str = "denkendorf";
pub const DEFAULT_LATITUDE: f64 = 48.7039;
pub const DEFAULT_LONGITUDE: f64 = 9.3190;
pub const DEFAULT_YEAR: i32 = 2023;
pub const DEFAULT_TIMEZONE: &str = "Europe/Berlin";

/// Used when neither a fetched nor a cached precipitation value exists
pub const FALLBACK_PRECIP_MM: f64 = 900.0;

/// Directory names
pub const DEFAULT_DATA_DIR: &str = "data/interim";
pub const DEFAULT_OUTPUT_DIR: &str = "outputs/figures";

/// Output file names
pub const MAP_FILE: &str = "rainwater_map.html";
pub const CHART_FILE: &str = "rainwater_statistics.png";
pub const DEFAULT_CONFIG_FILE: &str = "rainwater.toml";

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "RAINWATER";

/// External services
pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";
pub const OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";
pub const OPEN_METEO_ARCHIVE_URL: &str = "https://archive-api.open-meteo.com/v1/archive";
pub const USER_AGENT: &str = concat!("rainwater-potential/", env!("CARGO_PKG_VERSION"));
pub const OVERPASS_TIMEOUT_SECS: u64 = 180;

/// Overpass area ids are the OSM id offset by element type
pub const OVERPASS_RELATION_AREA_OFFSET: i64 = 3_600_000_000;
pub const OVERPASS_WAY_AREA_OFFSET: i64 = 2_400_000_000;

/// Reporting defaults
pub const DEFAULT_TOP_N: usize = 10;

/// Impact assumptions (approximate)
pub const LITERS_PER_PERSON_PER_DAY: f64 = 120.0;
pub const DAYS_PER_YEAR: f64 = 365.0;
pub const CO2_KG_PER_M3_WATER: f64 = 0.7;
/// CO2 of one 10,000 km car journey
pub const CO2_KG_PER_CAR_JOURNEY: f64 = 2300.0;

/// Chart layout
pub const HISTOGRAM_BINS: usize = 50;
pub const CHART_WIDTH: u32 = 1800;
pub const CHART_HEIGHT: u32 = 1440;

/// Map defaults
pub const MAP_ZOOM: u8 = 15;
pub const MAP_FILL_OPACITY: f64 = 0.7;
