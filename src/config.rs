//! Fixed configuration. The app deliberately has no CLI flags, env vars or
//! config file; everything below is baked in at build time.

use crate::resolver::Mode;

/// Base URL of the remote country API (API mode only).
pub const API_BASE: &str = "https://your-api.example.com";

/// Relative path of the country polygon asset.
pub const GEOJSON_PATH: &str = "data/countries.json";

/// Data source used at startup.
pub const DEFAULT_MODE: Mode = Mode::Mock;

/// Diagnostic log file. Stderr is unusable while the terminal is in raw mode.
pub const LOG_PATH: &str = "forest-atlas.log";

/// User-Agent sent with every API request.
pub const USER_AGENT: &str = "forest-atlas/0.1";
