//! Map tile layers: a street base map and a temperature overlay.

const STREET_TEMPLATE: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
const TEMPERATURE_TEMPLATE: &str =
    "https://tile.openweathermap.org/map/temp_new/{z}/{x}/{y}.png?appid={key}";
const STREET_SUBDOMAINS: &[&str] = &["a", "b", "c"];

/// Deepest zoom level the street tile server publishes
pub const MAX_ZOOM: u8 = 19;

#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    pub name: &'static str,
    /// URL with `{z}`, `{x}`, `{y}` and optionally `{s}` placeholders
    pub template: String,
    pub opacity: f32,
}

impl TileLayer {
    pub fn street() -> Self {
        Self {
            name: "street",
            template: STREET_TEMPLATE.to_string(),
            opacity: 1.0,
        }
    }

    /// Half-transparent temperature overlay; the key is baked into the template
    pub fn temperature(api_key: &str) -> Self {
        Self {
            name: "temperature",
            template: TEMPERATURE_TEMPLATE.replace("{key}", api_key),
            opacity: 0.5,
        }
    }

    /// Concrete URL for one tile. Subdomains rotate by tile position.
    pub fn tile_url(&self, z: u8, x: u32, y: u32) -> String {
        let subdomain = STREET_SUBDOMAINS[((x + y) as usize) % STREET_SUBDOMAINS.len()];
        self.template
            .replace("{s}", subdomain)
            .replace("{z}", &z.to_string())
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string())
    }
}

/// Slippy-map tile containing a coordinate at `zoom`, clamped to [`MAX_ZOOM`]
pub fn tile_for(lat: f64, lon: f64, zoom: u8) -> (u32, u32) {
    let n = f64::from(1u32 << zoom.min(MAX_ZOOM));
    let x = ((lon + 180.0) / 360.0 * n).floor();
    let lat_rad = lat.to_radians();
    let y = ((1.0 - lat_rad.tan().asinh() / std::f64::consts::PI) / 2.0 * n).floor();
    let max = n - 1.0;
    (x.clamp(0.0, max) as u32, y.clamp(0.0, max) as u32)
}
