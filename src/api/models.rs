use serde::{Deserialize, Serialize};

/// Query of `GET /api/utm`, degrees
#[derive(Debug, Serialize, Deserialize)]
pub struct UtmRequest {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub datum: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UtmResponse {
    pub latitude: f64,
    pub longitude: f64,
    pub zone: u8,
    pub hemisphere: String,
    pub easting: f64,
    pub northing: f64,
    pub central_meridian: f64,
    pub datum: String,
    pub execution_time_ms: f64,
}

/// Query of `GET /api/geodetic`
#[derive(Debug, Serialize, Deserialize)]
pub struct GeodeticRequest {
    pub zone: u8,
    pub hemisphere: String,
    pub easting: f64,
    pub northing: f64,
    #[serde(default)]
    pub datum: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeodeticResponse {
    pub zone: u8,
    pub hemisphere: String,
    pub easting: f64,
    pub northing: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub datum: String,
    pub execution_time_ms: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Raw conversion flag bits when a converter rejected the input
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u32>,
}
