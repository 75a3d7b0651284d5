use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum::extract::multipart::Multipart;
use log::{error, info};
use std::io::Cursor;
use std::time::Instant;

use crate::batch::BatchConverter;
use crate::cache::ZoneCache;
use crate::error::Error;
use crate::projection::datum::Datum;
use crate::projection::utm_coord::{converter_for, UtmCoord};
use crate::types::Hemisphere;
use super::models::*;

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Shared state of the API router
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub cache: ZoneCache,
}

pub async fn get_utm(
    State(state): State<AppState>,
    Query(req): Query<UtmRequest>,
) -> Result<Json<UtmResponse>, ApiError> {
    let start = Instant::now();
    let datum = parse_datum(req.datum.as_deref()).map_err(reject)?;

    let converter = converter_for(datum).with_cache(state.cache);
    let coord = UtmCoord::project(
        &converter,
        datum,
        req.latitude.to_radians(),
        req.longitude.to_radians(),
    )
    .map_err(reject)?;

    Ok(Json(UtmResponse {
        latitude: req.latitude,
        longitude: req.longitude,
        zone: coord.zone,
        hemisphere: coord.hemisphere.to_string(),
        easting: coord.easting,
        northing: coord.northing,
        central_meridian: coord.central_meridian.to_degrees(),
        datum: datum.to_string(),
        execution_time_ms: start.elapsed().as_secs_f64() * 1000.0,
    }))
}

pub async fn get_geodetic(
    State(state): State<AppState>,
    Query(req): Query<GeodeticRequest>,
) -> Result<Json<GeodeticResponse>, ApiError> {
    let start = Instant::now();
    let datum = parse_datum(req.datum.as_deref()).map_err(reject)?;
    let hemisphere: Hemisphere = req.hemisphere.parse().map_err(reject)?;

    let converter = converter_for(datum).with_cache(state.cache);
    let coord = UtmCoord::unproject(
        &converter,
        datum,
        req.zone,
        hemisphere,
        req.easting,
        req.northing,
    )
    .map_err(reject)?;

    Ok(Json(GeodeticResponse {
        zone: req.zone,
        hemisphere: hemisphere.to_string(),
        easting: req.easting,
        northing: req.northing,
        latitude: coord.latitude.to_degrees(),
        longitude: coord.longitude.to_degrees(),
        datum: datum.to_string(),
        execution_time_ms: start.elapsed().as_secs_f64() * 1000.0,
    }))
}

/// Converts an uploaded CSV file.
///
/// Multipart fields: `csv` (required), `datum`, and `direction` which is
/// either `to_utm` (default, latitude/longitude rows) or `from_utm`.
pub async fn convert_batch(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut csv_data: Option<Vec<u8>> = None;
    let mut datum = Datum::Wgs84;
    let mut inverse = false;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "csv" => {
                csv_data = Some(field.bytes().await.map_err(bad_multipart)?.to_vec());
            }
            "datum" => {
                let text = field.text().await.map_err(bad_multipart)?;
                datum = text.parse().map_err(reject)?;
            }
            "direction" => {
                let text = field.text().await.map_err(bad_multipart)?;
                inverse = match text.trim() {
                    "to_utm" | "" => false,
                    "from_utm" => true,
                    other => {
                        return Err(reject(Error::InvalidInput(format!(
                            "Unknown direction: {}",
                            other
                        ))))
                    }
                };
            }
            _ => {}
        }
    }

    let csv_data = csv_data.ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Missing CSV file".to_string(),
                flags: None,
            }),
        )
    })?;

    let converter = BatchConverter::with_cache(datum, state.cache);
    let converted = tokio::task::spawn_blocking(move || {
        let mut output = Vec::with_capacity(csv_data.len() * 2);
        let stats = if inverse {
            converter.convert_utm_csv(Cursor::new(csv_data), &mut output)
        } else {
            converter.convert_csv(Cursor::new(csv_data), &mut output)
        };
        stats.map(|stats| (stats, output))
    })
    .await
    .map_err(|e| {
        error!("batch worker failed: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Batch conversion failed".to_string(),
                flags: None,
            }),
        )
    })?;

    let (stats, output) = converted.map_err(reject)?;
    info!("batch request: {} points, {} failed", stats.total, stats.failed);

    Ok((
        [
            (header::CONTENT_TYPE, mime::TEXT_CSV.as_ref()),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"utm_results.csv\"",
            ),
        ],
        output,
    )
        .into_response())
}

fn parse_datum(datum: Option<&str>) -> crate::Result<Datum> {
    match datum {
        Some(name) if !name.trim().is_empty() => name.parse(),
        _ => Ok(Datum::Wgs84),
    }
}

fn reject(error: Error) -> ApiError {
    let status = match error {
        Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    };
    let flags = error
        .tm_flags()
        .map(|flags| flags.bits())
        .or_else(|| error.utm_flags().map(|flags| flags.bits()));

    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            flags,
        }),
    )
}

fn bad_multipart(error: axum::extract::multipart::MultipartError) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: format!("Invalid multipart body: {}", error),
            flags: None,
        }),
    )
}
