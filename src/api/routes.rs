use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower::ServiceBuilder;
use axum::extract::DefaultBodyLimit;

use crate::cache::ZoneCache;
use super::handlers::*;

pub fn create_router() -> Router {
    create_router_with_cache(ZoneCache::default())
}

/// Router whose conversions share `cache` for zone converters
pub fn create_router_with_cache(cache: ZoneCache) -> Router {
    Router::new()
        .route("/api/utm", get(get_utm))
        .route("/api/geodetic", get(get_geodetic))
        .route("/api/batch", post(convert_batch))
        .with_state(AppState { cache })
        .layer(
            ServiceBuilder::new()
                .layer(DefaultBodyLimit::max(100 * 1024 * 1024)) // 100MB limit
                .layer(CorsLayer::permissive())
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{ErrorResponse, GeodeticResponse, UtmResponse};
    use crate::projection::flags::UtmFlags;
    use approx::assert_abs_diff_eq;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_get_utm() {
        let (status, body) = send(
            create_router(),
            get_request("/api/utm?latitude=45&longitude=-75"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let response: UtmResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(response.zone, 18);
        assert_eq!(response.hemisphere, "N");
        assert_eq!(response.datum, "WGS84");
        assert_abs_diff_eq!(response.easting, 500_000.0, epsilon = 1e-6);
        assert_abs_diff_eq!(response.northing, 4_982_950.400_2, epsilon = 1e-3);
        assert_abs_diff_eq!(response.central_meridian, -75.0, epsilon = 1e-9);
    }

    #[tokio::test]
    async fn test_get_utm_out_of_range() {
        let (status, body) = send(
            create_router(),
            get_request("/api/utm?latitude=88&longitude=0"),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let response: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(response.flags, Some(UtmFlags::LAT_ERROR.bits()));
        assert!(response.error.contains("latitude out of range"));
    }

    #[tokio::test]
    async fn test_unknown_datum() {
        let (status, _) = send(
            create_router(),
            get_request("/api/utm?latitude=45&longitude=-75&datum=ED50"),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_geodetic() {
        let cache = ZoneCache::new(8);
        let (status, body) = send(
            create_router_with_cache(cache.clone()),
            get_request("/api/geodetic?zone=17&hemisphere=N&easting=500000&northing=0"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let response: GeodeticResponse = serde_json::from_slice(&body).unwrap();
        assert_abs_diff_eq!(response.latitude, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(response.longitude, -81.0, epsilon = 1e-9);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_get_geodetic_bad_hemisphere() {
        let (status, body) = send(
            create_router(),
            get_request("/api/geodetic?zone=17&hemisphere=E&easting=500000&northing=0"),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let response: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(response.flags, Some(UtmFlags::HEMISPHERE_ERROR.bits()));
    }

    fn multipart_request(fields: &[(&str, &str)]) -> Request<Body> {
        let boundary = "utmkit-test-boundary";
        let mut body = String::new();
        for (name, value) in fields {
            body.push_str(&format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                boundary, name, value
            ));
        }
        body.push_str(&format!("--{}--\r\n", boundary));

        Request::builder()
            .method("POST")
            .uri("/api/batch")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_batch_upload() {
        let request = multipart_request(&[("csv", "latitude,longitude\n45,-75\n88,0\n")]);
        let (status, body) = send(create_router(), request).await;

        assert_eq!(status, StatusCode::OK);
        let text = String::from_utf8(body).unwrap();
        assert!(text.contains("# Failed: 1"));
        assert!(text.contains("45,-75,18,N,500000.000,4982950.400"));
        assert!(text.contains("88,0,ERROR,ERROR,ERROR,ERROR"));
    }

    #[tokio::test]
    async fn test_batch_upload_inverse() {
        let request = multipart_request(&[
            ("direction", "from_utm"),
            ("csv", "zone,hemisphere,easting,northing\n17,N,500000,0\n"),
        ]);
        let (status, body) = send(create_router(), request).await;

        assert_eq!(status, StatusCode::OK);
        let text = String::from_utf8(body).unwrap();
        assert!(text.contains("17,N,500000,0,0.00000000,-81.00000000"));
    }

    #[tokio::test]
    async fn test_batch_missing_csv() {
        let request = multipart_request(&[("datum", "NAD27")]);
        let (status, body) = send(create_router(), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let response: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(response.error, "Missing CSV file");
    }
}
