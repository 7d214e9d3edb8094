//! Integration tests for the weather and geolocation clients using wiremock.
//!
//! These tests run the clients, the cached service and the refresh task
//! against a mock HTTP server.

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wxlookup::config::Config;
use wxlookup::location::{GeoClient, GeoError, LocationQuery};
use wxlookup::refresh::{RefreshConfig, RefreshHandle, RefreshMessage};
use wxlookup::service::WeatherService;
use wxlookup::weather::{Language, Units, WeatherClient, WeatherError};

fn current_body(name: &str, temp: f64) -> serde_json::Value {
    serde_json::json!({
        "weather": [{"id": 800, "main": "Clear", "description": "clear sky", "icon": "01d"}],
        "main": {"temp": temp, "feels_like": temp - 0.5, "humidity": 40},
        "wind": {"speed": 2.5},
        "sys": {"country": "FR"},
        "name": name
    })
}

fn forecast_body() -> serde_json::Value {
    serde_json::json!({
        "list": [
            {"main": {"temp": 21.0, "feels_like": 20.5, "humidity": 50},
             "weather": [{"description": "clear sky", "icon": "01d"}],
             "wind": {"speed": 3.0}, "dt_txt": "2024-07-15 12:00:00"},
            {"main": {"temp": 25.0, "feels_like": 25.0, "humidity": 45},
             "weather": [{"description": "clear sky", "icon": "01d"}],
             "wind": {"speed": 3.5}, "dt_txt": "2024-07-15 15:00:00"},
            {"main": {"temp": 16.0, "feels_like": 15.5, "humidity": 70},
             "weather": [{"description": "light rain", "icon": "10n"}],
             "wind": {"speed": 1.5}, "dt_txt": "2024-07-16 00:00:00"}
        ],
        "city": {"name": "Paris", "country": "FR"}
    })
}

fn test_config(server: &MockServer) -> Config {
    Config {
        api_key: Some("test-key".to_string()),
        base_url: server.uri(),
        geo_base_url: server.uri(),
        ip_locate_url: format!("{}/json", server.uri()),
        ..Config::default()
    }
}

fn paris() -> LocationQuery {
    LocationQuery::parse("Paris, FR").unwrap()
}

#[tokio::test]
async fn test_fetch_current_sends_query_parameters() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("q", "Paris, FR"))
        .and(query_param("appid", "test-key"))
        .and(query_param("units", "imperial"))
        .and(query_param("lang", "es"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body("Paris", 77.0)))
        .mount(&mock_server)
        .await;

    let client = WeatherClient::new("test-key").with_base_url(mock_server.uri());
    let conditions = client
        .fetch_current("Paris, FR", Units::Imperial, Language::Spanish)
        .await
        .unwrap();

    assert_eq!(conditions.location, "Paris, FR");
    assert_eq!(conditions.units, Units::Imperial);
    assert!((conditions.temperature - 77.0).abs() < 0.01);
    assert_eq!(conditions.humidity, 40);
}

#[tokio::test]
async fn test_fetch_forecast_groups_days() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .mount(&mock_server)
        .await;

    let client = WeatherClient::new("test-key").with_base_url(mock_server.uri());
    let forecast = client
        .fetch_forecast("Paris", Units::Metric, Language::English)
        .await
        .unwrap();

    assert_eq!(forecast.entries.len(), 3);
    let days = forecast.daily_summary();
    assert_eq!(days.len(), 2);
    assert!((days[0].min_temperature - 21.0).abs() < 0.01);
    assert!((days[0].max_temperature - 25.0).abs() < 0.01);
    assert_eq!(days[1].description, "light rain");
}

#[tokio::test]
async fn test_not_found_maps_to_location_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(serde_json::json!({"cod": "404", "message": "city not found"})),
        )
        .mount(&mock_server)
        .await;

    let client = WeatherClient::new("test-key").with_base_url(mock_server.uri());
    let result = client.fetch_current("Atlantis", Units::Metric, Language::English).await;

    match result {
        Err(WeatherError::LocationNotFound(location)) => assert_eq!(location, "Atlantis"),
        other => panic!("Expected LocationNotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unauthorized_keeps_api_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "cod": 401,
            "message": "Invalid API key. Please see https://openweathermap.org/faq#error401 for more info."
        })))
        .mount(&mock_server)
        .await;

    let client = WeatherClient::new("bad-key").with_base_url(mock_server.uri());
    let err = client
        .fetch_current("Paris", Units::Metric, Language::English)
        .await
        .unwrap_err();

    match err {
        WeatherError::Api { status, message } => {
            assert_eq!(status, 401);
            assert!(message.starts_with("Invalid API key"));
        }
        other => panic!("Expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_service_serves_repeat_lookups_from_cache() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body("Paris", 22.0)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = WeatherService::from_config(&test_config(&mock_server)).unwrap();

    let first = service.current(&paris()).await.unwrap();
    // Same place, different spelling
    let second = service
        .current(&LocationQuery::parse("  paris ,fr").unwrap())
        .await
        .unwrap();

    assert_eq!(first, second);
    let stats = service.current_stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 1);
}

#[tokio::test]
async fn test_service_does_not_cache_failures() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body("Paris", 22.0)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = WeatherService::from_config(&test_config(&mock_server)).unwrap();

    let err = service.current(&paris()).await.unwrap_err();
    assert!(matches!(err, WeatherError::Api { status: 500, .. }));

    let conditions = service.current(&paris()).await.unwrap();
    assert_eq!(conditions.location, "Paris, FR");
}

#[tokio::test]
async fn test_service_invalidate_forces_refetch() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body("Paris", 22.0)))
        .expect(2)
        .mount(&mock_server)
        .await;

    let service = WeatherService::from_config(&test_config(&mock_server)).unwrap();

    service.current(&paris()).await.unwrap();
    service.invalidate(&paris());
    service.current(&paris()).await.unwrap();
}

#[tokio::test]
async fn test_service_report_with_forecast() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body("Paris", 22.0)))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .mount(&mock_server)
        .await;

    let service = WeatherService::from_config(&test_config(&mock_server)).unwrap();
    let report = service.report(&paris(), true).await.unwrap();

    assert_eq!(report.current.location, "Paris, FR");
    assert_eq!(report.forecast.map(|f| f.entries.len()), Some(3));
}

#[tokio::test]
async fn test_service_times_out_slow_fetch() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(current_body("Paris", 22.0))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let config = Config {
        fetch_timeout_secs: 1,
        ..test_config(&mock_server)
    };
    let service = WeatherService::from_config(&config).unwrap();

    let err = service.current(&paris()).await.unwrap_err();
    assert!(err.to_string().contains("timed out"), "Unexpected error: {}", err);
}

#[tokio::test]
async fn test_suggest_returns_places() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .and(query_param("q", "Springfield"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"name": "Springfield", "state": "Illinois", "country": "US", "lat": 39.8, "lon": -89.6},
            {"name": "Springfield", "country": "AU", "lat": -33.1, "lon": 151.2}
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = WeatherService::from_config(&test_config(&mock_server)).unwrap();
    let query = LocationQuery::parse("Springfield").unwrap();

    let places = service.suggest(&query).await.unwrap();
    assert_eq!(places.len(), 2);
    assert_eq!(places[0].label(), "Springfield, Illinois, US");
    assert_eq!(places[1].label(), "Springfield, AU");

    // Served from cache
    let again = service.suggest(&query).await.unwrap();
    assert_eq!(again, places);
}

#[tokio::test]
async fn test_locate_by_ip() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "city": "Lyon",
            "regionName": "Auvergne-Rhone-Alpes",
            "countryCode": "FR",
            "lat": 45.75,
            "lon": 4.85
        })))
        .mount(&mock_server)
        .await;

    let service = WeatherService::from_config(&test_config(&mock_server)).unwrap();
    let query = service.locate().await.unwrap();
    assert_eq!(query.as_str(), "Lyon, FR");
}

#[tokio::test]
async fn test_locate_by_ip_reports_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "fail",
            "message": "private range"
        })))
        .mount(&mock_server)
        .await;

    let client = GeoClient::new("test-key").with_ip_locate_url(format!("{}/json", mock_server.uri()));
    match client.locate_by_ip().await {
        Err(GeoError::Lookup(message)) => assert_eq!(message, "private range"),
        other => panic!("Expected Lookup error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_refresh_task_delivers_update() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body("Paris", 22.0)))
        .mount(&mock_server)
        .await;

    let service = Arc::new(WeatherService::from_config(&test_config(&mock_server)).unwrap());
    let mut handle = RefreshHandle::spawn(
        service,
        paris(),
        RefreshConfig {
            interval: Duration::from_secs(60),
            with_forecast: false,
            enabled: true,
        },
    );

    let mut update = None;
    while let Ok(Some(message)) =
        tokio::time::timeout(Duration::from_secs(5), handle.receiver.recv()).await
    {
        if let RefreshMessage::Updated(report) = message {
            update = Some(report);
            break;
        }
    }

    let report = update.expect("Expected an update from the refresh task");
    assert_eq!(report.current.location, "Paris, FR");
    assert!(report.forecast.is_none());

    tokio::time::timeout(Duration::from_secs(5), handle.shutdown())
        .await
        .expect("Refresh task should stop promptly");
}
