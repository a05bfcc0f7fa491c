//! End-to-end tests of `WeatherApp` over fake location and weather providers.

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use parking_lot::Mutex;
use weatherview_core::{
    Accuracy, Coordinate, CurrentConditions, Flow, FlowPhase, ForecastSet, GeocodedPlace,
    LocationProvider, LookupMode, PermissionStatus, ViewStateStore, WeatherApp, WeatherError,
    WeatherProvider, WeatherQuery, WritePolicy,
};

#[derive(Debug)]
struct FakeLocation {
    status: PermissionStatus,
    coordinate: Option<Coordinate>,
    places: Result<Vec<GeocodedPlace>, WeatherError>,
    permission_requests: Mutex<usize>,
}

impl FakeLocation {
    fn granted() -> Self {
        Self {
            status: PermissionStatus::Granted,
            coordinate: Some(Coordinate::new(61.5, 23.76)),
            places: Ok(vec![GeocodedPlace {
                city: Some("'Tampere'".into()),
                iso_country_code: Some("FI".into()),
            }]),
            permission_requests: Mutex::new(0),
        }
    }
}

#[async_trait]
impl LocationProvider for FakeLocation {
    async fn request_foreground_permission(&self) -> Result<PermissionStatus, WeatherError> {
        *self.permission_requests.lock() += 1;
        Ok(self.status)
    }

    async fn current_position(&self, _accuracy: Accuracy) -> Result<Coordinate, WeatherError> {
        self.coordinate.ok_or_else(|| WeatherError::location_unavailable("no fix"))
    }

    async fn reverse_geocode(&self, _: Coordinate) -> Result<Vec<GeocodedPlace>, WeatherError> {
        self.places.clone()
    }
}

/// Answers every query with the configured results; conditions are tagged with the query
/// label so tests can tell which request produced the visible data.
#[derive(Debug, Default)]
struct FakeWeather {
    current_error: Mutex<Option<WeatherError>>,
    forecast_error: Mutex<Option<WeatherError>>,
    delays: HashMap<String, Duration>,
    queries: Mutex<Vec<WeatherQuery>>,
}

impl FakeWeather {
    fn with_delays(delays: &[(&str, u64)]) -> Self {
        Self {
            delays: delays
                .iter()
                .map(|(q, ms)| (q.to_string(), Duration::from_millis(*ms)))
                .collect(),
            ..Self::default()
        }
    }

    fn fail_current(&self, err: Option<WeatherError>) {
        *self.current_error.lock() = err;
    }

    fn fail_both(&self, err: WeatherError) {
        *self.current_error.lock() = Some(err.clone());
        *self.forecast_error.lock() = Some(err);
    }

    async fn delay_for(&self, query: &WeatherQuery) {
        if let Some(delay) = self.delays.get(&query.label()) {
            tokio::time::sleep(*delay).await;
        }
    }
}

#[async_trait]
impl WeatherProvider for FakeWeather {
    async fn current(&self, query: &WeatherQuery) -> Result<CurrentConditions, WeatherError> {
        self.queries.lock().push(query.clone());
        self.delay_for(query).await;

        if let Some(err) = self.current_error.lock().clone() {
            return Err(err);
        }
        Ok(CurrentConditions {
            description: "scattered clouds".into(),
            icon_id: "03d".into(),
            temperature_c: 11.0,
            feels_like_c: 10.0,
            wind_speed: 2.0,
            wind_gust: None,
            precipitation_1h: None,
            sunrise_unix: Some(1_714_531_000),
            sunset_unix: Some(1_714_589_000),
            country_code: "FI".into(),
            place_name: Some(query.label()),
            status_code: 200,
            timezone_offset_secs: 10800,
        })
    }

    async fn forecast(&self, query: &WeatherQuery) -> Result<ForecastSet, WeatherError> {
        self.delay_for(query).await;

        if let Some(err) = self.forecast_error.lock().clone() {
            return Err(err);
        }
        ForecastSet::new(200, Vec::new())
    }
}

fn app(
    location: FakeLocation,
    weather: Arc<FakeWeather>,
    policy: WritePolicy,
) -> (WeatherApp, Arc<ViewStateStore>) {
    let store = Arc::new(ViewStateStore::new(policy));
    let app = WeatherApp::new(Arc::new(location), weather, store.clone());
    (app, store)
}

#[tokio::test]
async fn refresh_success_fills_current_location_slots() {
    let weather = Arc::new(FakeWeather::default());
    let (app, store) = app(FakeLocation::granted(), weather.clone(), WritePolicy::Guarded);

    let outcome = app.refresh_current_location(Accuracy::Low).await;
    assert!(outcome.applied);

    let view = store.snapshot(Flow::CurrentLocation);
    assert_eq!(view.phase(), FlowPhase::Success);
    assert_eq!(view.label.as_deref(), Some("Tampere, FI"));
    assert_eq!(view.conditions.success().map(|c| c.status_code), Some(200));
    assert_eq!(
        weather.queries.lock().first(),
        Some(&WeatherQuery::Coordinate(Coordinate::new(61.5, 23.76)))
    );
    assert_eq!(store.snapshot(Flow::Search).phase(), FlowPhase::Idle);
}

#[tokio::test]
async fn denied_permission_stops_before_fetching() {
    let weather = Arc::new(FakeWeather::default());
    let location = FakeLocation { status: PermissionStatus::Denied, ..FakeLocation::granted() };
    let (app, store) = app(location, weather.clone(), WritePolicy::Guarded);

    app.refresh_current_location(Accuracy::Low).await;

    let view = store.snapshot(Flow::CurrentLocation);
    assert_eq!(view.phase(), FlowPhase::Failure);
    assert_eq!(view.conditions.failure(), Some(&WeatherError::PermissionDenied));
    assert_eq!(view.forecast.failure(), Some(&WeatherError::PermissionDenied));
    assert!(weather.queries.lock().is_empty());
}

#[tokio::test]
async fn each_refresh_asks_for_permission_once() {
    let weather = Arc::new(FakeWeather::default());
    let location = Arc::new(FakeLocation::granted());
    let store = Arc::new(ViewStateStore::default());
    let app = WeatherApp::new(location.clone(), weather, store);

    app.refresh_current_location(Accuracy::Low).await;
    app.refresh_current_location(Accuracy::Lowest).await;

    assert_eq!(*location.permission_requests.lock(), 2);
}

#[tokio::test]
async fn missing_fix_is_location_unavailable() {
    let weather = Arc::new(FakeWeather::default());
    let location = FakeLocation { coordinate: None, ..FakeLocation::granted() };
    let (app, store) = app(location, weather.clone(), WritePolicy::Guarded);

    app.refresh_current_location(Accuracy::High).await;

    let view = store.snapshot(Flow::CurrentLocation);
    let err = view.conditions.failure().expect("failure");
    assert_eq!(err.kind(), "location_unavailable");
    assert!(err.is_location_failure());
    assert!(weather.queries.lock().is_empty());
}

#[tokio::test]
async fn invalid_credential_replaces_previous_success() {
    let weather = Arc::new(FakeWeather::default());
    let (app, store) = app(FakeLocation::granted(), weather.clone(), WritePolicy::Guarded);

    app.refresh_current_location(Accuracy::Low).await;
    assert_eq!(store.snapshot(Flow::CurrentLocation).phase(), FlowPhase::Success);

    weather.fail_both(WeatherError::InvalidCredential);
    app.refresh_current_location(Accuracy::Low).await;

    let view = store.snapshot(Flow::CurrentLocation);
    assert_eq!(view.conditions.failure(), Some(&WeatherError::InvalidCredential));
    assert!(view.conditions.success().is_none());
}

#[tokio::test]
async fn unknown_search_term_leaves_current_location_alone() {
    let weather = Arc::new(FakeWeather::default());
    let (app, store) = app(FakeLocation::granted(), weather.clone(), WritePolicy::Guarded);

    app.refresh_current_location(Accuracy::Low).await;
    let before = store.snapshot(Flow::CurrentLocation);

    weather.fail_current(Some(WeatherError::place_not_found("Atlantis")));
    app.search("Atlantis").await;

    let search = store.snapshot(Flow::Search);
    let err = search.conditions.failure().expect("search should fail");
    assert_eq!(err.user_message(), "Could not find weather for \"Atlantis\"");
    assert_eq!(search.label.as_deref(), Some("Atlantis"));
    assert_eq!(store.snapshot(Flow::CurrentLocation), before);
}

#[tokio::test]
async fn blank_search_is_not_sent() {
    let weather = Arc::new(FakeWeather::default());
    let (app, store) = app(FakeLocation::granted(), weather.clone(), WritePolicy::Guarded);

    app.search("   ").await;

    let view = store.snapshot(Flow::Search);
    assert_eq!(view.conditions.failure().map(WeatherError::kind), Some("place_not_found"));
    assert!(weather.queries.lock().is_empty());
}

#[tokio::test]
async fn refresh_does_not_touch_search_slots() {
    let weather = Arc::new(FakeWeather::default());
    let (app, store) = app(FakeLocation::granted(), weather, WritePolicy::Guarded);

    app.search("Oslo").await;
    let before = store.snapshot(Flow::Search);

    app.refresh_current_location(Accuracy::Low).await;

    assert_eq!(store.snapshot(Flow::Search), before);
}

#[tokio::test(start_paused = true)]
async fn guarded_store_keeps_newest_search_when_older_finishes_last() {
    let weather = Arc::new(FakeWeather::with_delays(&[("Oslo", 100), ("Bergen", 10)]));
    let (app, store) = app(FakeLocation::granted(), weather, WritePolicy::Guarded);

    let (first, second) = tokio::join!(app.search("Oslo"), async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        app.search("Bergen").await
    });

    assert!(second.applied);
    assert!(!first.applied);

    let view = store.snapshot(Flow::Search);
    assert_eq!(view.label.as_deref(), Some("Bergen"));
    assert_eq!(
        view.conditions.success().and_then(|c| c.place_name.as_deref()),
        Some("Bergen")
    );
}

#[tokio::test(start_paused = true)]
async fn last_write_wins_store_shows_last_completed_search() {
    let weather = Arc::new(FakeWeather::with_delays(&[("Oslo", 100), ("Bergen", 10)]));
    let (app, store) = app(FakeLocation::granted(), weather, WritePolicy::LastWriteWins);

    let (first, second) = tokio::join!(app.search("Oslo"), async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        app.search("Bergen").await
    });

    assert!(first.applied && second.applied);

    let view = store.snapshot(Flow::Search);
    assert_eq!(
        view.conditions.success().and_then(|c| c.place_name.as_deref()),
        Some("Oslo")
    );
    assert_eq!(view.label.as_deref(), Some("Oslo"));
}

#[tokio::test]
async fn place_name_lookup_queries_by_city_key() {
    let weather = Arc::new(FakeWeather::default());
    let (app, store) = app(FakeLocation::granted(), weather.clone(), WritePolicy::Guarded);
    let app = app.with_lookup(LookupMode::PlaceName);

    app.refresh_current_location(Accuracy::Low).await;

    assert_eq!(
        weather.queries.lock().first(),
        Some(&WeatherQuery::Place("Tampere,FI".into()))
    );
    assert_eq!(store.snapshot(Flow::CurrentLocation).phase(), FlowPhase::Success);
}

#[tokio::test]
async fn place_name_lookup_fails_on_geocoding_miss() {
    let weather = Arc::new(FakeWeather::default());
    let location = FakeLocation { places: Ok(Vec::new()), ..FakeLocation::granted() };
    let (app, store) = app(location, weather.clone(), WritePolicy::Guarded);
    let app = app.with_lookup(LookupMode::PlaceName);

    app.refresh_current_location(Accuracy::Low).await;

    let view = store.snapshot(Flow::CurrentLocation);
    assert_eq!(view.conditions.failure().map(WeatherError::kind), Some("location_unavailable"));
    assert!(weather.queries.lock().is_empty());
}

#[tokio::test]
async fn coordinate_lookup_labels_by_coordinate_when_geocoding_fails() {
    let weather = Arc::new(FakeWeather::default());
    let location = FakeLocation {
        places: Err(WeatherError::network("geocoder down")),
        ..FakeLocation::granted()
    };
    let (app, store) = app(location, weather, WritePolicy::Guarded);

    app.refresh_current_location(Accuracy::Low).await;

    let view = store.snapshot(Flow::CurrentLocation);
    assert_eq!(view.phase(), FlowPhase::Success);
    assert_eq!(view.label.as_deref(), Some("61.5000, 23.7600"));
}
