//! Explicit view-state container shared between the pipeline and the presentation layer.
//!
//! Two flows (current location, search) each own a conditions slot and a forecast slot.
//! Every trigger bumps the flow's sequence number; under [`WritePolicy::Guarded`] a completion
//! carrying an older sequence is dropped, so a slow earlier request cannot overwrite a newer one.

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::{
    error::WeatherError,
    fetcher::WeatherPair,
    model::{CurrentConditions, FetchResult, ForecastSet},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flow {
    CurrentLocation,
    Search,
}

impl Flow {
    pub fn as_str(&self) -> &'static str {
        match self {
            Flow::CurrentLocation => "current-location",
            Flow::Search => "search",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SlotState<T> {
    NotLoaded,
    Loading,
    Loaded(FetchResult<T>),
}

impl<T> Default for SlotState<T> {
    fn default() -> Self {
        SlotState::NotLoaded
    }
}

impl<T> SlotState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, SlotState::Loading)
    }

    pub fn result(&self) -> Option<&FetchResult<T>> {
        match self {
            SlotState::Loaded(result) => Some(result),
            _ => None,
        }
    }

    pub fn success(&self) -> Option<&T> {
        self.result().and_then(FetchResult::success)
    }

    pub fn failure(&self) -> Option<&WeatherError> {
        self.result().and_then(FetchResult::failure)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowPhase {
    Idle,
    Loading,
    Success,
    /// One slot succeeded, the other failed.
    Partial,
    Failure,
}

/// Handle for one trigger of one flow; completions are matched against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trigger {
    pub flow: Flow,
    pub seq: u64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlowView {
    pub seq: u64,
    /// Search term or resolved place name shown as the card title.
    pub label: Option<String>,
    pub conditions: SlotState<CurrentConditions>,
    pub forecast: SlotState<ForecastSet>,
}

impl FlowView {
    pub fn phase(&self) -> FlowPhase {
        match (&self.conditions, &self.forecast) {
            (SlotState::NotLoaded, SlotState::NotLoaded) => FlowPhase::Idle,
            (SlotState::Loading, _) | (_, SlotState::Loading) => FlowPhase::Loading,
            (SlotState::Loaded(c), SlotState::Loaded(f)) => match (c.is_success(), f.is_success()) {
                (true, true) => FlowPhase::Success,
                (false, false) => FlowPhase::Failure,
                _ => FlowPhase::Partial,
            },
            // One slot never loaded while the other did.
            _ => FlowPhase::Partial,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WritePolicy {
    /// Completions from superseded triggers are discarded.
    #[default]
    Guarded,
    /// Whatever completes last is shown.
    LastWriteWins,
}

#[derive(Debug, Default)]
struct Slots {
    current_location: FlowView,
    search: FlowView,
}

impl Slots {
    fn view_mut(&mut self, flow: Flow) -> &mut FlowView {
        match flow {
            Flow::CurrentLocation => &mut self.current_location,
            Flow::Search => &mut self.search,
        }
    }

    fn view(&self, flow: Flow) -> &FlowView {
        match flow {
            Flow::CurrentLocation => &self.current_location,
            Flow::Search => &self.search,
        }
    }
}

#[derive(Debug, Default)]
pub struct ViewStateStore {
    policy: WritePolicy,
    slots: RwLock<Slots>,
}

impl ViewStateStore {
    pub fn new(policy: WritePolicy) -> Self {
        Self { policy, slots: RwLock::new(Slots::default()) }
    }

    pub fn policy(&self) -> WritePolicy {
        self.policy
    }

    /// Starts a new trigger: the flow's slots go to `Loading`; the other flow is untouched.
    pub fn begin(&self, flow: Flow, label: Option<String>) -> Trigger {
        let mut slots = self.slots.write();
        let view = slots.view_mut(flow);

        view.seq += 1;
        view.label = label;
        view.conditions = SlotState::Loading;
        view.forecast = SlotState::Loading;

        debug!("Began {} trigger #{}", flow.as_str(), view.seq);
        Trigger { flow, seq: view.seq }
    }

    /// Stores both fetch results. Returns `false` when the write was discarded as stale.
    pub fn complete(
        &self,
        trigger: Trigger,
        (conditions, forecast): WeatherPair,
        label: Option<String>,
    ) -> bool {
        self.write(trigger, |view| {
            if label.is_some() {
                view.label = label;
            }
            view.conditions = SlotState::Loaded(conditions);
            view.forecast = SlotState::Loaded(forecast);
        })
    }

    /// Fails both slots of the flow with the same error.
    pub fn fail(&self, trigger: Trigger, err: WeatherError) -> bool {
        self.write(trigger, |view| {
            view.conditions = SlotState::Loaded(FetchResult::Failure(err.clone()));
            view.forecast = SlotState::Loaded(FetchResult::Failure(err));
        })
    }

    pub fn snapshot(&self, flow: Flow) -> FlowView {
        self.slots.read().view(flow).clone()
    }

    pub fn current_seq(&self, flow: Flow) -> u64 {
        self.slots.read().view(flow).seq
    }

    fn write(&self, trigger: Trigger, apply: impl FnOnce(&mut FlowView)) -> bool {
        let mut slots = self.slots.write();
        let view = slots.view_mut(trigger.flow);

        if self.policy == WritePolicy::Guarded && trigger.seq != view.seq {
            warn!(
                "Discarding stale {} result #{} (current #{})",
                trigger.flow.as_str(),
                trigger.seq,
                view.seq
            );
            return false;
        }

        apply(view);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conditions(temp: f64) -> CurrentConditions {
        CurrentConditions {
            description: "clear sky".into(),
            icon_id: "01d".into(),
            temperature_c: temp,
            feels_like_c: temp,
            wind_speed: 1.0,
            wind_gust: None,
            precipitation_1h: None,
            sunrise_unix: None,
            sunset_unix: None,
            country_code: "FI".into(),
            place_name: Some("Tampere".into()),
            status_code: 200,
            timezone_offset_secs: 0,
        }
    }

    fn ok_pair(temp: f64) -> WeatherPair {
        let forecast = ForecastSet::new(200, Vec::new()).expect("empty set");
        (FetchResult::Success(conditions(temp)), FetchResult::Success(forecast))
    }

    #[test]
    fn fresh_store_is_idle() {
        let store = ViewStateStore::default();
        assert_eq!(store.policy(), WritePolicy::Guarded);
        assert_eq!(store.snapshot(Flow::CurrentLocation).phase(), FlowPhase::Idle);
        assert_eq!(store.snapshot(Flow::Search).phase(), FlowPhase::Idle);
    }

    #[test]
    fn begin_only_touches_its_own_flow() {
        let store = ViewStateStore::default();
        let t = store.begin(Flow::CurrentLocation, None);
        assert!(store.complete(t, ok_pair(5.0), Some("Tampere, FI".into())));

        store.begin(Flow::Search, Some("Oslo".into()));

        let current = store.snapshot(Flow::CurrentLocation);
        assert_eq!(current.phase(), FlowPhase::Success);
        assert_eq!(current.label.as_deref(), Some("Tampere, FI"));
        assert_eq!(store.snapshot(Flow::Search).phase(), FlowPhase::Loading);
    }

    #[test]
    fn loading_then_success_then_loading_again() {
        let store = ViewStateStore::default();

        let first = store.begin(Flow::Search, Some("Oslo".into()));
        assert_eq!(store.snapshot(Flow::Search).phase(), FlowPhase::Loading);
        store.complete(first, ok_pair(3.0), None);
        assert_eq!(store.snapshot(Flow::Search).phase(), FlowPhase::Success);

        store.begin(Flow::Search, Some("Bergen".into()));
        let view = store.snapshot(Flow::Search);
        assert_eq!(view.phase(), FlowPhase::Loading);
        assert!(view.conditions.success().is_none());
    }

    #[test]
    fn failure_replaces_previous_success() {
        let store = ViewStateStore::default();
        let t = store.begin(Flow::CurrentLocation, None);
        store.complete(t, ok_pair(5.0), None);

        let t = store.begin(Flow::CurrentLocation, None);
        store.complete(
            t,
            (
                FetchResult::Failure(WeatherError::InvalidCredential),
                FetchResult::Failure(WeatherError::InvalidCredential),
            ),
            None,
        );

        let view = store.snapshot(Flow::CurrentLocation);
        assert_eq!(view.phase(), FlowPhase::Failure);
        assert_eq!(view.conditions.failure(), Some(&WeatherError::InvalidCredential));
        assert!(view.conditions.success().is_none());
    }

    #[test]
    fn guarded_policy_discards_stale_completion() {
        let store = ViewStateStore::new(WritePolicy::Guarded);
        let first = store.begin(Flow::Search, Some("Oslo".into()));
        let second = store.begin(Flow::Search, Some("Bergen".into()));

        assert!(store.complete(second, ok_pair(8.0), None));
        assert!(!store.complete(first, ok_pair(3.0), None));

        let view = store.snapshot(Flow::Search);
        assert_eq!(view.seq, second.seq);
        assert_eq!(view.label.as_deref(), Some("Bergen"));
        assert_eq!(view.conditions.success().map(|c| c.temperature_c), Some(8.0));
    }

    #[test]
    fn last_write_wins_shows_last_completed() {
        let store = ViewStateStore::new(WritePolicy::LastWriteWins);
        let first = store.begin(Flow::Search, Some("Oslo".into()));
        let second = store.begin(Flow::Search, Some("Bergen".into()));

        assert!(store.complete(second, ok_pair(8.0), None));
        assert!(store.complete(first, ok_pair(3.0), None));

        let view = store.snapshot(Flow::Search);
        assert_eq!(view.conditions.success().map(|c| c.temperature_c), Some(3.0));
    }

    #[test]
    fn fail_fills_both_slots() {
        let store = ViewStateStore::default();
        let t = store.begin(Flow::CurrentLocation, None);
        assert!(store.fail(t, WeatherError::PermissionDenied));

        let view = store.snapshot(Flow::CurrentLocation);
        assert_eq!(view.conditions.failure(), Some(&WeatherError::PermissionDenied));
        assert_eq!(view.forecast.failure(), Some(&WeatherError::PermissionDenied));
    }

    #[test]
    fn mixed_results_are_partial() {
        let store = ViewStateStore::default();
        let t = store.begin(Flow::Search, None);
        let (conditions, _) = ok_pair(1.0);
        store.complete(t, (conditions, FetchResult::Failure(WeatherError::network("reset"))), None);
        assert_eq!(store.snapshot(Flow::Search).phase(), FlowPhase::Partial);
    }
}
