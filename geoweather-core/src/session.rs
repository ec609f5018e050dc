//! Interactive state: position acquisition, nearest-place label and the
//! forecast currently on display.
//!
//! A [`Session`] is owned by a single task. Network work happens outside of
//! it; results are fed back through [`Session::complete_acquire`] and
//! [`Session::apply_forecast`].

use crate::{
    Coordinate, DailyForecast, ForecastError, LocationSet, PositionError, SessionError,
    WeatherCodeTable,
};

/// Label shown while no position has been acquired.
pub const UNKNOWN_LOCATION_LABEL: &str = "Unknown, use GPS first";

/// Read-only datasets shared by every consumer for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct AppData {
    locations: LocationSet,
    codes: WeatherCodeTable,
}

impl AppData {
    pub fn new(locations: LocationSet, codes: WeatherCodeTable) -> Self {
        Self { locations, codes }
    }

    pub fn locations(&self) -> &LocationSet {
        &self.locations
    }

    pub fn codes(&self) -> &WeatherCodeTable {
        &self.codes
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GpsState {
    /// No position requested yet.
    Idle,
    /// A request is in flight; the trigger control is disabled.
    Acquiring,
    /// The last request succeeded.
    Known,
    /// The last request failed. The coordinate is unchanged.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForecastState {
    Empty,
    Loading { previous: Option<DailyForecast> },
    Ready(DailyForecast),
    Failed { message: String, previous: Option<DailyForecast> },
}

impl ForecastState {
    /// The forecast rows to display, if any.
    pub fn forecast(&self) -> Option<&DailyForecast> {
        match self {
            ForecastState::Empty => None,
            ForecastState::Ready(f) => Some(f),
            ForecastState::Loading { previous } | ForecastState::Failed { previous, .. } => {
                previous.as_ref()
            }
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ForecastState::Failed { message, .. } => Some(message),
            _ => None,
        }
    }

    fn take_forecast(&mut self) -> Option<DailyForecast> {
        match std::mem::replace(self, ForecastState::Empty) {
            ForecastState::Empty => None,
            ForecastState::Ready(f) => Some(f),
            ForecastState::Loading { previous } | ForecastState::Failed { previous, .. } => previous,
        }
    }
}

/// Permission to run one forecast fetch for `coordinate`.
///
/// Only the ticket with the latest sequence number may update the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastTicket {
    pub seq: u64,
    pub coordinate: Coordinate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Updated,
    Stale,
}

#[derive(Debug)]
pub struct Session<'a> {
    data: &'a AppData,
    gps: GpsState,
    coordinate: Coordinate,
    location_label: String,
    forecast: ForecastState,
    issued_seq: u64,
}

impl<'a> Session<'a> {
    pub fn new(data: &'a AppData) -> Self {
        Self {
            data,
            gps: GpsState::Idle,
            coordinate: Coordinate::UNKNOWN,
            location_label: UNKNOWN_LOCATION_LABEL.to_string(),
            forecast: ForecastState::Empty,
            issued_seq: 0,
        }
    }

    pub fn data(&self) -> &'a AppData {
        self.data
    }

    pub fn gps_state(&self) -> &GpsState {
        &self.gps
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    pub fn location_label(&self) -> &str {
        &self.location_label
    }

    pub fn forecast_state(&self) -> &ForecastState {
        &self.forecast
    }

    pub fn forecast(&self) -> Option<&DailyForecast> {
        self.forecast.forecast()
    }

    /// Whether the "use GPS" trigger may be pressed.
    pub fn control_enabled(&self) -> bool {
        self.gps != GpsState::Acquiring
    }

    /// Start a position request. Rejected while one is already in flight.
    pub fn begin_acquire(&mut self) -> Result<(), SessionError> {
        if self.gps == GpsState::Acquiring {
            return Err(SessionError::AcquireInProgress);
        }
        tracing::info!("acquiring position");
        self.gps = GpsState::Acquiring;
        Ok(())
    }

    /// Finish the in-flight position request.
    ///
    /// On success the coordinate and nearest-place label are updated and a
    /// ticket for the matching forecast fetch is returned.
    pub fn complete_acquire(
        &mut self,
        result: Result<Coordinate, PositionError>,
    ) -> Result<Option<ForecastTicket>, SessionError> {
        if self.gps != GpsState::Acquiring {
            return Err(SessionError::NotAcquiring);
        }

        match result {
            Ok(coordinate) => {
                tracing::info!(lat = coordinate.latitude, lng = coordinate.longitude, "position acquired");
                self.gps = GpsState::Known;
                self.set_coordinate(coordinate);
                if coordinate.is_unknown() {
                    // Reads as "no position": retire outstanding tickets and
                    // clear the rows instead of fetching.
                    self.issued_seq += 1;
                    self.forecast = ForecastState::Empty;
                    return Ok(None);
                }
                Ok(Some(self.issue_ticket()))
            }
            Err(e) => {
                tracing::warn!(error = %e, "position request failed");
                self.gps = GpsState::Failed(e.to_string());
                Ok(None)
            }
        }
    }

    fn set_coordinate(&mut self, coordinate: Coordinate) {
        self.coordinate = coordinate;
        self.location_label = if coordinate.is_unknown() {
            UNKNOWN_LOCATION_LABEL.to_string()
        } else {
            self.data
                .locations()
                .nearest(&coordinate)
                .map(|loc| loc.label())
                .unwrap_or_default()
        };
    }

    fn issue_ticket(&mut self) -> ForecastTicket {
        self.issued_seq += 1;
        let previous = self.forecast.take_forecast();
        self.forecast = ForecastState::Loading { previous };
        ForecastTicket { seq: self.issued_seq, coordinate: self.coordinate }
    }

    /// Apply the outcome of a forecast fetch. Results for superseded tickets
    /// are dropped, whatever order they arrive in.
    pub fn apply_forecast(
        &mut self,
        ticket: ForecastTicket,
        result: Result<DailyForecast, ForecastError>,
    ) -> Applied {
        if ticket.seq != self.issued_seq {
            tracing::debug!(seq = ticket.seq, latest = self.issued_seq, "dropping stale forecast");
            return Applied::Stale;
        }

        self.forecast = match result {
            Ok(forecast) => ForecastState::Ready(forecast),
            Err(e) => {
                tracing::warn!(error = %e, "forecast update failed");
                ForecastState::Failed {
                    message: e.to_string(),
                    previous: self.forecast.take_forecast(),
                }
            }
        };

        Applied::Updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NamedLocation, model::tests::five_day};
    use std::collections::HashMap;

    fn data() -> AppData {
        AppData::new(
            LocationSet::new(vec![
                NamedLocation::new("George Town", 5.4141, 100.3288),
                NamedLocation::new("Kuala Lumpur", 3.139, 101.6869),
            ]),
            WeatherCodeTable::new(HashMap::from([("03".to_string(), "Overcast".to_string())])),
        )
    }

    const KL: Coordinate = Coordinate::new(3.139, 101.6869);

    #[test]
    fn starts_idle_with_unknown_position() {
        let data = data();
        let session = Session::new(&data);

        assert_eq!(session.gps_state(), &GpsState::Idle);
        assert!(session.coordinate().is_unknown());
        assert_eq!(session.location_label(), UNKNOWN_LOCATION_LABEL);
        assert!(session.forecast().is_none());
        assert!(session.control_enabled());
    }

    #[test]
    fn acquire_disables_control_until_complete() {
        let data = data();
        let mut session = Session::new(&data);

        session.begin_acquire().expect("idle -> acquiring");
        assert!(!session.control_enabled());
        assert_eq!(session.begin_acquire(), Err(SessionError::AcquireInProgress));

        let ticket = session.complete_acquire(Ok(KL)).expect("acquiring").expect("ticket");
        assert!(session.control_enabled());
        assert_eq!(session.gps_state(), &GpsState::Known);
        assert_eq!(ticket.coordinate, KL);
        assert_eq!(session.location_label(), "Kuala Lumpur (3.139 , 101.6869)");
    }

    #[test]
    fn failed_acquire_keeps_coordinate() {
        let data = data();
        let mut session = Session::new(&data);

        session.begin_acquire().expect("idle -> acquiring");
        session.complete_acquire(Ok(KL)).expect("acquiring");

        session.begin_acquire().expect("known -> acquiring");
        let ticket = session
            .complete_acquire(Err(PositionError::Unavailable("denied".into())))
            .expect("acquiring");

        assert!(ticket.is_none());
        assert!(session.control_enabled());
        assert_eq!(session.coordinate(), KL);
        assert!(matches!(session.gps_state(), GpsState::Failed(m) if m.contains("denied")));

        // Failure is recoverable.
        session.begin_acquire().expect("failed -> acquiring");
    }

    #[test]
    fn sentinel_position_issues_no_forecast() {
        let data = data();
        let mut session = Session::new(&data);

        session.begin_acquire().expect("idle -> acquiring");
        let ticket = session
            .complete_acquire(Ok(Coordinate::UNKNOWN))
            .expect("acquiring");

        assert!(ticket.is_none());
        assert!(session.control_enabled());
        assert_eq!(session.location_label(), UNKNOWN_LOCATION_LABEL);
        assert_eq!(session.forecast_state(), &ForecastState::Empty);
    }

    #[test]
    fn sentinel_position_discards_in_flight_forecast() {
        let data = data();
        let mut session = Session::new(&data);

        session.begin_acquire().expect("idle -> acquiring");
        let earlier = session.complete_acquire(Ok(KL)).expect("acquiring").expect("ticket");

        session.begin_acquire().expect("known -> acquiring");
        session.complete_acquire(Ok(Coordinate::UNKNOWN)).expect("acquiring");

        assert_eq!(session.apply_forecast(earlier, Ok(five_day())), Applied::Stale);
        assert!(session.forecast().is_none());
    }

    #[test]
    fn complete_without_begin_is_rejected() {
        let data = data();
        let mut session = Session::new(&data);
        assert_eq!(session.complete_acquire(Ok(KL)), Err(SessionError::NotAcquiring));
    }

    #[test]
    fn empty_location_set_gives_empty_label() {
        let data = AppData::new(LocationSet::default(), WeatherCodeTable::default());
        let mut session = Session::new(&data);

        session.begin_acquire().expect("idle -> acquiring");
        session.complete_acquire(Ok(KL)).expect("acquiring");
        assert_eq!(session.location_label(), "");
    }

    #[test]
    fn forecast_is_applied_for_latest_ticket() {
        let data = data();
        let mut session = Session::new(&data);

        session.begin_acquire().expect("idle -> acquiring");
        let ticket = session.complete_acquire(Ok(KL)).expect("acquiring").expect("ticket");
        assert!(matches!(session.forecast_state(), ForecastState::Loading { previous: None }));

        assert_eq!(session.apply_forecast(ticket, Ok(five_day())), Applied::Updated);
        assert_eq!(session.forecast().map(DailyForecast::len), Some(5));
    }

    #[test]
    fn out_of_order_responses_keep_latest_issued() {
        let data = data();
        let mut session = Session::new(&data);

        session.begin_acquire().expect("idle -> acquiring");
        let first = session.complete_acquire(Ok(KL)).expect("acquiring").expect("ticket");
        session.begin_acquire().expect("known -> acquiring");
        let second = session
            .complete_acquire(Ok(Coordinate::new(5.4141, 100.3288)))
            .expect("acquiring")
            .expect("ticket");
        assert!(second.seq > first.seq);

        let mut newer = five_day();
        newer.latitude = 5.4;
        assert_eq!(session.apply_forecast(second, Ok(newer)), Applied::Updated);

        // The older request resolves last and must not overwrite.
        assert_eq!(session.apply_forecast(first, Ok(five_day())), Applied::Stale);
        assert_eq!(session.forecast().map(|f| f.latitude), Some(5.4));
    }

    #[test]
    fn fetch_failure_is_explicit_and_keeps_previous_rows() {
        let data = data();
        let mut session = Session::new(&data);

        session.begin_acquire().expect("idle -> acquiring");
        let ticket = session.complete_acquire(Ok(KL)).expect("acquiring").expect("ticket");
        session.apply_forecast(ticket, Ok(five_day()));

        session.begin_acquire().expect("known -> acquiring");
        let ticket = session.complete_acquire(Ok(KL)).expect("acquiring").expect("ticket");
        let applied = session.apply_forecast(
            ticket,
            Err(ForecastError::Status { status: 503, body: "busy".into() }),
        );

        assert_eq!(applied, Applied::Updated);
        assert!(session.forecast_state().error().is_some_and(|m| m.contains("503")));
        assert_eq!(session.forecast().map(DailyForecast::len), Some(5));
    }
}
