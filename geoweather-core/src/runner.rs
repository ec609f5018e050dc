//! Drives a [`Session`] from position and forecast sources.
//!
//! The session stays on the caller's task. Forecast fetches run as spawned
//! tasks and report back over a channel; nothing is cancelled, so the
//! session's ticket check decides which result is kept.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::{
    AppData, Applied, DailyForecast, ForecastError, ForecastProvider, ForecastTicket,
    PositionSource, Session, SessionError,
};

type FetchOutcome = (ForecastTicket, Result<DailyForecast, ForecastError>);

pub struct Runner<'a> {
    session: Session<'a>,
    position: Box<dyn PositionSource>,
    provider: Arc<dyn ForecastProvider>,
    tx: mpsc::UnboundedSender<FetchOutcome>,
    rx: mpsc::UnboundedReceiver<FetchOutcome>,
    in_flight: usize,
}

impl<'a> Runner<'a> {
    pub fn new(
        data: &'a AppData,
        position: Box<dyn PositionSource>,
        provider: Arc<dyn ForecastProvider>,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            session: Session::new(data),
            position,
            provider,
            tx,
            rx,
            in_flight: 0,
        }
    }

    pub fn session(&self) -> &Session<'a> {
        &self.session
    }

    /// Number of spawned fetches whose results have not been received yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Request the current position and, on success, start the forecast fetch
    /// for it in the background.
    pub async fn acquire(&mut self) -> Result<Option<ForecastTicket>, SessionError> {
        self.session.begin_acquire()?;
        let result = self.position.current_position().await;
        let ticket = self.session.complete_acquire(result)?;

        if let Some(ticket) = ticket {
            self.spawn_fetch(ticket);
        }

        Ok(ticket)
    }

    fn spawn_fetch(&mut self, ticket: ForecastTicket) {
        let provider = Arc::clone(&self.provider);
        let tx = self.tx.clone();
        self.in_flight += 1;

        tokio::spawn(async move {
            let result = provider.fetch_daily(&ticket.coordinate).await;
            // The receiver lives as long as the runner; a send error only
            // means the runner is gone.
            let _ = tx.send((ticket, result));
        });
    }

    /// Wait for the next fetch to resolve and apply it.
    ///
    /// Returns `None` when nothing is in flight.
    pub async fn next_forecast(&mut self) -> Option<Applied> {
        if self.in_flight == 0 {
            return None;
        }

        let (ticket, result) = self.rx.recv().await?;
        self.in_flight -= 1;
        Some(self.session.apply_forecast(ticket, result))
    }

    /// Apply every outstanding fetch, in whatever order they finish.
    pub async fn settle(&mut self) {
        while self.next_forecast().await.is_some() {}
    }
}
