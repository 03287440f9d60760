use std::sync::Arc;

use anyhow::anyhow;
use chrono::Utc;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::MissedTickBehavior,
};

use crate::{
    config::RefreshSettings,
    controller::{DashboardView, FetchTicket, RefreshController},
    error::FetchError,
    model::ForecastSnapshot,
    provider::ForecastSource,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SelectCity(String),
    Refresh,
    Shutdown,
}

#[derive(Debug)]
struct Finished {
    ticket: FetchTicket,
    result: Result<ForecastSnapshot, FetchError>,
}

/// Handle to a running scheduler task.
#[derive(Debug)]
pub struct SchedulerHandle {
    commands: mpsc::Sender<Command>,
    view: watch::Receiver<DashboardView>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    pub async fn select_city(&self, city: impl Into<String>) -> anyhow::Result<()> {
        self.send(Command::SelectCity(city.into())).await
    }

    pub async fn refresh(&self) -> anyhow::Result<()> {
        self.send(Command::Refresh).await
    }

    /// Latest published state.
    pub fn view(&self) -> DashboardView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardView> {
        self.view.clone()
    }

    /// Stop the event loop and wait for it to exit. Fetches still in flight
    /// finish on their own; their results are discarded.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        // The loop may already be gone; joining below covers both cases.
        let _ = self.commands.send(Command::Shutdown).await;
        self.task
            .await
            .map_err(|e| anyhow!("Refresh scheduler task failed: {e}"))
    }

    async fn send(&self, command: Command) -> anyhow::Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| anyhow!("Refresh scheduler has stopped"))
    }
}

/// Event loop that keeps the displayed forecast fresh.
///
/// All state lives in one [`RefreshController`] owned by the loop. Fetches run
/// as separate tasks and report back over a channel, so the loop never blocks
/// on the network.
pub struct RefreshScheduler {
    controller: RefreshController,
    source: Arc<dyn ForecastSource>,
    settings: RefreshSettings,
    commands: mpsc::Receiver<Command>,
    view: watch::Sender<DashboardView>,
}

impl RefreshScheduler {
    /// Spawn the loop on the current runtime and start loading `city`.
    pub fn spawn(
        source: Arc<dyn ForecastSource>,
        settings: RefreshSettings,
        city: impl Into<String>,
    ) -> SchedulerHandle {
        let now = Utc::now();
        let controller = RefreshController::new(city, settings.interval(), now);
        let (view_tx, view_rx) = watch::channel(controller.view(now));
        let (cmd_tx, cmd_rx) = mpsc::channel(16);

        let scheduler = Self {
            controller,
            source,
            settings,
            commands: cmd_rx,
            view: view_tx,
        };
        let task = tokio::spawn(scheduler.run());

        SchedulerHandle {
            commands: cmd_tx,
            view: view_rx,
            task,
        }
    }

    async fn run(mut self) {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Finished>();

        let first = self.controller.start();
        self.dispatch(first, &done_tx);
        self.publish();

        let mut ticker = tokio::time::interval(self.settings.tick());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::SelectCity(city)) => {
                        tracing::info!(%city, "city selected");
                        let ticket = self.controller.select_city(city);
                        self.dispatch(ticket, &done_tx);
                    }
                    Some(Command::Refresh) => {
                        if let Some(ticket) = self.controller.request_refresh() {
                            self.dispatch(ticket, &done_tx);
                        }
                    }
                    Some(Command::Shutdown) | None => break,
                },
                Some(finished) = done_rx.recv() => {
                    self.controller.complete(&finished.ticket, finished.result, Utc::now());
                }
                _ = ticker.tick() => {
                    if let Some(ticket) = self.controller.tick(Utc::now()) {
                        self.dispatch(ticket, &done_tx);
                    }
                }
            }

            self.publish();
        }

        tracing::debug!("refresh scheduler stopped");
    }

    fn dispatch(&self, ticket: FetchTicket, done: &mpsc::UnboundedSender<Finished>) {
        let source = Arc::clone(&self.source);
        let deadline = self.settings.fetch_deadline();
        let done = done.clone();

        tracing::debug!(city = %ticket.city, generation = ticket.generation, kind = ?ticket.kind, "dispatching fetch");
        tokio::spawn(async move {
            let result = match tokio::time::timeout(deadline, source.fetch(&ticket.city)).await {
                Ok(result) => result,
                Err(_) => Err(FetchError::Timeout(deadline)),
            };
            if done.send(Finished { ticket, result }).is_err() {
                tracing::debug!("scheduler gone, fetch result discarded");
            }
        });
    }

    fn publish(&self) {
        self.view.send_replace(self.controller.view(Utc::now()));
    }
}
