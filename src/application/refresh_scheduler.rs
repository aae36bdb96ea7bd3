// Refresh scheduler - One recurring task per page, publishing the latest snapshot
use crate::application::dashboard_service::DashboardService;
use crate::domain::dashboard::{Page, PageSnapshot, PageView};
use crate::infrastructure::config::PageSettings;
use chrono::Utc;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageIntervals {
    pub current_weather: Duration,
    pub forecast: Duration,
    pub bus_times: Duration,
}

impl PageIntervals {
    pub fn from_settings(settings: &PageSettings) -> Self {
        Self {
            current_weather: Duration::from_secs(settings.current_weather_secs),
            forecast: Duration::from_secs(settings.forecast_secs),
            bus_times: Duration::from_secs(settings.bus_times_secs),
        }
    }

    pub fn interval(&self, page: Page) -> Duration {
        match page {
            Page::CurrentWeather => self.current_weather,
            Page::Forecast => self.forecast,
            Page::BusTimes => self.bus_times,
        }
    }
}

/// Read side of the scheduler: the latest snapshot of every page.
#[derive(Clone)]
pub struct PageFeeds {
    receivers: [watch::Receiver<PageSnapshot>; 3],
}

impl PageFeeds {
    pub fn subscribe(&self, page: Page) -> watch::Receiver<PageSnapshot> {
        self.receivers[slot(page)].clone()
    }

    pub fn latest(&self, page: Page) -> PageSnapshot {
        self.receivers[slot(page)].borrow().clone()
    }
}

#[cfg(test)]
impl PageFeeds {
    /// Feeds frozen at the given snapshots, with no scheduler behind them.
    pub(crate) fn fixed(snapshots: [PageSnapshot; 3]) -> Self {
        Self {
            receivers: snapshots.map(|snapshot| watch::channel(snapshot).1),
        }
    }
}

fn slot(page: Page) -> usize {
    match page {
        Page::CurrentWeather => 0,
        Page::Forecast => 1,
        Page::BusTimes => 2,
    }
}

#[derive(Clone)]
pub struct RefreshScheduler {
    service: DashboardService,
    intervals: PageIntervals,
}

impl RefreshScheduler {
    pub fn new(service: DashboardService, intervals: PageIntervals) -> Self {
        Self { service, intervals }
    }

    /// Start one task per page. The first tick of each fires immediately; a slow
    /// tick delays the next one rather than overlapping it.
    pub fn spawn(&self) -> (PageFeeds, Vec<JoinHandle<()>>) {
        let mut handles = Vec::with_capacity(Page::ALL.len());

        let receivers = Page::ALL.map(|page| {
            let (tx, rx) = watch::channel(PageSnapshot::pending(page));
            let scheduler = self.clone();
            let period = self.intervals.interval(page);

            handles.push(tokio::spawn(async move {
                let mut ticker = tokio::time::interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

                let mut tick: u64 = 0;
                loop {
                    ticker.tick().await;
                    let snapshot = scheduler.refresh_guarded(page, tick).await;
                    if tx.send(snapshot).is_err() {
                        tracing::debug!("No subscribers left for {}, stopping", page.slug());
                        break;
                    }
                    tick += 1;
                }
            }));

            tracing::info!("Scheduled {} every {:?}", page.slug(), period);
            rx
        });

        (PageFeeds { receivers }, handles)
    }

    pub async fn refresh_once(&self, page: Page, tick: u64) -> PageSnapshot {
        let started = Instant::now();
        let view = self.service.build_page(page, tick).await;

        tracing::info!(
            "Refreshed {} (tick {}) in {:?}",
            page.slug(),
            tick,
            started.elapsed()
        );

        PageSnapshot::new(page, tick, Utc::now(), view)
    }

    /// `refresh_once`, with a panic in the pipeline published as an unavailable
    /// view so the page task survives to the next tick.
    async fn refresh_guarded(&self, page: Page, tick: u64) -> PageSnapshot {
        match AssertUnwindSafe(self.refresh_once(page, tick))
            .catch_unwind()
            .await
        {
            Ok(snapshot) => snapshot,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(
                    "Refresh of {} (tick {}) panicked: {}",
                    page.slug(),
                    tick,
                    message
                );
                PageSnapshot::new(
                    page,
                    tick,
                    Utc::now(),
                    PageView::Unavailable {
                        reason: format!("refresh panicked: {}", message),
                    },
                )
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
