//! Background reconcilers. Each poll type owns one task slot; starting again aborts the
//! running task first, so at most one interval per type is ever live.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::pages;
use crate::render;
use crate::surface::{Surface, Visibility, slot};
use crate::toast::ToastChannel;

/// What a tick asks of its poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Continue,
    Done,
}

pub struct Poller {
    name: &'static str,
    period: Duration,
    visibility: Visibility,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Poller {
    pub fn new(name: &'static str, period: Duration, visibility: Visibility) -> Self {
        Self {
            name,
            period,
            visibility,
            task: Mutex::new(None),
        }
    }

    /// Spawns the interval. The first tick fires one period from now. Ticks that land
    /// while the client is hidden are skipped without stopping the interval.
    pub fn start<F, Fut>(&self, mut tick: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Tick> + Send + 'static,
    {
        let Ok(mut slot) = self.task.lock() else {
            warn!(poll = self.name, "poller state poisoned; not starting");
            return;
        };
        if let Some(previous) = slot.take() {
            previous.abort();
            debug!(poll = self.name, "restarting poll");
        }

        let name = self.name;
        let period = self.period;
        let visibility = self.visibility.clone();
        *slot = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if !visibility.is_visible() {
                    debug!(poll = name, "hidden; skipping tick");
                    continue;
                }
                if tick().await == Tick::Done {
                    info!(poll = name, "poll finished");
                    break;
                }
            }
        }));
        info!(poll = name, period_ms = period.as_millis() as u64, "poll started");
    }

    pub fn stop(&self) {
        let task = self.task.lock().ok().and_then(|mut slot| slot.take());
        if let Some(task) = task {
            task.abort();
            info!(poll = self.name, "poll stopped");
        }
    }

    pub fn is_active(&self) -> bool {
        self.task
            .lock()
            .map(|slot| slot.as_ref().is_some_and(|t| !t.is_finished()))
            .unwrap_or(false)
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().ok().and_then(Option::take) {
            task.abort();
        }
    }
}

/// Waits for the backend to approve the user's verification, then refreshes the session
/// once and announces it.
pub struct VerificationPoll {
    api: Arc<ApiClient>,
    surface: Arc<dyn Surface>,
    toasts: ToastChannel,
    poller: Poller,
}

impl VerificationPoll {
    pub fn new(
        api: Arc<ApiClient>,
        surface: Arc<dyn Surface>,
        toasts: ToastChannel,
        period: Duration,
        visibility: Visibility,
    ) -> Self {
        Self {
            api,
            surface,
            toasts,
            poller: Poller::new("verification", period, visibility),
        }
    }

    /// Dashboard entry: polls only while the signed-in user is not fully verified.
    pub fn start_if_needed(&self) -> bool {
        match self.api.session().get() {
            Some(user) if !user.is_fully_verified() => {
                self.start();
                true
            }
            _ => false,
        }
    }

    pub fn start(&self) {
        let api = self.api.clone();
        let surface = self.surface.clone();
        let toasts = self.toasts.clone();
        self.poller.start(move || {
            let api = api.clone();
            let surface = surface.clone();
            let toasts = toasts.clone();
            async move { check_verification(&api, surface.as_ref(), &toasts).await }
        });
    }

    pub fn stop(&self) {
        self.poller.stop();
    }

    pub fn is_active(&self) -> bool {
        self.poller.is_active()
    }
}

async fn check_verification(api: &ApiClient, surface: &dyn Surface, toasts: &ToastChannel) -> Tick {
    let status = match api.verification_status().await {
        Ok(status) => status,
        Err(ApiError::AuthRequired) => return Tick::Done,
        Err(e) => {
            warn!(error = %e, "verification status check failed");
            return Tick::Continue;
        }
    };
    surface.replace(slot::VERIFICATION_BANNER, render::profile::verification_banner(&status));
    if !status.is_verified() {
        return Tick::Continue;
    }

    let Some(session) = api.session().get() else {
        return Tick::Done;
    };
    if !session.kyc_verified {
        // A status payload without the video flag must not clear one the session holds.
        api.session()
            .apply_verification(true, session.video_verified || status.video_verified);
        if let Some(user) = api.session().refresh_from_server(api).await {
            surface.replace(slot::PROFILE_BADGES, render::profile::profile_badges(&user));
        }
        toasts.success("Verification approved! Your profile is now verified.");
        info!("verification approved");
    }
    Tick::Done
}

/// Keeps the open conversation's thread fresh.
pub struct ChatPoll {
    api: Arc<ApiClient>,
    surface: Arc<dyn Surface>,
    partner: Mutex<Option<i64>>,
    poller: Poller,
}

impl ChatPoll {
    pub fn new(api: Arc<ApiClient>, surface: Arc<dyn Surface>, period: Duration, visibility: Visibility) -> Self {
        Self {
            api,
            surface,
            partner: Mutex::new(None),
            poller: Poller::new("chat", period, visibility),
        }
    }

    /// Switches the polled conversation. `None` stops polling.
    pub fn select(&self, partner_id: Option<i64>) {
        if let Ok(mut partner) = self.partner.lock() {
            *partner = partner_id;
        }
        let Some(partner_id) = partner_id else {
            self.poller.stop();
            return;
        };
        let api = self.api.clone();
        let surface = self.surface.clone();
        self.poller.start(move || {
            let api = api.clone();
            let surface = surface.clone();
            async move { refresh_chat(&api, surface.as_ref(), partner_id).await }
        });
    }

    pub fn active_partner(&self) -> Option<i64> {
        self.partner.lock().ok().and_then(|p| *p)
    }

    /// Leaving the messages view.
    pub fn stop(&self) {
        self.select(None);
    }

    pub fn is_active(&self) -> bool {
        self.poller.is_active()
    }
}

async fn refresh_chat(api: &ApiClient, surface: &dyn Surface, partner_id: i64) -> Tick {
    match pages::load_chat(api, surface, partner_id).await {
        Err(ApiError::AuthRequired) => Tick::Done,
        _ => Tick::Continue,
    }
}
