use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::watch;

/// Named regions of the page that loaders fill with markup.
pub mod slot {
    pub const DASHBOARD_STATS: &str = "dashboard-stats";
    pub const JOB_LISTINGS: &str = "job-listings";
    pub const MY_JOBS: &str = "my-jobs";
    pub const TALENT_GRID: &str = "talent-grid";
    pub const ORGANIZER_TALENT_GRID: &str = "talent-grid-organizer";
    pub const PENDING_APPLICATIONS: &str = "pending-applications";
    pub const ACCEPTED_APPLICATIONS: &str = "accepted-applications";
    pub const REJECTED_APPLICATIONS: &str = "rejected-applications";
    pub const APPLICATION_COUNTS: &str = "application-counts";
    pub const RECENT_APPLICATIONS: &str = "recent-applications-list";
    pub const UPCOMING_BOOKINGS: &str = "upcoming-bookings";
    pub const COMPLETED_BOOKINGS: &str = "completed-bookings";
    pub const BOOKING_COUNTS: &str = "booking-counts";
    pub const UPCOMING_EVENTS: &str = "upcoming-events-list";
    pub const STAFF_UPCOMING_EVENTS: &str = "staff-upcoming-events";
    pub const WALLET_BALANCE: &str = "wallet-balance";
    pub const EARNINGS_CHART: &str = "earnings-chart";
    pub const TRANSACTIONS: &str = "transactions-list";
    pub const BANK_DETAILS: &str = "bank-details";
    pub const CONVERSATIONS: &str = "conversation-list";
    pub const CHAT_MESSAGES: &str = "chat-messages";
    pub const PROFILE_MODAL: &str = "profile-modal";
    pub const PROFILE_BADGES: &str = "profile-badges";
    pub const NAV_USER: &str = "nav-user";
    pub const VERIFICATION_BANNER: &str = "verification-banner";
    pub const TOASTS: &str = "toast-container";
}

/// Where rendered markup goes. Implementations decide what a slot is.
pub trait Surface: Send + Sync {
    fn replace(&self, slot: &str, markup: String);
    fn clear(&self, slot: &str);
}

/// Slot contents kept in memory. Used by the terminal front-end and by tests.
#[derive(Default)]
pub struct MemorySurface {
    slots: RwLock<HashMap<String, String>>,
    writes: Mutex<Vec<String>>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content(&self, slot: &str) -> Option<String> {
        self.slots
            .read()
            .ok()
            .and_then(|slots| slots.get(slot).cloned())
    }

    /// Slot names in the order they were written.
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().map(|w| w.clone()).unwrap_or_default()
    }
}

impl Surface for MemorySurface {
    fn replace(&self, slot: &str, markup: String) {
        if let Ok(mut slots) = self.slots.write() {
            slots.insert(slot.to_string(), markup);
        }
        if let Ok(mut writes) = self.writes.lock() {
            writes.push(slot.to_string());
        }
    }

    fn clear(&self, slot: &str) {
        if let Ok(mut slots) = self.slots.write() {
            slots.remove(slot);
        }
    }
}

pub trait Navigator: Send + Sync {
    fn redirect(&self, path: &str);
}

/// Remembers every redirect instead of performing it.
#[derive(Default)]
pub struct RecordingNavigator {
    history: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<String> {
        self.history.lock().map(|h| h.clone()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<String> {
        self.history.lock().ok().and_then(|h| h.last().cloned())
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, path: &str) {
        tracing::info!(path, "redirect");
        if let Ok(mut history) = self.history.lock() {
            history.push(path.to_string());
        }
    }
}

/// Whether the user can currently see the client. Pollers skip ticks while hidden.
#[derive(Clone)]
pub struct Visibility {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for Visibility {
    fn default() -> Self {
        Self::new()
    }
}

impl Visibility {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(true);
        Self { tx: Arc::new(tx) }
    }

    pub fn set_visible(&self, visible: bool) {
        self.tx.send_replace(visible);
    }

    pub fn is_visible(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}
