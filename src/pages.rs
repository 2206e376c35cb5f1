//! Page loaders: fetch from the backend, render, replace the slot. A failed load leaves
//! the slot as it was; the error is logged and handed back to the caller.

use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::models::{
    Application, BankDetails, Conversation, Job, Message, Profile, Transaction, UserSession, UserType,
    VerificationStatus, WalletStats,
};
use crate::render::{applications, dashboard, jobs, messages, profile, talent, wallet};
use crate::session::SessionObserver;
use crate::surface::{Surface, slot};

fn logged<T>(what: &str, result: Result<T, ApiError>) -> Result<T, ApiError> {
    match &result {
        Err(ApiError::AuthRequired) => debug!(what, "load stopped: signed out"),
        Err(e) => warn!(what, error = %e, "load failed"),
        Ok(_) => debug!(what, "loaded"),
    }
    result
}

fn signed_out<T>(result: &Result<T, ApiError>) -> bool {
    matches!(result, Err(ApiError::AuthRequired))
}

pub struct Pages {
    api: Arc<ApiClient>,
    surface: Arc<dyn Surface>,
}

impl Pages {
    pub fn new(api: Arc<ApiClient>, surface: Arc<dyn Surface>) -> Self {
        Self { api, surface }
    }

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    pub fn surface(&self) -> &Arc<dyn Surface> {
        &self.surface
    }

    fn me(&self) -> Option<UserSession> {
        self.api.session().get()
    }

    /// Job ids the signed-in staff member already applied to. Best effort: listings still
    /// render without the "Applied" marks if this fails.
    async fn applied_job_ids(&self) -> HashSet<i64> {
        match self.me() {
            Some(user) if user.user_type == UserType::Staff => match self.api.applications_best_effort().await {
                Ok(apps) => apps.iter().map(|a| a.job.id).collect(),
                Err(e) => {
                    warn!(error = %e, "could not load applied jobs");
                    HashSet::new()
                }
            },
            _ => HashSet::new(),
        }
    }

    pub async fn job_listings(&self, style: jobs::ListingStyle) -> Result<Vec<Job>, ApiError> {
        let list = logged("jobs", self.api.list_jobs().await)?;
        let applied = self.applied_job_ids().await;
        self.surface
            .replace(slot::JOB_LISTINGS, jobs::job_listings(&list, &applied, style));
        Ok(list)
    }

    pub async fn my_jobs(&self, status: Option<&str>) -> Result<Vec<Job>, ApiError> {
        let list = logged("my jobs", self.api.my_jobs(status).await)?;
        self.surface.replace(slot::MY_JOBS, jobs::my_jobs(&list));
        Ok(list)
    }

    pub async fn talent_grid(&self) -> Result<Vec<Profile>, ApiError> {
        let list = logged("talent", self.api.talent().await)?;
        self.surface.replace(slot::TALENT_GRID, talent::talent_grid(&list));
        Ok(list)
    }

    pub async fn organizer_talent_grid(&self) -> Result<Vec<Profile>, ApiError> {
        let list = logged("talent", self.api.talent().await)?;
        self.surface
            .replace(slot::ORGANIZER_TALENT_GRID, talent::organizer_talent_grid(&list));
        Ok(list)
    }

    pub async fn staff_applications(&self) -> Result<Vec<Application>, ApiError> {
        let list = logged("applications", self.api.applications().await)?;
        let board = applications::staff_applications(&list, Utc::now());
        self.surface.replace(slot::PENDING_APPLICATIONS, board.pending);
        self.surface.replace(slot::ACCEPTED_APPLICATIONS, board.accepted);
        self.surface.replace(slot::REJECTED_APPLICATIONS, board.rejected);
        self.surface.replace(slot::APPLICATION_COUNTS, board.counts);
        Ok(list)
    }

    pub async fn bookings(&self) -> Result<Vec<Application>, ApiError> {
        let list = logged("bookings", self.api.applications().await)?;
        let board = applications::bookings(&list, Utc::now().date_naive());
        self.surface.replace(slot::UPCOMING_BOOKINGS, board.upcoming);
        self.surface.replace(slot::COMPLETED_BOOKINGS, board.completed);
        self.surface.replace(slot::BOOKING_COUNTS, board.counts);
        Ok(list)
    }

    pub async fn staff_dashboard(&self) -> Result<Vec<Application>, ApiError> {
        let list = logged("staff dashboard", self.api.applications().await)?;
        let today = Utc::now().date_naive();
        let me = self.me();
        let stats = dashboard::StaffStats::from_applications(&list, me.as_ref(), today);
        self.surface
            .replace(slot::DASHBOARD_STATS, dashboard::staff_stats(&stats));
        self.surface.replace(
            slot::STAFF_UPCOMING_EVENTS,
            applications::staff_upcoming_events(&list, today),
        );
        Ok(list)
    }

    pub async fn organizer_dashboard(&self) -> Result<(Vec<Job>, Vec<Application>), ApiError> {
        let posted = logged("organizer jobs", self.api.my_jobs(None).await)?;
        let received = logged("organizer applications", self.api.applications().await)?;
        let today = Utc::now().date_naive();
        let stats = dashboard::OrganizerStats::from_jobs(&posted, &received, today);
        self.surface
            .replace(slot::DASHBOARD_STATS, dashboard::organizer_stats(&stats));
        self.surface
            .replace(slot::UPCOMING_EVENTS, jobs::upcoming_events(&posted, today));
        self.surface.replace(
            slot::RECENT_APPLICATIONS,
            applications::recent_applications(&received),
        );
        self.surface.replace(slot::MY_JOBS, jobs::my_jobs(&posted));
        Ok((posted, received))
    }

    pub async fn wallet_stats(&self) -> Result<WalletStats, ApiError> {
        let stats = logged("wallet stats", self.api.wallet_stats().await)?;
        self.surface
            .replace(slot::WALLET_BALANCE, wallet::balance_cards(&stats));
        self.surface.replace(
            slot::EARNINGS_CHART,
            wallet::earnings_chart(&stats.monthly_earnings),
        );
        Ok(stats)
    }

    pub async fn transactions(&self) -> Result<Vec<Transaction>, ApiError> {
        let list = logged("transactions", self.api.transactions().await)?;
        self.surface
            .replace(slot::TRANSACTIONS, wallet::transactions_table(&list));
        Ok(list)
    }

    pub async fn bank_details(&self) -> Result<BankDetails, ApiError> {
        let details = logged("bank details", self.api.bank_details().await)?;
        self.surface
            .replace(slot::BANK_DETAILS, wallet::bank_details(&details));
        Ok(details)
    }

    /// Everything on the wallet page. Stops at the first sign-out; other failures only
    /// affect their own panel.
    pub async fn wallet(&self) -> Result<(), ApiError> {
        if signed_out(&self.wallet_stats().await)
            || signed_out(&self.transactions().await)
            || signed_out(&self.bank_details().await)
        {
            return Err(ApiError::AuthRequired);
        }
        Ok(())
    }

    pub async fn conversations(&self, active_partner: Option<i64>) -> Result<Vec<Conversation>, ApiError> {
        let list = logged("conversations", self.api.conversations().await)?;
        self.surface.replace(
            slot::CONVERSATIONS,
            messages::conversation_list(&list, active_partner, Utc::now()),
        );
        Ok(list)
    }

    pub async fn chat(&self, partner_id: i64) -> Result<Vec<Message>, ApiError> {
        load_chat(&self.api, self.surface.as_ref(), partner_id).await
    }

    pub async fn profile_modal(&self, profile_id: i64) -> Result<Profile, ApiError> {
        let found = logged("profile", self.api.profile(profile_id).await)?;
        self.surface
            .replace(slot::PROFILE_MODAL, profile::profile_modal(&found));
        Ok(found)
    }

    pub async fn verification_banner(&self) -> Result<VerificationStatus, ApiError> {
        let status = logged("verification", self.api.verification_status().await)?;
        self.surface
            .replace(slot::VERIFICATION_BANNER, profile::verification_banner(&status));
        Ok(status)
    }

    /// Header and badge strip from the cached session; no request.
    pub fn session_chrome(&self) {
        render_session_chrome(self.surface.as_ref(), self.me().as_ref());
    }
}

/// Fetches one conversation into the chat slot.
pub async fn load_chat(api: &ApiClient, surface: &dyn Surface, partner_id: i64) -> Result<Vec<Message>, ApiError> {
    let thread = logged("chat", api.messages(partner_id).await)?;
    let me = api.session().get();
    surface.replace(
        slot::CHAT_MESSAGES,
        messages::chat_messages(&thread, me.as_ref()),
    );
    Ok(thread)
}

fn render_session_chrome(surface: &dyn Surface, user: Option<&UserSession>) {
    surface.replace(slot::NAV_USER, profile::nav_user(user));
    match user {
        Some(user) => surface.replace(slot::PROFILE_BADGES, profile::profile_badges(user)),
        None => surface.clear(slot::PROFILE_BADGES),
    }
}

/// Re-renders the header whenever the session changes.
pub struct SessionChrome {
    surface: Arc<dyn Surface>,
}

impl SessionChrome {
    pub fn new(surface: Arc<dyn Surface>) -> Self {
        Self { surface }
    }
}

impl SessionObserver for SessionChrome {
    fn session_changed(&self, session: Option<&UserSession>) {
        render_session_chrome(self.surface.as_ref(), session);
    }
}
