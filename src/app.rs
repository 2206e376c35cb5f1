use std::sync::Arc;
use tracing::info;

use crate::actions::Actions;
use crate::api::{ApiClient, HttpTransport, Transport};
use crate::config::Config;
use crate::error::{ApiError, StorageError};
use crate::models::{Application, Job, UserType};
use crate::pages::{Pages, SessionChrome};
use crate::poll::{ChatPoll, VerificationPoll};
use crate::session::SessionStore;
use crate::storage::{SqliteStorage, Storage};
use crate::surface::{MemorySurface, Navigator, Surface, Visibility};
use crate::toast::ToastChannel;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// What the dashboard loaders returned for the signed-in role.
#[derive(Debug, Clone)]
pub enum Dashboard {
    Organizer {
        jobs: Vec<Job>,
        applications: Vec<Application>,
    },
    Staff {
        applications: Vec<Application>,
    },
}

/// One fully wired client: session, gateway, loaders, pollers and action handlers.
pub struct App {
    pub config: Config,
    pub session: Arc<SessionStore>,
    pub api: Arc<ApiClient>,
    pub surface: Arc<MemorySurface>,
    pub toasts: ToastChannel,
    pub visibility: Visibility,
    pub pages: Arc<Pages>,
    pub chat: Arc<ChatPoll>,
    pub verification: Arc<VerificationPoll>,
    pub actions: Actions,
}

impl App {
    /// Opens the on-disk store and talks HTTP to `config.api_base`.
    pub fn open(config: Config, navigator: Arc<dyn Navigator>) -> Result<Self, StartupError> {
        let storage: Arc<dyn Storage> = Arc::new(SqliteStorage::open(config.data_dir.as_deref())?);
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&config.api_base, config.http_timeout)?);
        Ok(Self::assemble(config, storage, transport, navigator))
    }

    pub fn assemble(
        config: Config,
        storage: Arc<dyn Storage>,
        transport: Arc<dyn Transport>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let session = Arc::new(SessionStore::load(storage.clone()));
        let api = Arc::new(ApiClient::new(transport, storage, session.clone(), navigator.clone()));

        let surface = Arc::new(MemorySurface::new());
        let dyn_surface: Arc<dyn Surface> = surface.clone();
        session.subscribe(Arc::new(SessionChrome::new(dyn_surface.clone())));

        let toasts = ToastChannel::with_surface(config.toast_ttl, dyn_surface.clone());
        let visibility = Visibility::new();
        let pages = Arc::new(Pages::new(api.clone(), dyn_surface.clone()));
        let chat = Arc::new(ChatPoll::new(
            api.clone(),
            dyn_surface.clone(),
            config.chat_poll,
            visibility.clone(),
        ));
        let verification = Arc::new(VerificationPoll::new(
            api.clone(),
            dyn_surface,
            toasts.clone(),
            config.verify_poll,
            visibility.clone(),
        ));
        let actions = Actions::new(api.clone(), pages.clone(), toasts.clone(), navigator, chat.clone());

        info!(api_base = %config.api_base, signed_in = session.is_authenticated(), "client ready");
        pages.session_chrome();
        Self {
            config,
            session,
            api,
            surface,
            toasts,
            visibility,
            pages,
            chat,
            verification,
            actions,
        }
    }

    /// Loads the dashboard for the session's role, then starts waiting on verification
    /// if the user still needs it.
    pub async fn enter_dashboard(&self) -> Result<Dashboard, ApiError> {
        let user = self.session.get().ok_or(ApiError::AuthRequired)?;
        let loaded = if user.user_type == UserType::Organizer {
            self.pages
                .organizer_dashboard()
                .await
                .map(|(jobs, applications)| Dashboard::Organizer { jobs, applications })
        } else {
            self.pages
                .staff_dashboard()
                .await
                .map(|applications| Dashboard::Staff { applications })
        };
        // A 401 above has already cleared the session, so this is a no-op then.
        if self.verification.start_if_needed() {
            info!(user = %user.username, "waiting on verification");
        }
        loaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Method;
    use crate::api::testing::ScriptedTransport;
    use crate::models::UserSession;
    use crate::storage::MemoryStorage;
    use crate::surface::{RecordingNavigator, slot};
    use serde_json::json;

    fn signed_in_app(transport: Arc<ScriptedTransport>, user: UserSession) -> App {
        let storage = Arc::new(MemoryStorage::new());
        SessionStore::new(storage.clone()).save(Some(user));
        App::assemble(Config::default(), storage, transport, Arc::new(RecordingNavigator::new()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_entering_dashboard_starts_verification_poll_for_unverified_staff() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on(Method::Get, "/applications/", 200, json!({"results": []}));
        let app = signed_in_app(
            transport.clone(),
            UserSession {
                id: Some(5),
                username: "asha".into(),
                user_type: UserType::Staff,
                ..Default::default()
            },
        );

        let dashboard = app.enter_dashboard().await.unwrap();
        assert!(matches!(dashboard, Dashboard::Staff { ref applications } if applications.is_empty()));
        assert!(app.verification.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entering_dashboard_leaves_verified_organizer_idle() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on(Method::Get, "/jobs/my/", 200, json!({"results": [{"id": 2, "title": "Gala"}]}));
        transport.on(Method::Get, "/applications/", 200, json!({"results": []}));
        let app = signed_in_app(
            transport.clone(),
            UserSession {
                id: Some(1),
                username: "ravi".into(),
                user_type: UserType::Organizer,
                kyc_verified: true,
                video_verified: true,
                ..Default::default()
            },
        );

        match app.enter_dashboard().await.unwrap() {
            Dashboard::Organizer { jobs, .. } => assert_eq!(jobs[0].title, "Gala"),
            other => panic!("unexpected dashboard {other:?}"),
        }
        assert!(!app.verification.is_active());
        assert_eq!(transport.call_count("/jobs/my/"), 1);
    }

    #[tokio::test]
    async fn test_login_renders_header_through_observer() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on(
            Method::Post,
            "/auth/login/",
            200,
            json!({"profile": {"id": 1, "username": "ravi", "user_type": "organizer"}}),
        );
        let app = App::assemble(
            Config::default(),
            Arc::new(MemoryStorage::new()),
            transport,
            Arc::new(RecordingNavigator::new()),
        );
        assert!(app.surface.content(slot::NAV_USER).unwrap().contains("Login"));

        app.actions.login("ravi", "pw").await.unwrap();
        let nav = app.surface.content(slot::NAV_USER).unwrap();
        assert!(nav.contains("/organizer-dashboard/"));
        assert!(app.surface.content(slot::TOASTS).unwrap().contains("Welcome back, ravi!"));
    }
}
