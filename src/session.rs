use serde_json::{Map, Value};
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::models::{UserSession, UserType};
use crate::storage::Storage;
use crate::surface::Navigator;

/// Durable key holding the signed-in user (without the profile picture).
pub const SESSION_KEY: &str = "eventflex_user";

/// Told about every committed session change: avatar, nav header, welcome text.
pub trait SessionObserver: Send + Sync {
    fn session_changed(&self, session: Option<&UserSession>);
}

pub struct SessionStore {
    storage: Arc<dyn Storage>,
    current: RwLock<Option<UserSession>>,
    observers: RwLock<Vec<Arc<dyn SessionObserver>>>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            current: RwLock::new(None),
            observers: RwLock::new(Vec::new()),
        }
    }

    /// Hydrates from durable storage. Corrupt data is discarded and the session starts
    /// anonymous; nothing here can fail the caller.
    pub fn load(storage: Arc<dyn Storage>) -> Self {
        let store = Self::new(storage);
        let restored = store.read_durable();
        if let Some(user) = &restored {
            info!(username = %user.username, user_type = user.user_type.as_str(), "session restored");
        }
        if let Ok(mut current) = store.current.write() {
            *current = restored;
        }
        store
    }

    fn read_durable(&self) -> Option<UserSession> {
        match self.storage.get(SESSION_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<UserSession>(&raw) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!(error = %e, "discarding unreadable stored session");
                    if let Err(e) = self.storage.remove(SESSION_KEY) {
                        warn!(error = %e, "failed to clear stored session");
                    }
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "session storage unavailable");
                None
            }
        }
    }

    pub fn get(&self) -> Option<UserSession> {
        self.current.read().ok().and_then(|c| c.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.read().map(|c| c.is_some()).unwrap_or(false)
    }

    /// Replaces the whole snapshot. `None` signs out. The durable copy never carries the
    /// profile picture; the in-memory one keeps it.
    pub fn save(&self, user: Option<UserSession>) {
        match &user {
            Some(user) => match serde_json::to_string(&user.stripped()) {
                Ok(json) => {
                    if let Err(e) = self.storage.set(SESSION_KEY, &json) {
                        warn!(error = %e, "failed to persist session");
                    }
                }
                Err(e) => warn!(error = %e, "failed to encode session"),
            },
            None => {
                if let Err(e) = self.storage.remove(SESSION_KEY) {
                    warn!(error = %e, "failed to clear stored session");
                }
            }
        }

        if let Ok(mut current) = self.current.write() {
            *current = user.clone();
        }
        self.notify(user.as_ref());
    }

    pub fn clear(&self) {
        debug!("session cleared");
        self.save(None);
    }

    /// Overlays the fields present in a server profile onto the current snapshot and
    /// persists the result. A null or missing picture keeps the local one.
    pub fn merge(&self, update: &Value) -> Option<UserSession> {
        let Value::Object(fields) = update else {
            warn!("profile update is not an object; ignoring");
            return None;
        };

        let mut base = match self.get().map(|user| serde_json::to_value(&user)) {
            Some(Ok(Value::Object(map))) => map,
            _ => Map::new(),
        };
        for (key, value) in fields {
            if key == "profile_picture" && value.is_null() {
                continue;
            }
            base.insert(key.clone(), value.clone());
        }

        match serde_json::from_value::<UserSession>(Value::Object(base)) {
            Ok(merged) => {
                self.save(Some(merged.clone()));
                Some(merged)
            }
            Err(e) => {
                warn!(error = %e, "server profile could not be merged");
                None
            }
        }
    }

    /// Re-fetches `/profiles/me/`. Failures keep the cached snapshot and are only logged.
    pub async fn refresh_from_server(&self, api: &ApiClient) -> Option<UserSession> {
        if !self.is_authenticated() {
            debug!("no session to refresh");
            return None;
        }
        match api.my_profile().await {
            Ok(profile) => self.merge(&profile),
            Err(e) => {
                warn!(error = %e, "profile refresh failed; keeping cached session");
                None
            }
        }
    }

    /// Narrow update used by the verification poll.
    pub fn apply_verification(&self, kyc_verified: bool, video_verified: bool) -> Option<UserSession> {
        let mut user = self.get()?;
        user.kyc_verified = kyc_verified;
        user.video_verified = video_verified;
        self.save(Some(user.clone()));
        Some(user)
    }

    pub fn subscribe(&self, observer: Arc<dyn SessionObserver>) {
        if let Ok(mut observers) = self.observers.write() {
            observers.push(observer);
        }
    }

    fn notify(&self, session: Option<&UserSession>) {
        let observers = match self.observers.read() {
            Ok(observers) => observers.clone(),
            Err(_) => return,
        };
        for observer in observers {
            observer.session_changed(session);
        }
    }

    /// Gate for entering a page. Returns false after redirecting elsewhere.
    pub fn enter(&self, page: Page, navigator: &dyn Navigator) -> bool {
        match check_page_access(self.get().as_ref(), page) {
            PageAccess::Granted => true,
            PageAccess::Redirect(path) => {
                info!(page = page.path(), redirect = path, "page access denied");
                navigator.redirect(path);
                false
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Home,
    Login,
    Signup,
    Jobs,
    Talent,
    OrganizerDashboard,
    StaffPortal,
    Messages,
    Wallet,
    Profile,
}

impl Page {
    pub fn path(self) -> &'static str {
        match self {
            Page::Home => "/",
            Page::Login => "/login/",
            Page::Signup => "/signup/",
            Page::Jobs => "/jobs/",
            Page::Talent => "/talent/",
            Page::OrganizerDashboard => "/organizer-dashboard/",
            Page::StaffPortal => "/staff-portal/",
            Page::Messages => "/messages/",
            Page::Wallet => "/staff-portal/#wallet",
            Page::Profile => "/profile/",
        }
    }

    fn requires_auth(self) -> bool {
        !matches!(self, Page::Home | Page::Login | Page::Signup | Page::Jobs | Page::Talent)
    }

    fn required_user_type(self) -> Option<UserType> {
        match self {
            Page::OrganizerDashboard => Some(UserType::Organizer),
            Page::StaffPortal | Page::Wallet => Some(UserType::Staff),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAccess {
    Granted,
    Redirect(&'static str),
}

pub fn check_page_access(session: Option<&UserSession>, page: Page) -> PageAccess {
    if !page.requires_auth() {
        return PageAccess::Granted;
    }
    let Some(user) = session else {
        return PageAccess::Redirect("/login");
    };
    match page.required_user_type() {
        Some(required) if required != user.user_type => PageAccess::Redirect(user.user_type.home_path()),
        _ => PageAccess::Granted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::ScriptedTransport;
    use crate::api::Method;
    use crate::models::Profile;
    use crate::storage::MemoryStorage;
    use crate::surface::RecordingNavigator;
    use serde_json::json;
    use std::sync::Mutex;

    fn alice() -> UserSession {
        Profile {
            id: Some(7),
            username: "alice".into(),
            user_type: UserType::Staff,
            profile_picture: Some("https://cdn.example/alice.png".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_load_discards_corrupt_session() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(SESSION_KEY, "{not json").unwrap();

        let store = SessionStore::load(storage.clone());
        assert!(store.get().is_none());
        assert_eq!(storage.get(SESSION_KEY).unwrap(), None);
    }

    #[test]
    fn test_save_strips_picture_from_durable_copy() {
        let storage = Arc::new(MemoryStorage::new());
        let store = SessionStore::new(storage.clone());
        store.save(Some(alice()));

        let durable = storage.get(SESSION_KEY).unwrap().unwrap();
        assert!(!durable.contains("profile_picture"));
        assert!(store.get().unwrap().profile_picture.is_some());

        let reloaded = SessionStore::load(storage);
        let user = reloaded.get().unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.profile_picture, None);
    }

    #[test]
    fn test_save_none_clears_everything() {
        let storage = Arc::new(MemoryStorage::new());
        let store = SessionStore::new(storage.clone());
        store.save(Some(alice()));
        store.clear();
        assert!(!store.is_authenticated());
        assert_eq!(storage.get(SESSION_KEY).unwrap(), None);
    }

    #[test]
    fn test_merge_overlays_server_fields() {
        let store = SessionStore::new(Arc::new(MemoryStorage::new()));
        store.save(Some(alice()));

        let merged = store
            .merge(&json!({"city": "Pune", "kyc_verified": true, "badge": "pro", "profile_picture": null}))
            .unwrap();
        assert_eq!(merged.city, "Pune");
        assert!(merged.kyc_verified);
        assert_eq!(merged.username, "alice");
        assert_eq!(merged.id, Some(7));
        assert_eq!(merged.profile_picture.as_deref(), Some("https://cdn.example/alice.png"));
        assert_eq!(store.get().unwrap(), merged);
    }

    struct Counter(Mutex<Vec<Option<String>>>);

    impl SessionObserver for Counter {
        fn session_changed(&self, session: Option<&UserSession>) {
            self.0.lock().unwrap().push(session.map(|s| s.username.clone()));
        }
    }

    #[test]
    fn test_observers_see_every_save() {
        let store = SessionStore::new(Arc::new(MemoryStorage::new()));
        let counter = Arc::new(Counter(Mutex::new(Vec::new())));
        store.subscribe(counter.clone());

        store.save(Some(alice()));
        store.apply_verification(true, true);
        store.clear();

        let seen = counter.0.lock().unwrap().clone();
        assert_eq!(seen, vec![Some("alice".to_string()), Some("alice".to_string()), None]);
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_snapshot() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on(Method::Get, "/profiles/me/", 500, json!({"error": "boom"}));
        let harness = transport.harness();
        harness.session.save(Some(alice()));

        assert!(harness.session.refresh_from_server(&harness.api).await.is_none());
        assert_eq!(harness.session.get().unwrap(), alice());
        assert!(harness.navigator.history().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_merges_server_profile() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on(
            Method::Get,
            "/profiles/me/",
            200,
            json!({"id": 7, "username": "alice", "user_type": "staff", "video_verified": true, "average_rating": "4.80"}),
        );
        let harness = transport.harness();
        harness.session.save(Some(alice()));

        let user = harness.session.refresh_from_server(&harness.api).await.unwrap();
        assert!(user.video_verified);
        assert!((user.average_rating - 4.8).abs() < 1e-9);
        assert!(user.profile_picture.is_some());
    }

    #[test]
    fn test_page_access_rules() {
        let staff = alice();
        let organizer = Profile {
            username: "org".into(),
            user_type: UserType::Organizer,
            ..Default::default()
        };
        let odd = Profile {
            username: "x".into(),
            user_type: UserType::Unknown,
            ..Default::default()
        };

        assert_eq!(check_page_access(None, Page::Jobs), PageAccess::Granted);
        assert_eq!(check_page_access(None, Page::StaffPortal), PageAccess::Redirect("/login"));
        assert_eq!(check_page_access(Some(&staff), Page::StaffPortal), PageAccess::Granted);
        assert_eq!(
            check_page_access(Some(&staff), Page::OrganizerDashboard),
            PageAccess::Redirect("/staff-portal/")
        );
        assert_eq!(
            check_page_access(Some(&organizer), Page::Wallet),
            PageAccess::Redirect("/organizer-dashboard/")
        );
        assert_eq!(check_page_access(Some(&odd), Page::StaffPortal), PageAccess::Redirect("/"));
        assert_eq!(check_page_access(Some(&organizer), Page::Messages), PageAccess::Granted);
    }

    #[test]
    fn test_enter_redirects_anonymous_user() {
        let store = SessionStore::new(Arc::new(MemoryStorage::new()));
        let nav = RecordingNavigator::new();
        assert!(!store.enter(Page::Profile, &nav));
        assert_eq!(nav.history(), vec!["/login"]);
    }
}
