use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::render::escape_html;
use crate::surface::{Surface, slot};

pub const DEFAULT_TTL: Duration = Duration::from_millis(3200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastVariant {
    Info,
    Success,
    Warning,
    Error,
}

impl ToastVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            ToastVariant::Info => "info",
            ToastVariant::Success => "success",
            ToastVariant::Warning => "warning",
            ToastVariant::Error => "error",
        }
    }
}

impl fmt::Display for ToastVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub message: String,
    pub variant: ToastVariant,
    pub ttl: Duration,
}

struct Inner {
    ttl: Duration,
    next_id: AtomicU64,
    active: Mutex<Vec<Toast>>,
    events: broadcast::Sender<Toast>,
    surface: Option<Arc<dyn Surface>>,
}

/// Transient notifications. Each toast owns its dismissal timer, so any number can be
/// on screen at once.
#[derive(Clone)]
pub struct ToastChannel {
    inner: Arc<Inner>,
}

impl ToastChannel {
    pub fn new(ttl: Duration) -> Self {
        Self::build(ttl, None)
    }

    /// Channel that keeps the toast container slot of `surface` in sync.
    pub fn with_surface(ttl: Duration, surface: Arc<dyn Surface>) -> Self {
        Self::build(ttl, Some(surface))
    }

    fn build(ttl: Duration, surface: Option<Arc<dyn Surface>>) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(Inner {
                ttl,
                next_id: AtomicU64::new(1),
                active: Mutex::new(Vec::new()),
                events,
                surface,
            }),
        }
    }

    pub fn show(&self, message: impl Into<String>, variant: ToastVariant) -> u64 {
        let toast = Toast {
            id: self.inner.next_id.fetch_add(1, Ordering::Relaxed),
            message: message.into(),
            variant,
            ttl: self.inner.ttl,
        };
        debug!(id = toast.id, %variant, message = %toast.message, "toast");

        if let Ok(mut active) = self.inner.active.lock() {
            active.push(toast.clone());
        }
        let _ = self.inner.events.send(toast.clone());
        self.sync_surface();

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let channel = self.clone();
                let (id, ttl) = (toast.id, toast.ttl);
                handle.spawn(async move {
                    tokio::time::sleep(ttl).await;
                    channel.dismiss(id);
                });
            }
            Err(_) => warn!(id = toast.id, "no runtime for toast timer; it stays until dismissed"),
        }
        toast.id
    }

    pub fn info(&self, message: impl Into<String>) -> u64 {
        self.show(message, ToastVariant::Info)
    }

    pub fn success(&self, message: impl Into<String>) -> u64 {
        self.show(message, ToastVariant::Success)
    }

    pub fn warning(&self, message: impl Into<String>) -> u64 {
        self.show(message, ToastVariant::Warning)
    }

    pub fn error(&self, message: impl Into<String>) -> u64 {
        self.show(message, ToastVariant::Error)
    }

    pub fn dismiss(&self, id: u64) {
        let removed = match self.inner.active.lock() {
            Ok(mut active) => {
                let before = active.len();
                active.retain(|t| t.id != id);
                active.len() != before
            }
            Err(_) => false,
        };
        if removed {
            self.sync_surface();
        }
    }

    pub fn active(&self) -> Vec<Toast> {
        self.inner
            .active
            .lock()
            .map(|a| a.clone())
            .unwrap_or_default()
    }

    /// Every toast as it is shown, for front-ends that print rather than render.
    pub fn subscribe(&self) -> broadcast::Receiver<Toast> {
        self.inner.events.subscribe()
    }

    pub fn render(&self) -> String {
        render_toasts(&self.active())
    }

    fn sync_surface(&self) {
        if let Some(surface) = &self.inner.surface {
            surface.replace(slot::TOASTS, self.render());
        }
    }
}

pub fn render_toasts(toasts: &[Toast]) -> String {
    toasts
        .iter()
        .map(|t| {
            format!(
                r#"<div class="toast toast-{}" data-toast-id="{}">{}</div>"#,
                t.variant,
                t.id,
                escape_html(&t.message)
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::MemorySurface;

    #[tokio::test(start_paused = true)]
    async fn test_toasts_coexist_and_expire_independently() {
        let toasts = ToastChannel::new(DEFAULT_TTL);
        let first = toasts.success("Saved");
        tokio::time::sleep(Duration::from_millis(1000)).await;
        let second = toasts.error("Failed <again>");
        assert_ne!(first, second);
        assert_eq!(toasts.active().len(), 2);

        let html = toasts.render();
        assert!(html.contains(r#"class="toast toast-success""#));
        assert!(html.contains("Failed &lt;again&gt;"));

        tokio::time::sleep(Duration::from_millis(2300)).await;
        let left: Vec<u64> = toasts.active().iter().map(|t| t.id).collect();
        assert_eq!(left, vec![second]);

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert!(toasts.active().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_and_surface_follow_toasts() {
        let surface = Arc::new(MemorySurface::new());
        let toasts = ToastChannel::with_surface(Duration::from_millis(500), surface.clone());
        let mut rx = toasts.subscribe();

        toasts.warning("You have already applied to this job");
        let seen = rx.recv().await.unwrap();
        assert_eq!(seen.variant, ToastVariant::Warning);
        assert!(surface.content(slot::TOASTS).unwrap().contains("toast-warning"));

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(surface.content(slot::TOASTS).as_deref(), Some(""));
    }

    #[test]
    fn test_show_without_runtime_keeps_toast() {
        let toasts = ToastChannel::new(DEFAULT_TTL);
        let id = toasts.info("hello");
        assert_eq!(toasts.active().len(), 1);
        toasts.dismiss(id);
        assert!(toasts.active().is_empty());
    }
}
