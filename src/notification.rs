#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// User-facing transient message sink.
pub trait Notifier {
    fn notify(&self, level: NoticeLevel, body: &str);
}

#[derive(Debug, Clone, Copy)]
pub struct DesktopNotifier {
    enabled: bool,
}

impl DesktopNotifier {
    pub const fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, level: NoticeLevel, body: &str) {
        tracing::debug!(?level, body, "user notice");
        if !self.enabled {
            return;
        }
        let summary = match level {
            NoticeLevel::Info => "Retouch",
            NoticeLevel::Error => "Retouch: action failed",
        };
        if let Err(err) = notify_rust::Notification::new()
            .appname("Retouch")
            .summary(summary)
            .body(body)
            .show()
        {
            tracing::warn!("system notification failed: {err}");
        }
    }
}

/// Collects notices in memory; used by headless callers and tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: std::cell::RefCell<Vec<(NoticeLevel, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<(NoticeLevel, String)> {
        self.notices.borrow().clone()
    }

    pub fn take(&self) -> Vec<(NoticeLevel, String)> {
        self.notices.take()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: NoticeLevel, body: &str) {
        self.notices.borrow_mut().push((level, body.to_string()));
    }
}
