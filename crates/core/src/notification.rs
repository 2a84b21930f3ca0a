use crate::errors::CoreError;
use crate::models::reminder::NotificationIntent;

/// Platform notification permission. `Denied` is terminal until the user
/// changes it outside the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotificationPermission {
    /// Never asked
    #[default]
    Default,
    Granted,
    Denied,
}

/// Platform notification delivery.
pub trait Notifier {
    fn permission(&self) -> NotificationPermission;

    /// Prompt the user. Returns the resulting permission.
    fn request_permission(&mut self) -> NotificationPermission;

    /// Show one notification. Best effort.
    fn notify(&self, intent: &NotificationIntent) -> Result<(), CoreError>;
}

/// Ask for permission only if the user was never asked.
/// A no-op when permission is already granted or denied.
pub fn ensure_permission(notifier: &mut dyn Notifier) -> NotificationPermission {
    match notifier.permission() {
        NotificationPermission::Default => notifier.request_permission(),
        settled => settled,
    }
}

/// Headless notifier: every notification becomes a log event.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn permission(&self) -> NotificationPermission {
        NotificationPermission::Granted
    }

    fn request_permission(&mut self) -> NotificationPermission {
        NotificationPermission::Granted
    }

    fn notify(&self, intent: &NotificationIntent) -> Result<(), CoreError> {
        tracing::info!(key = %intent.key, title = %intent.title, body = %intent.body, "service reminder");
        Ok(())
    }
}
