/// Informational sink for record/skip outcomes. Notifications are
/// observability only; delivery never affects the recording result.
pub trait Notifier: Send + Sync {
    fn info(&self, message: &str);
}

/// Default sink: forwards to the `tracing` pipeline.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn info(&self, message: &str) {
        tracing::info!(target: "stubrecord", "{message}");
    }
}
