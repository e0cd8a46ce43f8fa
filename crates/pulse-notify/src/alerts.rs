//! Native alert fan-out
//!
//! Delivery runs on spawned tasks so creation never waits on the platform.
//! Permission is asked for at most once, on the first delivery.

use crate::config::NotificationConfig;
use pulse_core::{AlertPermission, AlertSink, NativeAlert, NotificationRecord, Priority};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub(crate) struct AlertDispatcher {
    sink: Arc<dyn AlertSink>,
    permission: OnceCell<AlertPermission>,
    auto_dismiss: Duration,
    dismiss_high_priority: bool,
    cancel: CancellationToken,
}

impl AlertDispatcher {
    pub(crate) fn new(
        sink: Arc<dyn AlertSink>,
        config: &NotificationConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            sink,
            permission: OnceCell::new(),
            auto_dismiss: config.auto_dismiss_after(),
            dismiss_high_priority: config.auto_dismiss_high_priority,
            cancel,
        }
    }

    fn sticky(&self, priority: Priority) -> bool {
        priority == Priority::High && !self.dismiss_high_priority
    }

    /// Queue a native alert for `record`; a no-op outside a Tokio runtime
    pub(crate) fn deliver(self: &Arc<Self>, record: &NotificationRecord) {
        let Ok(handle) = Handle::try_current() else {
            debug!(id = %record.id, "no runtime; native alert skipped");
            return;
        };
        let alert = NativeAlert {
            title: record.title.clone(),
            body: record.message.clone(),
            tag: record.id.to_string(),
            require_interaction: self.sticky(record.priority),
        };
        let this = Arc::clone(self);
        handle.spawn(async move {
            tokio::select! {
                biased;
                () = this.cancel.cancelled() => {}
                () = this.show(alert) => {}
            }
        });
    }

    async fn permission(&self) -> AlertPermission {
        *self
            .permission
            .get_or_init(|| async {
                match self.sink.permission() {
                    AlertPermission::Prompt => {
                        let answer = self.sink.request_permission().await;
                        debug!(?answer, "native alert permission requested");
                        answer
                    }
                    current => current,
                }
            })
            .await
    }

    async fn show(&self, alert: NativeAlert) {
        let permission = self.permission().await;
        if permission != AlertPermission::Granted {
            debug!(?permission, tag = %alert.tag, "native alert not permitted");
            return;
        }

        let tag = alert.tag.clone();
        let sticky = alert.require_interaction;
        if let Err(err) = self.sink.show(alert).await {
            warn!(error = %err, %tag, "native alert delivery failed");
            return;
        }
        if !sticky {
            tokio::time::sleep(self.auto_dismiss).await;
            self.sink.close(&tag).await;
        }
    }
}

impl fmt::Debug for AlertDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlertDispatcher")
            .field("permission", &self.permission.get())
            .field("auto_dismiss", &self.auto_dismiss)
            .finish_non_exhaustive()
    }
}
