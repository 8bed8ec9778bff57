//! Console notifier for test mode.

use async_trait::async_trait;

use crate::error::Result;
use crate::notify::{Alert, Notifier};

/// Logs alerts instead of delivering them. Selected by the CLI `--test`
/// flag.
#[derive(Debug, Clone, Default)]
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn send(&self, alert: &Alert) -> Result<()> {
        if alert.operator {
            log::error!("[operator alert] {}: {}", alert.title, alert.message);
        } else {
            log::info!("[alert] {}: {}", alert.title, alert.message);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_never_fails() {
        let notifier = ConsoleNotifier;
        assert!(notifier.send(&Alert::operator("test")).await.is_ok());
    }
}
