//! Routes finished documents to their delivery target.

use scanbot_core::chat::{ChatId, ChatTransport};
use scanbot_core::delivery::DocumentStore;
use scanbot_core::error::{Result, ScanBotError};
use scanbot_core::scanner::{DocumentStream, ScanTarget};
use std::sync::Arc;

pub struct DeliveryDispatcher {
    transport: Arc<dyn ChatTransport>,
    store: Option<Arc<dyn DocumentStore>>,
}

impl DeliveryDispatcher {
    /// `store` is `None` when no document store is configured; documents
    /// addressed to it are then rejected.
    pub fn new(transport: Arc<dyn ChatTransport>, store: Option<Arc<dyn DocumentStore>>) -> Self {
        Self { transport, store }
    }

    pub fn supports(&self, target: ScanTarget) -> bool {
        match target {
            ScanTarget::ChatDelivery => true,
            ScanTarget::DocumentStore => self.store.is_some(),
        }
    }

    /// Hands `document` to `target`. The stream is consumed whatever the outcome.
    pub async fn deliver(
        &self,
        chat_id: ChatId,
        target: ScanTarget,
        document: DocumentStream,
        file_name: &str,
    ) -> Result<()> {
        tracing::info!("[Delivery] {} -> {}", file_name, target);
        match target {
            ScanTarget::ChatDelivery => {
                self.transport
                    .send_document(chat_id, document, file_name)
                    .await
            }
            ScanTarget::DocumentStore => match &self.store {
                Some(store) => store.upload(document, file_name).await,
                None => Err(ScanBotError::UnknownTarget(target.to_string())),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use scanbot_core::chat::{Prompt, PromptHandle};
    use scanbot_core::scanner::{read_document, stream_from_bytes};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Sink {
        received: Mutex<Vec<(String, Vec<u8>)>>,
    }

    impl Sink {
        async fn record(&self, label: String, document: DocumentStream) -> Result<()> {
            let bytes = read_document(document).await?;
            self.received.lock().unwrap().push((label, bytes));
            Ok(())
        }
    }

    #[async_trait]
    impl ChatTransport for Sink {
        async fn send_prompt(&self, _: ChatId, _: &Prompt) -> Result<PromptHandle> {
            Ok(PromptHandle(1))
        }

        async fn edit_prompt(&self, _: ChatId, _: PromptHandle, _: &Prompt) -> Result<()> {
            Ok(())
        }

        async fn delete_prompt(&self, _: ChatId, _: PromptHandle) -> Result<()> {
            Ok(())
        }

        async fn send_document(
            &self,
            chat_id: ChatId,
            document: DocumentStream,
            file_name: &str,
        ) -> Result<()> {
            self.record(format!("chat {chat_id}: {file_name}"), document)
                .await
        }

        async fn acknowledge(&self, _: &str, _: &str) -> Result<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl DocumentStore for Sink {
        async fn upload(&self, document: DocumentStream, file_name: &str) -> Result<()> {
            self.record(format!("store: {file_name}"), document).await
        }
    }

    #[tokio::test]
    async fn test_routes_by_target() {
        let sink = Arc::new(Sink::default());
        let dispatcher = DeliveryDispatcher::new(sink.clone(), Some(sink.clone()));

        dispatcher
            .deliver(ChatId(9), ScanTarget::ChatDelivery, stream_from_bytes(b"a".to_vec()), "a.pdf")
            .await
            .unwrap();
        dispatcher
            .deliver(ChatId(9), ScanTarget::DocumentStore, stream_from_bytes(b"b".to_vec()), "b.pdf")
            .await
            .unwrap();

        assert_eq!(
            *sink.received.lock().unwrap(),
            vec![
                ("chat 9: a.pdf".to_string(), b"a".to_vec()),
                ("store: b.pdf".to_string(), b"b".to_vec()),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_store_is_unknown_target() {
        let sink = Arc::new(Sink::default());
        let dispatcher = DeliveryDispatcher::new(sink.clone(), None);

        assert!(!dispatcher.supports(ScanTarget::DocumentStore));
        let err = dispatcher
            .deliver(ChatId(9), ScanTarget::DocumentStore, stream_from_bytes(Vec::new()), "x.pdf")
            .await
            .unwrap_err();

        assert_eq!(err, ScanBotError::UnknownTarget("paperless".to_string()));
        assert!(sink.received.lock().unwrap().is_empty());
    }
}
