use axum::Router;
use axum::extract::{Multipart, Path, State};
use axum::routing::post;
use axum::{Json, body::Bytes};
use scanbot_core::chat::{ChatId, ChatTransport, EventSource, InboundEvent, Prompt, PromptHandle};
use scanbot_core::error::ScanBotError;
use scanbot_core::scanner::stream_from_bytes;
use scanbot_interaction::TelegramClient;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct BotApi {
    requests: Mutex<Vec<(String, Value)>>,
    replies: Mutex<VecDeque<Value>>,
    documents: Mutex<Vec<(String, Vec<u8>)>>,
    delay: Mutex<Duration>,
}

impl BotApi {
    fn reply(&self, value: Value) {
        self.replies.lock().unwrap().push_back(value);
    }

    fn requests(&self) -> Vec<(String, Value)> {
        self.requests.lock().unwrap().clone()
    }

    async fn stall(&self) {
        let delay = *self.delay.lock().unwrap();
        tokio::time::sleep(delay).await;
    }
}

async fn method(
    State(api): State<Arc<BotApi>>,
    Path(method): Path<String>,
    body: Bytes,
) -> Json<Value> {
    api.stall().await;
    let request = serde_json::from_slice(&body).unwrap_or(Value::Null);
    api.requests.lock().unwrap().push((method, request));
    let reply = api
        .replies
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| json!({"ok": true, "result": true}));
    Json(reply)
}

async fn send_document(State(api): State<Arc<BotApi>>, mut multipart: Multipart) -> Json<Value> {
    api.stall().await;
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let label = match field.file_name() {
            Some(file_name) => format!("{name}:{file_name}"),
            None => name,
        };
        let bytes = field.bytes().await.unwrap().to_vec();
        api.documents.lock().unwrap().push((label, bytes));
    }
    Json(json!({"ok": true, "result": {"message_id": 77, "chat": {"id": 7}}}))
}

async fn bot_api(api: Arc<BotApi>) -> TelegramClient {
    let app = Router::new()
        .route("/bottest-token/sendDocument", post(send_document))
        .route("/bottest-token/:method", post(method))
        .with_state(api);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TelegramClient::new("test-token", Duration::from_secs(1))
        .unwrap()
        .with_api_base(format!("http://{addr}/"))
}

#[tokio::test]
async fn test_polling_advances_offset() {
    let api = Arc::new(BotApi::default());
    api.reply(json!({"ok": true, "result": [
        {"update_id": 10, "message": {"message_id": 1, "from": {"id": 42}, "chat": {"id": 7}, "text": "hi"}},
        {"update_id": 11, "callback_query": {"id": "cb", "from": {"id": 42},
            "message": {"message_id": 2, "chat": {"id": 7}}, "data": "Yes"}}
    ]}));
    api.reply(json!({"ok": true, "result": []}));
    let client = bot_api(api.clone()).await;

    let events = client.next_events().await.unwrap();
    assert_eq!(
        events,
        vec![
            InboundEvent::message(42, 7, "hi"),
            InboundEvent::callback(42, 7, "cb", "Yes"),
        ]
    );
    assert!(client.next_events().await.unwrap().is_empty());

    let offsets: Vec<Value> = api
        .requests()
        .into_iter()
        .map(|(_, body)| body["offset"].clone())
        .collect();
    assert_eq!(offsets, vec![json!(0), json!(12)]);
}

#[tokio::test]
async fn test_send_prompt_returns_message_handle() {
    let api = Arc::new(BotApi::default());
    api.reply(json!({"ok": true, "result": {"message_id": 55, "chat": {"id": 7}}}));
    let client = bot_api(api.clone()).await;

    let handle = client
        .send_prompt(ChatId(7), &Prompt::yes_no("Duplex scan?"))
        .await
        .unwrap();

    assert_eq!(handle, PromptHandle(55));
    let (method, body) = api.requests().remove(0);
    assert_eq!(method, "sendMessage");
    assert_eq!(body["chat_id"], json!(7));
    assert_eq!(body["text"], json!("Duplex scan?"));
    assert_eq!(
        body["reply_markup"]["inline_keyboard"][0][1]["callback_data"],
        json!("No")
    );
}

#[tokio::test]
async fn test_rejected_call_maps_to_transport_error() {
    let api = Arc::new(BotApi::default());
    api.reply(json!({"ok": false, "error_code": 400, "description": "Bad Request: message to delete not found"}));
    let client = bot_api(api).await;

    let err = client
        .delete_prompt(ChatId(7), PromptHandle(3))
        .await
        .unwrap_err();

    match err {
        ScanBotError::Transport(message) => assert!(message.contains("not found")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_unchanged_edit_is_not_an_error() {
    let api = Arc::new(BotApi::default());
    api.reply(json!({"ok": false, "error_code": 400,
        "description": "Bad Request: message is not modified: specified new message content is the same"}));
    let client = bot_api(api).await;

    client
        .edit_prompt(ChatId(7), PromptHandle(3), &Prompt::yes_no("Again?"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_send_document_uploads_stream() {
    let api = Arc::new(BotApi::default());
    let client = bot_api(api.clone()).await;

    client
        .send_document(ChatId(7), stream_from_bytes(b"%PDF".to_vec()), "scan.pdf")
        .await
        .unwrap();

    assert_eq!(
        *api.documents.lock().unwrap(),
        vec![
            ("chat_id".to_string(), b"7".to_vec()),
            ("document:scan.pdf".to_string(), b"%PDF".to_vec()),
        ]
    );
}

#[tokio::test]
async fn test_upload_has_its_own_timeout() {
    let api = Arc::new(BotApi::default());
    *api.delay.lock().unwrap() = Duration::from_millis(1500);
    let client = bot_api(api.clone())
        .await
        .with_request_headroom(Duration::from_millis(200))
        .with_upload_timeout(Duration::from_secs(10));

    client
        .send_document(ChatId(7), stream_from_bytes(b"%PDF".to_vec()), "slow.pdf")
        .await
        .unwrap();
    assert_eq!(api.documents.lock().unwrap().len(), 2);

    let err = client
        .send_prompt(ChatId(7), &Prompt::yes_no("Still there?"))
        .await
        .unwrap_err();
    assert!(matches!(err, ScanBotError::Transport(_)));
}
