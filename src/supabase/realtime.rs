use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use crate::error::{AppError, AppResult};
use crate::supabase::SupabaseClient;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
const EVENT_BUFFER: usize = 64;

/// One `postgres_changes` binding inside a channel join.
#[derive(Clone, Debug, Serialize)]
pub struct PostgresChange {
    pub event: String,
    pub schema: String,
    pub table: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

impl PostgresChange {
    /// Listen for every change on a table.
    pub fn all(table: &str) -> Self {
        Self {
            event: "*".to_string(),
            schema: "public".to_string(),
            table: table.to_string(),
            filter: None,
        }
    }

    /// Listen for inserts only.
    pub fn inserts(table: &str) -> Self {
        Self {
            event: "INSERT".to_string(),
            schema: "public".to_string(),
            table: table.to_string(),
            filter: None,
        }
    }

    /// Narrow to rows matching a backend filter, e.g. `ride_id=eq.{id}`.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub enum ChangeType {
    #[serde(rename = "INSERT")]
    Insert,
    #[serde(rename = "UPDATE")]
    Update,
    #[serde(rename = "DELETE")]
    Delete,
}

/// A single row change delivered by the feed.
#[derive(Clone, Debug, Deserialize)]
pub struct ChangeEvent {
    #[serde(rename = "type")]
    pub change_type: ChangeType,
    pub table: String,
    #[serde(default)]
    pub record: serde_json::Value,
    #[serde(default)]
    pub old_record: Option<serde_json::Value>,
}

/// Wire frame of the realtime protocol.
#[derive(Debug, Serialize, Deserialize)]
struct PhoenixMessage {
    topic: String,
    event: String,
    payload: serde_json::Value,
    #[serde(rename = "ref")]
    reference: Option<String>,
}

/// Build the join frame for a channel with the given change bindings.
fn join_message(topic: &str, changes: &[PostgresChange]) -> PhoenixMessage {
    PhoenixMessage {
        topic: format!("realtime:{}", topic),
        event: "phx_join".to_string(),
        payload: json!({ "config": { "postgres_changes": changes } }),
        reference: Some("1".to_string()),
    }
}

fn heartbeat_message(reference: u64) -> PhoenixMessage {
    PhoenixMessage {
        topic: "phoenix".to_string(),
        event: "heartbeat".to_string(),
        payload: json!({}),
        reference: Some(reference.to_string()),
    }
}

/// A live channel subscription. Dropping it aborts the socket task, so a
/// subscription can never deliver events for a view that no longer exists.
pub struct Subscription {
    events: mpsc::Receiver<ChangeEvent>,
    task: tokio::task::JoinHandle<()>,
}

impl Subscription {
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.events.recv().await
    }

    pub fn events_mut(&mut self) -> &mut mpsc::Receiver<ChangeEvent> {
        &mut self.events
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl SupabaseClient {
    /// Open a realtime channel and stream its row changes.
    pub async fn channel(
        &self,
        topic: &str,
        changes: Vec<PostgresChange>,
    ) -> AppResult<Subscription> {
        let url = self.config.realtime_url();
        let (ws, _) = connect_async(url.as_str())
            .await
            .map_err(|e| AppError::Realtime(format!("connect failed: {}", e)))?;
        let (mut sink, mut stream) = ws.split();

        let join = serde_json::to_string(&join_message(topic, &changes))
            .map_err(|e| AppError::Realtime(format!("bad join frame: {}", e)))?;
        sink.send(WsMessage::Text(join))
            .await
            .map_err(|e| AppError::Realtime(format!("join failed: {}", e)))?;

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let channel_topic = topic.to_string();

        let task = tokio::spawn(async move {
            let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
            let mut next_ref: u64 = 2;

            loop {
                tokio::select! {
                    _ = heartbeat.tick() => {
                        let frame = match serde_json::to_string(&heartbeat_message(next_ref)) {
                            Ok(frame) => frame,
                            Err(_) => break,
                        };
                        next_ref += 1;
                        if sink.send(WsMessage::Text(frame)).await.is_err() {
                            tracing::warn!(topic = %channel_topic, "heartbeat failed, closing channel");
                            break;
                        }
                    }
                    incoming = stream.next() => match incoming {
                        Some(Ok(WsMessage::Text(text))) => {
                            let Ok(frame) = serde_json::from_str::<PhoenixMessage>(&text) else {
                                continue;
                            };
                            match frame.event.as_str() {
                                "postgres_changes" => {
                                    let data = frame.payload.get("data").cloned();
                                    let Some(data) = data else { continue };
                                    match serde_json::from_value::<ChangeEvent>(data) {
                                        Ok(event) => {
                                            if tx.send(event).await.is_err() {
                                                // Receiver gone, view torn down
                                                break;
                                            }
                                        }
                                        Err(e) => {
                                            tracing::debug!(topic = %channel_topic, "unparseable change: {}", e);
                                        }
                                    }
                                }
                                "phx_reply" => {
                                    let status = frame.payload.get("status").and_then(|s| s.as_str());
                                    if status != Some("ok") {
                                        tracing::warn!(topic = %channel_topic, "channel reply: {}", frame.payload);
                                    }
                                }
                                "phx_error" | "phx_close" => {
                                    tracing::warn!(topic = %channel_topic, "channel closed by server");
                                    break;
                                }
                                _ => {}
                            }
                        }
                        Some(Ok(WsMessage::Ping(data))) => {
                            let _ = sink.send(WsMessage::Pong(data)).await;
                        }
                        Some(Ok(WsMessage::Close(_))) | None => break,
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            tracing::warn!(topic = %channel_topic, "socket error: {}", e);
                            break;
                        }
                    }
                }
            }
        });

        Ok(Subscription { events: rx, task })
    }
}

/// Coalesce bursts of change events: wait for a quiet window after the first
/// event, then trigger one refetch for the whole burst.
pub async fn debounce_refetch<F, Fut>(
    events: &mut mpsc::Receiver<ChangeEvent>,
    quiet: Duration,
    mut refetch: F,
) where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    while let Some(_event) = events.recv().await {
        loop {
            match tokio::time::timeout(quiet, events.recv()).await {
                // Burst still going, keep absorbing
                Ok(Some(_)) => continue,
                // Feed closed with a pending burst
                Ok(None) => {
                    refetch().await;
                    return;
                }
                // Quiet window elapsed
                Err(_) => break,
            }
        }
        refetch().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn join_frame_carries_table_and_filter() {
        let changes = vec![PostgresChange::inserts("messages").with_filter("ride_id=eq.42")];
        let frame = join_message("messages:42", &changes);
        let value = serde_json::to_value(&frame).unwrap();

        assert_eq!(value["topic"], "realtime:messages:42");
        assert_eq!(value["event"], "phx_join");
        let binding = &value["payload"]["config"]["postgres_changes"][0];
        assert_eq!(binding["event"], "INSERT");
        assert_eq!(binding["schema"], "public");
        assert_eq!(binding["table"], "messages");
        assert_eq!(binding["filter"], "ride_id=eq.42");
    }

    #[test]
    fn unfiltered_binding_omits_filter_key() {
        let value =
            serde_json::to_value(join_message("rides", &[PostgresChange::all("rides")])).unwrap();
        let binding = &value["payload"]["config"]["postgres_changes"][0];
        assert_eq!(binding["event"], "*");
        assert!(binding.get("filter").is_none());
    }

    #[test]
    fn change_event_parses_feed_payload() {
        let data = serde_json::json!({
            "type": "INSERT",
            "table": "messages",
            "schema": "public",
            "commit_timestamp": "2026-08-30T12:00:00Z",
            "record": { "id": "abc", "content": "oi" },
            "old_record": null
        });
        let event: ChangeEvent = serde_json::from_value(data).unwrap();
        assert_eq!(event.change_type, ChangeType::Insert);
        assert_eq!(event.table, "messages");
        assert_eq!(event.record["content"], "oi");
    }

    fn event() -> ChangeEvent {
        ChangeEvent {
            change_type: ChangeType::Insert,
            table: "rides".to_string(),
            record: serde_json::Value::Null,
            old_record: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_events_triggers_one_refetch() {
        let (tx, mut rx) = mpsc::channel(16);
        let refetches = Arc::new(AtomicUsize::new(0));
        let counter = refetches.clone();

        for _ in 0..5 {
            tx.send(event()).await.unwrap();
        }
        drop(tx);

        debounce_refetch(&mut rx, Duration::from_millis(250), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        })
        .await;

        assert_eq!(refetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn separated_events_each_trigger_a_refetch() {
        let (tx, mut rx) = mpsc::channel(16);
        let refetches = Arc::new(AtomicUsize::new(0));
        let counter = refetches.clone();

        let producer = tokio::spawn(async move {
            tx.send(event()).await.unwrap();
            tokio::time::sleep(Duration::from_secs(1)).await;
            tx.send(event()).await.unwrap();
        });

        debounce_refetch(&mut rx, Duration::from_millis(250), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        })
        .await;

        producer.await.unwrap();
        assert_eq!(refetches.load(Ordering::SeqCst), 2);
    }
}
