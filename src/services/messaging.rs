use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::entities::message::{Message, MessageInsert, PrivateMessage, PrivateMessageInsert};
use crate::entities::profile::PublicProfile;
use crate::error::{AppError, AppResult};
use crate::supabase::postgrest::Order;
use crate::supabase::realtime::{PostgresChange, Subscription};
use crate::supabase::SupabaseClient;

const MESSAGE_COLUMNS: &str =
    "*, sender:profiles!messages_sender_id_fkey(id, full_name, avatar_url, course, university)";

const PRIVATE_COLUMNS: &str = "*, \
    sender:profiles!private_messages_sender_id_fkey(id, full_name, avatar_url, course, university), \
    receiver:profiles!private_messages_receiver_id_fkey(id, full_name, avatar_url, course, university)";

#[derive(Clone)]
pub struct MessagingService {
    api: SupabaseClient,
}

impl MessagingService {
    pub fn new(api: SupabaseClient) -> Self {
        Self { api }
    }

    // ============ Ride-scoped chat ============

    /// Chat history of a ride, oldest first.
    pub async fn ride_messages(&self, ride_id: Uuid) -> AppResult<Vec<Message>> {
        self.api
            .from("messages")
            .select(MESSAGE_COLUMNS)
            .eq("ride_id", ride_id)
            .order("created_at", Order::Asc)
            .fetch()
            .await
    }

    pub async fn send_ride_message(&self, ride_id: Uuid, content: &str) -> AppResult<Message> {
        let content = non_empty(content)?;
        let sender_id = self.api.session.user_id().await?;
        let insert = MessageInsert {
            ride_id,
            sender_id,
            content,
        };
        self.api.from("messages").insert(&insert).await
    }

    /// One message with its sender embed, used to append an incoming realtime
    /// insert without refetching the whole history.
    pub async fn ride_message_by_id(&self, message_id: Uuid) -> AppResult<Message> {
        self.api
            .from("messages")
            .select(MESSAGE_COLUMNS)
            .eq("id", message_id)
            .single()
            .await
    }

    /// New-message feed for one ride's chat.
    pub async fn subscribe_ride_messages(&self, ride_id: Uuid) -> AppResult<Subscription> {
        self.api
            .channel(
                &format!("messages:{}", ride_id),
                vec![PostgresChange::inserts("messages")
                    .with_filter(format!("ride_id=eq.{}", ride_id))],
            )
            .await
    }

    // ============ Private chat ============

    /// Both directions of the conversation with another user, oldest first.
    pub async fn conversation(&self, other_user: Uuid) -> AppResult<Vec<PrivateMessage>> {
        let me = self.api.session.user_id().await?;
        self.api
            .from("private_messages")
            .select(PRIVATE_COLUMNS)
            .or(&conversation_filter(me, other_user))
            .order("created_at", Order::Asc)
            .fetch()
            .await
    }

    pub async fn send_private_message(
        &self,
        receiver: Uuid,
        ride_id: Option<Uuid>,
        content: &str,
    ) -> AppResult<PrivateMessage> {
        let content = non_empty(content)?;
        let sender_id = self.api.session.user_id().await?;
        let insert = PrivateMessageInsert {
            sender_id,
            receiver_id: receiver,
            ride_id,
            content,
        };
        self.api.from("private_messages").insert(&insert).await
    }

    pub async fn private_message_by_id(&self, message_id: Uuid) -> AppResult<PrivateMessage> {
        self.api
            .from("private_messages")
            .select(PRIVATE_COLUMNS)
            .eq("id", message_id)
            .single()
            .await
    }

    /// Feed of messages the other user sends to me.
    pub async fn subscribe_private_messages(&self, other_user: Uuid) -> AppResult<Subscription> {
        let me = self.api.session.user_id().await?;
        self.api
            .channel(
                &format!("private_chat:{}:{}", me, other_user),
                vec![PostgresChange::inserts("private_messages")
                    .with_filter(format!("sender_id=eq.{}", other_user))],
            )
            .await
    }

    /// Flip `read` on everything the other user sent me. Only the receiver
    /// may do this; the filter pins the receiver to the session user.
    pub async fn mark_conversation_read(&self, other_user: Uuid) -> AppResult<()> {
        let me = self.api.session.user_id().await?;
        self.api
            .from("private_messages")
            .eq("sender_id", other_user)
            .eq("receiver_id", me)
            .eq("read", false)
            .update(&json!({ "read": true }))
            .await
    }

    /// Unread private messages across all conversations.
    pub async fn unread_count(&self) -> AppResult<usize> {
        #[derive(Deserialize)]
        struct IdOnly {
            #[allow(dead_code)]
            id: Uuid,
        }

        let me = self.api.session.user_id().await?;
        let unread: Vec<IdOnly> = self
            .api
            .from("private_messages")
            .select("id")
            .eq("receiver_id", me)
            .eq("read", false)
            .fetch()
            .await?;
        Ok(unread.len())
    }

    /// Profile card shown in the chat header. Only public fields are read.
    pub async fn chat_partner(&self, user_id: Uuid) -> AppResult<PublicProfile> {
        self.api
            .from("profiles")
            .select(PublicProfile::COLUMNS)
            .eq("id", user_id)
            .single()
            .await
    }
}

fn non_empty(content: &str) -> AppResult<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest("Message cannot be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

fn conversation_filter(me: Uuid, other: Uuid) -> String {
    format!(
        "and(sender_id.eq.{me},receiver_id.eq.{other}),and(sender_id.eq.{other},receiver_id.eq.{me})"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_messages_are_rejected() {
        assert!(non_empty("   ").is_err());
        assert_eq!(non_empty("  oi ").unwrap(), "oi");
    }

    #[test]
    fn conversation_filter_covers_both_directions() {
        let me = Uuid::parse_str("11111111-1111-1111-1111-111111111111").unwrap();
        let other = Uuid::parse_str("22222222-2222-2222-2222-222222222222").unwrap();
        let filter = conversation_filter(me, other);
        assert_eq!(
            filter,
            "and(sender_id.eq.11111111-1111-1111-1111-111111111111,receiver_id.eq.22222222-2222-2222-2222-222222222222),\
             and(sender_id.eq.22222222-2222-2222-2222-222222222222,receiver_id.eq.11111111-1111-1111-1111-111111111111)"
        );
    }
}
