use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use verifai_common::types::ChatMessage;

use crate::entities::chat_message::{self, Column, Entity};
use crate::error::{parse_column, Result};
use crate::store::VerifaiStore;

fn model_to_message(m: chat_message::Model) -> Result<ChatMessage> {
    Ok(ChatMessage {
        role: parse_column("role", &m.role)?,
        id: m.id,
        verification_id: m.verification_id,
        content: m.content,
        timestamp: m.created_at.with_timezone(&Utc),
    })
}

impl VerifaiStore {
    pub async fn insert_chat_message(&self, msg: &ChatMessage) -> Result<()> {
        let am = chat_message::ActiveModel {
            id: Set(msg.id.clone()),
            verification_id: Set(msg.verification_id.clone()),
            role: Set(msg.role.as_str().to_string()),
            content: Set(msg.content.clone()),
            created_at: Set(msg.timestamp.fixed_offset()),
        };
        am.insert(self.db()).await?;
        Ok(())
    }

    /// Conversation for one verification, oldest first.
    pub async fn list_chat_messages(&self, verification_id: &str) -> Result<Vec<ChatMessage>> {
        let rows = Entity::find()
            .filter(Column::VerificationId.eq(verification_id))
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::Id)
            .all(self.db())
            .await?;
        rows.into_iter().map(model_to_message).collect()
    }
}
