use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Set};

use crate::entity::channel;
use crate::error::AppError;

/// Desired state of a channel. `id: None` creates a new row.
#[derive(Debug, Clone)]
pub struct ChannelDraft {
    pub id: Option<i32>,
    pub name: String,
    pub topic: String,
    pub owner_id: i32,
    pub server_id: i32,
}

impl From<channel::Model> for ChannelDraft {
    fn from(m: channel::Model) -> Self {
        Self {
            id: Some(m.id),
            name: m.name,
            topic: m.topic,
            owner_id: m.owner_id,
            server_id: m.server_id,
        }
    }
}

pub struct ChannelService<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> ChannelService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    pub async fn find(&self, id: i32) -> Result<channel::Model, AppError> {
        channel::Entity::find_by_id(id)
            .one(self.conn)
            .await?
            .ok_or_else(|| AppError::NotFound("Channel not found".into()))
    }

    /// Insert or update a channel. The name is lowercased on every save.
    pub async fn save(&self, draft: ChannelDraft) -> Result<channel::Model, AppError> {
        let name = draft.name.to_lowercase();

        let Some(id) = draft.id else {
            let model = channel::ActiveModel {
                name: Set(name),
                topic: Set(draft.topic),
                owner_id: Set(draft.owner_id),
                server_id: Set(draft.server_id),
                created_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(self.conn)
            .await?;
            return Ok(model);
        };

        let mut active: channel::ActiveModel = self.find(id).await?.into();
        active.name = Set(name);
        active.topic = Set(draft.topic);
        active.owner_id = Set(draft.owner_id);
        active.server_id = Set(draft.server_id);
        Ok(active.update(self.conn).await?)
    }
}
