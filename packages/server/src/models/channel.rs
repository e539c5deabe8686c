use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::{validate_max_len, validate_name};
use crate::entity::channel;
use crate::error::AppError;

pub const NAME_MAX: usize = 100;
pub const TOPIC_MAX: usize = 100;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateChannelRequest {
    /// Stored lowercase.
    #[schema(example = "General")]
    pub name: String,
    #[schema(example = "Anything goes")]
    pub topic: String,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateChannelRequest {
    pub name: Option<String>,
    pub topic: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ChannelResponse {
    pub id: i32,
    #[schema(example = "general")]
    pub name: String,
    pub topic: String,
    pub owner_id: i32,
    pub server_id: i32,
    pub created_at: DateTime<Utc>,
}

impl From<channel::Model> for ChannelResponse {
    fn from(m: channel::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            topic: m.topic,
            owner_id: m.owner_id,
            server_id: m.server_id,
            created_at: m.created_at,
        }
    }
}

pub fn validate_create_channel(req: &CreateChannelRequest) -> Result<(), AppError> {
    validate_name("Name", &req.name, NAME_MAX)?;
    validate_max_len("Topic", Some(&req.topic), TOPIC_MAX)
}

pub fn validate_update_channel(req: &UpdateChannelRequest) -> Result<(), AppError> {
    if let Some(ref name) = req.name {
        validate_name("Name", name, NAME_MAX)?;
    }
    validate_max_len("Topic", req.topic.as_deref(), TOPIC_MAX)
}
