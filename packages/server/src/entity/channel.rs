use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "channel")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Always stored lowercase; see `services::channel::ChannelService::save`.
    pub name: String,
    pub topic: String,

    pub owner_id: i32,
    #[sea_orm(belongs_to, from = "owner_id", to = "id", on_delete = "Cascade")]
    pub owner: HasOne<super::user::Entity>,

    pub server_id: i32,
    #[sea_orm(belongs_to, from = "server_id", to = "id", on_delete = "Cascade")]
    pub server: HasOne<super::server::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
