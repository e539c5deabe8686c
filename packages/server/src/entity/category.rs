use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Grouping for servers, with an optional icon file.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "category")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: Option<String>,

    /// Storage path of the icon file, `category/<id>/category_icon/<filename>`.
    pub icon: Option<String>,
}

impl ActiveModelBehavior for ActiveModel {}
