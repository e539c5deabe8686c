use serde::{Deserialize, Serialize};

use super::shared::{double_option, validate_max_len, validate_name};
use crate::entity::category;
use crate::error::AppError;

pub const NAME_MAX: usize = 100;
pub const DESCRIPTION_MAX: usize = 10_000;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateCategoryRequest {
    #[schema(example = "Education")]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    /// `null` clears the description.
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CategoryResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Education")]
    pub name: String,
    pub description: Option<String>,
    /// Storage path of the icon, if one was uploaded.
    #[schema(example = "category/1/category_icon/logo.png")]
    pub icon: Option<String>,
}

impl From<category::Model> for CategoryResponse {
    fn from(m: category::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
            icon: m.icon,
        }
    }
}

pub fn validate_create_category(req: &CreateCategoryRequest) -> Result<(), AppError> {
    validate_name("Name", &req.name, NAME_MAX)?;
    validate_max_len("Description", req.description.as_deref(), DESCRIPTION_MAX)
}

pub fn validate_update_category(req: &UpdateCategoryRequest) -> Result<(), AppError> {
    if let Some(ref name) = req.name {
        validate_name("Name", name, NAME_MAX)?;
    }
    if let Some(ref description) = req.description {
        validate_max_len("Description", description.as_deref(), DESCRIPTION_MAX)?;
    }
    Ok(())
}
