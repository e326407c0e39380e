use serde::{Deserialize, Serialize};
use validator::Validate;

use cn_core::services::ProfileChanges;

/// Body of `PUT /api/users/me`; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email"))]
    pub email: Option<String>,

    #[validate(length(max = 500, message = "Bio is too long"))]
    pub bio: Option<String>,

    #[validate(length(max = 100, message = "Profession is too long"))]
    pub profession: Option<String>,

    #[validate(url(message = "Invalid avatar url"))]
    pub avatar_url: Option<String>,

    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

impl From<UpdateProfileRequest> for ProfileChanges {
    fn from(request: UpdateProfileRequest) -> Self {
        Self {
            name: request.name,
            email: request.email,
            bio: request.bio,
            profession: request.profession,
            avatar_url: request.avatar_url,
            current_password: request.current_password,
            new_password: request.new_password,
        }
    }
}
