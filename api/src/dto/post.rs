use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use cn_core::domain::entities::post::{MediaRef, MAX_MEDIA_PER_POST};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaDto {
    pub url: String,
    /// `image` or `video`
    #[serde(rename = "type")]
    pub media_type: String,
}

impl From<MediaDto> for MediaRef {
    fn from(media: MediaDto) -> Self {
        Self {
            url: media.url,
            media_type: media.media_type,
        }
    }
}

fn validate_media(media: &[MediaDto]) -> Result<(), ValidationError> {
    if media.len() > MAX_MEDIA_PER_POST {
        let mut error = ValidationError::new("media_count");
        error.message = Some(format!("A post can carry at most {} media items", MAX_MEDIA_PER_POST).into());
        return Err(error);
    }

    for item in media {
        if item.url.trim().is_empty() {
            let mut error = ValidationError::new("media_url");
            error.message = Some("Media url is required".into());
            return Err(error);
        }
        if !matches!(item.media_type.as_str(), "image" | "video") {
            let mut error = ValidationError::new("media_type");
            error.message = Some("Media type must be image or video".into());
            return Err(error);
        }
    }
    Ok(())
}

/// Body of `POST /api/posts`
///
/// Blank text is rejected by the post service after trimming.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(length(max = 5000, message = "Post text is too long"))]
    pub text: String,

    #[serde(default)]
    #[validate(custom = "validate_media")]
    pub media: Vec<MediaDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdatePostRequest {
    #[validate(length(max = 5000, message = "Post text is too long"))]
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CommentRequest {
    #[validate(length(max = 1000, message = "Comment is too long"))]
    pub text: String,
}

/// Likes after a toggle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeResponse {
    pub post_id: Uuid,
    pub likes: Vec<Uuid>,
}
