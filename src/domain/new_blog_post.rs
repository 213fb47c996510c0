use serde::Deserialize;
use serde_json::Value;

use crate::domain::post_content::PostContent;
use crate::domain::post_tags::PostTags;
use crate::domain::post_title::PostTitle;
use crate::domain::slug::Slug;

/// Body of `POST /admin/blogs`. Every field is optional at this layer so that
/// authentication runs before validation reports missing fields.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBlogPostBody {
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Value>,
    pub featured_image: Option<String>,
}

/// A validated draft, ready to be persisted.
#[derive(Debug, Clone)]
pub struct NewBlogPost {
    pub title: PostTitle,
    pub slug: Slug,
    pub excerpt: Option<String>,
    pub content: PostContent,
    pub featured_image: Option<String>,
    pub category: Option<String>,
    pub tags: PostTags,
}

impl TryFrom<NewBlogPostBody> for NewBlogPost {
    type Error = String;

    fn try_from(body: NewBlogPostBody) -> Result<Self, Self::Error> {
        let title = PostTitle::parse(body.title.as_deref().unwrap_or_default())?;
        let content = PostContent::parse(body.content.as_deref().unwrap_or_default())?;
        let slug = Slug::from_title(title.as_ref())?;

        Ok(NewBlogPost {
            slug,
            title,
            content,
            excerpt: trimmed(body.excerpt),
            category: trimmed(body.category),
            tags: PostTags::from_value(body.tags.as_ref()),
            featured_image: body.featured_image,
        })
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
