/// Rich text (HTML) body of a post, trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostContent(String);

impl PostContent {
    pub fn parse(content: &str) -> Result<PostContent, String> {
        let content = content.trim();

        if content.is_empty() {
            return Err(String::from("Title and content are required"));
        }

        Ok(Self(content.to_string()))
    }
}

impl AsRef<str> for PostContent {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
