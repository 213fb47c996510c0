use unicode_segmentation::UnicodeSegmentation;

const MAX_GRAPHEME_LENGTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostTitle(String);

impl PostTitle {
    pub fn parse(title: &str) -> Result<PostTitle, String> {
        let title = title.trim();

        if title.is_empty() {
            return Err(String::from("Title and content are required"));
        }

        if title.graphemes(true).count() > MAX_GRAPHEME_LENGTH {
            return Err(format!(
                "Title must be at most {} characters long",
                MAX_GRAPHEME_LENGTH
            ));
        }

        Ok(Self(title.to_string()))
    }
}

impl AsRef<str> for PostTitle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
