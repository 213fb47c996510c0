use serde_json::Value;

/// Ordered tags of a post.
///
/// Clients send either a comma separated string or a JSON array of strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostTags(Vec<String>);

impl PostTags {
    /// A string is split on commas, each piece trimmed and blank pieces
    /// dropped. An array made only of strings is kept as it is. Anything else
    /// yields no tags.
    pub fn from_value(value: Option<&Value>) -> PostTags {
        match value {
            Some(Value::String(tags)) => Self(
                tags.split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .map(String::from)
                    .collect(),
            ),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| item.as_str().map(String::from))
                .collect::<Option<Vec<_>>>()
                .map(Self)
                .unwrap_or_default(),
            _ => Self::default(),
        }
    }
}

impl AsRef<[String]> for PostTags {
    fn as_ref(&self) -> &[String] {
        &self.0
    }
}
