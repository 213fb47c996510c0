/// Derives the URL slug of a post from its title.
///
/// The title is lower-cased, every maximal run of characters outside
/// `[a-z0-9]` becomes a single `-`, and a leading or trailing `-` is removed.
/// Non-ASCII characters are separators: there is no transliteration, so
/// `"日本語 Post"` becomes `"post"`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// A non-empty slug. Unique across posts, enforced by the post store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slug(String);

impl Slug {
    pub fn from_title(title: &str) -> Result<Slug, String> {
        let slug = slugify(title);

        if slug.is_empty() {
            return Err(format!(
                "{} must contain at least one ASCII letter or digit",
                title
            ));
        }

        Ok(Self(slug))
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Slug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
