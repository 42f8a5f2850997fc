/// One titled segment returned by the text generator.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PlaylistItem {
    pub title: String,
    pub text: String,
}

impl PlaylistItem {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
        }
    }
}

/// Joins playlist items into a single long-form script.
///
/// Each item becomes `### TITLE ###`, a blank line, then its text. Items are
/// separated by a `***` rule, both of which sanitize away before synthesis.
pub fn compose_playlist_script(items: &[PlaylistItem]) -> String {
    items
        .iter()
        .map(|item| format!("### {} ###\n\n{}", item.title.to_uppercase(), item.text))
        .collect::<Vec<_>>()
        .join("\n\n***\n\n")
}
