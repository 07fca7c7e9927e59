//! Text composition for embedding generation.

/// Combine note title, content and tag names into the text that gets embedded.
///
/// Format: `"{title} {content} {tag tag ...}"`. The trailing tag segment is
/// empty for untagged notes, leaving a single trailing space.
pub fn compose_embedding_text<S: AsRef<str>>(title: &str, content: &str, tags: &[S]) -> String {
    let tag_text = tags
        .iter()
        .map(|t| t.as_ref())
        .collect::<Vec<_>>()
        .join(" ");
    format!("{} {} {}", title, content, tag_text)
}
