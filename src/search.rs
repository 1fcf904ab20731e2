use crate::models::Snippet;

/// Case-insensitive name filter used by the list views.
/// An empty (or whitespace-only) query keeps every snippet.
pub fn filter_by_name<'a>(snippets: &'a [Snippet], query: &str) -> Vec<&'a Snippet> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return snippets.iter().collect();
    }

    snippets
        .iter()
        .filter(|s| s.name.to_lowercase().contains(&query))
        .collect()
}

/// Whether a filter is narrowing the view. Reordering is refused while this holds,
/// since positions in a partial view do not map onto the full collection.
pub fn is_filtering(query: &str) -> bool {
    !query.trim().is_empty()
}

/// Resolves a user-supplied reference: exact id first, then exact name
/// (case-insensitive), then the first partial name match.
pub fn find_snippet<'a>(snippets: &'a [Snippet], id_or_name: &str) -> Option<&'a Snippet> {
    if let Some(snippet) = snippets.iter().find(|s| s.id == id_or_name) {
        return Some(snippet);
    }

    let name = id_or_name.to_lowercase();
    snippets
        .iter()
        .find(|s| s.name.to_lowercase() == name)
        .or_else(|| snippets.iter().find(|s| s.name.to_lowercase().contains(&name)))
}
