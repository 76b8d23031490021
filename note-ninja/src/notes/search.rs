use super::Note;

/// Notes whose title or description contains `query`, ignoring case. Order is preserved.
pub fn filter_notes<'a>(notes: &'a [Note], query: &str) -> Vec<&'a Note> {
    let query = query.to_lowercase();

    notes
        .iter()
        .filter(|note| {
            query.is_empty()
                || note.title.to_lowercase().contains(&query)
                || note.description.to_lowercase().contains(&query)
        })
        .collect()
}
