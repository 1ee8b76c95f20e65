use std::collections::HashMap;

use serde_json::Value;

/// Built-in YouTube category names, used when the `videoCategories` call fails
/// and to fill ids the region listing leaves out.
pub const CATEGORY_NAMES: &[(&str, &str)] = &[
    ("1", "Film & Animation"),
    ("2", "Autos & Vehicles"),
    ("10", "Music"),
    ("15", "Pets & Animals"),
    ("17", "Sports"),
    ("18", "Short Movies"),
    ("19", "Travel & Events"),
    ("20", "Gaming"),
    ("21", "Videoblogging"),
    ("22", "People & Blogs"),
    ("23", "Comedy"),
    ("24", "Entertainment"),
    ("25", "News & Politics"),
    ("26", "Howto & Style"),
    ("27", "Education"),
    ("28", "Science & Technology"),
    ("29", "Nonprofits & Activism"),
    ("30", "Movies"),
    ("31", "Anime/Animation"),
    ("32", "Action/Adventure"),
    ("33", "Classics"),
    ("34", "Comedy"),
    ("35", "Documentary"),
    ("36", "Drama"),
    ("37", "Family"),
    ("38", "Foreign"),
    ("39", "Horror"),
    ("40", "Sci-Fi/Fantasy"),
    ("41", "Thriller"),
    ("42", "Shorts"),
    ("43", "Shows"),
    ("44", "Trailers"),
];

pub fn default_category_names() -> HashMap<String, String> {
    CATEGORY_NAMES
        .iter()
        .map(|(id, name)| (id.to_string(), name.to_string()))
        .collect()
}

/// Merge a `videoCategories` response over the built-in table. Region titles win.
pub fn merge_category_response(body: &Value) -> HashMap<String, String> {
    let mut names = default_category_names();
    let items = body.get("items").and_then(|i| i.as_array());
    for item in items.into_iter().flatten() {
        let Some(id) = item.get("id").and_then(|i| i.as_str()).filter(|i| !i.is_empty()) else {
            continue;
        };
        let title = item
            .get("snippet")
            .and_then(|s| s.get("title"))
            .and_then(|t| t.as_str())
            .map(|t| t.to_string())
            .unwrap_or_else(|| format!("Category {id}"));
        names.insert(id.to_string(), title);
    }
    names
}
