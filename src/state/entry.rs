use crate::url::CardId;

/// One discovered work
///
/// Created by discovery with `author` empty and `zip_url` unset, then filled
/// in by the detail resolver. Never retained across runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Stable site identifier of the author
    pub author_id: String,

    /// Stable identifier of the work
    pub title_id: String,

    /// Display title, taken from the listing anchor text
    pub title: String,

    /// Listing page the entry was discovered on
    pub listing_url: String,

    /// Detail page of the work
    pub detail_url: String,

    /// Absolute archive URL, once resolved
    pub zip_url: Option<String>,

    /// Author display name, empty until resolved (or if the page has none)
    pub author: String,
}

impl Entry {
    /// Creates a freshly discovered entry
    pub fn discovered(
        card: CardId,
        title: impl Into<String>,
        listing_url: impl Into<String>,
        detail_url: impl Into<String>,
    ) -> Self {
        Self {
            author_id: card.author_id,
            title_id: card.title_id,
            title: title.into(),
            listing_url: listing_url.into(),
            detail_url: detail_url.into(),
            zip_url: None,
            author: String::new(),
        }
    }

    /// Short `authorId/titleId` label used in logs and reports
    pub fn key(&self) -> String {
        format!("{}/{}", self.author_id, self.title_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovered_entry_is_unresolved() {
        let entry = Entry::discovered(
            CardId {
                author_id: "000879".to_string(),
                title_id: "92".to_string(),
            },
            "蜘蛛の糸",
            "https://www.aozora.gr.jp/index_pages/person879.html",
            "https://www.aozora.gr.jp/cards/000879/card92.html",
        );

        assert_eq!(entry.key(), "000879/92");
        assert!(entry.zip_url.is_none());
        assert!(entry.author.is_empty());
    }
}
