//! Entry discovery from an author listing page
//!
//! The listing page carries an ordered list of anchors, one per work. Only
//! anchors whose href is a work page link (`.../cards/<a>/card<t>.html`)
//! become entries; everything else on the page is ignored.

use super::fetcher::Fetcher;
use crate::state::Entry;
use crate::url::{detail_url, match_card_url};
use crate::CollectorError;
use scraper::{Html, Selector};

/// Extracts entries from listing page HTML
///
/// # Arguments
///
/// * `html` - The listing page body
/// * `listing_url` - The URL the listing was fetched from; detail pages are
///   built on its host
///
/// # Returns
///
/// Entries in document order. Anchors without an href, with a non-work
/// href, or whose detail URL cannot be built are skipped.
///
/// # Example
///
/// ```
/// use aozora_collector::crawler::parse_listing;
///
/// let html = r#"<ol><li><a href="../cards/000879/card92.html">蜘蛛の糸</a></li></ol>"#;
/// let entries = parse_listing(html, "https://www.aozora.gr.jp/index_pages/person879.html");
/// assert_eq!(entries.len(), 1);
/// assert_eq!(entries[0].detail_url, "https://www.aozora.gr.jp/cards/000879/card92.html");
/// ```
pub fn parse_listing(html: &str, listing_url: &str) -> Vec<Entry> {
    let document = Html::parse_document(html);
    let mut entries = Vec::new();

    let Ok(anchor_selector) = Selector::parse("ol li a") else {
        return entries;
    };

    for anchor in document.select(&anchor_selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Some(card) = match_card_url(href.trim()) else {
            continue;
        };

        let detail = match detail_url(listing_url, &card) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!("Skipping listing anchor {}: {}", href, e);
                continue;
            }
        };

        let title = anchor.text().collect::<String>().trim().to_string();
        entries.push(Entry::discovered(card, title, listing_url, detail));
    }

    entries
}

/// Fetches the listing page and discovers its entries
///
/// A listing that cannot be fetched is fatal to the run; the error is
/// returned unchanged.
pub async fn discover(fetcher: &Fetcher, listing_url: &str) -> Result<Vec<Entry>, CollectorError> {
    let page = fetcher.fetch_page(listing_url).await?;
    let entries = parse_listing(&page.body, listing_url);

    tracing::info!("Discovered {} entries on {}", entries.len(), listing_url);
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING_URL: &str = "https://www.aozora.gr.jp/index_pages/person879.html";

    #[test]
    fn test_parse_listing_in_document_order() {
        let html = r#"
            <html><body>
            <h2>公開中の作品</h2>
            <ol>
              <li><a href="../cards/000879/card92.html">蜘蛛の糸</a>　（新字新仮名、作品ID：92）</li>
              <li><a href="../cards/000879/card127.html"> 羅生門 </a></li>
              <li><a href="../cards/000879/card42.html">鼻</a></li>
            </ol>
            </body></html>
        "#;

        let entries = parse_listing(html, LISTING_URL);

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].title, "蜘蛛の糸");
        assert_eq!(entries[0].author_id, "000879");
        assert_eq!(entries[0].title_id, "92");
        assert_eq!(entries[1].title, "羅生門");
        assert_eq!(entries[2].title_id, "42");
        assert_eq!(
            entries[1].detail_url,
            "https://www.aozora.gr.jp/cards/000879/card127.html"
        );
        assert!(entries.iter().all(|e| e.listing_url == LISTING_URL));
    }

    #[test]
    fn test_parse_listing_skips_non_work_links() {
        let html = r#"
            <ol>
              <li><a href="../index_pages/person879.html#sakuhin_list_1">作品一覧</a></li>
              <li><a>リンクなし</a></li>
              <li><a href="../cards/000879/card92.html">蜘蛛の糸</a></li>
              <li><a href="../cards/000879/files/92_ruby_164.zip">zip</a></li>
            </ol>
            <ul><li><a href="../cards/000879/card1.html">リスト外</a></li></ul>
        "#;

        let entries = parse_listing(html, LISTING_URL);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key(), "000879/92");
    }

    #[test]
    fn test_parse_listing_uses_listing_host() {
        let html = r#"<ol><li><a href="https://mirror.example.org/cards/1/card2.html">作品</a></li></ol>"#;

        let entries = parse_listing(html, "http://127.0.0.1:8080/index_pages/person1.html");

        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].detail_url,
            "http://127.0.0.1:8080/cards/1/card2.html"
        );
    }

    #[test]
    fn test_parse_empty_listing() {
        assert!(parse_listing("<html><body></body></html>", LISTING_URL).is_empty());
    }
}
