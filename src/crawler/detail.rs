//! Detail page resolution
//!
//! A work's detail page carries the author's display name in the author data
//! table and the archive download link in the download table.

use super::fetcher::Fetcher;
use crate::state::Entry;
use crate::url::{has_scheme, resolve};
use crate::CollectorError;
use scraper::{ElementRef, Html, Selector};

/// Header cell text of the author name row
const AUTHOR_NAME_HEADER: &str = "作家名";

/// Fields extracted from a detail page, before URL resolution
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DetailPage {
    /// Author display name, empty when the page has no author data table
    pub author: String,

    /// Raw href of the archive link, if any
    pub zip_href: Option<String>,
}

/// Extracts the author name and archive link from detail page HTML
///
/// The author comes from the first author data table: the row headed
/// `作家名` when present, otherwise the second cell of the first row.
/// Of all anchors inside `.download` elements whose href ends in `zip`,
/// the last one in document order wins.
pub fn parse_detail(html: &str) -> DetailPage {
    let document = Html::parse_document(html);

    DetailPage {
        author: extract_author(&document),
        zip_href: extract_zip_href(&document),
    }
}

fn extract_author(document: &Html) -> String {
    let (Ok(table_selector), Ok(row_selector), Ok(cell_selector)) = (
        Selector::parse(r#"table[summary="作家データ"]"#),
        Selector::parse("tr"),
        Selector::parse("td"),
    ) else {
        return String::new();
    };

    let Some(table) = document.select(&table_selector).next() else {
        return String::new();
    };

    let second_cell = |row: ElementRef| -> Option<String> {
        row.select(&cell_selector)
            .nth(1)
            .map(|cell| cell.text().collect::<String>().trim().to_string())
    };

    let named_row = table.select(&row_selector).find(|row| {
        row.select(&cell_selector)
            .next()
            .map(|header| header.text().collect::<String>().contains(AUTHOR_NAME_HEADER))
            .unwrap_or(false)
    });

    named_row
        .or_else(|| table.select(&row_selector).next())
        .and_then(second_cell)
        .unwrap_or_default()
}

fn extract_zip_href(document: &Html) -> Option<String> {
    let selector = Selector::parse(".download a").ok()?;

    document
        .select(&selector)
        .filter_map(|anchor| anchor.value().attr("href"))
        .map(str::trim)
        .filter(|href| href.ends_with("zip"))
        .last()
        .map(str::to_string)
}

/// Turns a raw archive href into an absolute URL
///
/// An href that already has a scheme is used verbatim. A resolution
/// failure yields `None`, which the driver treats as "no archive".
pub fn resolve_zip_url(detail_url: &str, href: &str) -> Option<String> {
    if has_scheme(href) {
        return Some(href.to_string());
    }

    match resolve(detail_url, href) {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::debug!("Could not resolve archive link {} on {}: {}", href, detail_url, e);
            None
        }
    }
}

/// Fetches an entry's detail page and fills in `author` and `zip_url`
///
/// A page without an archive link is not an error: the entry comes back
/// with `zip_url` unset.
pub async fn resolve_detail(fetcher: &Fetcher, entry: &mut Entry) -> Result<(), CollectorError> {
    let page = fetcher.fetch_page(&entry.detail_url).await?;
    let detail = parse_detail(&page.body);

    entry.author = detail.author;
    entry.zip_url = detail
        .zip_href
        .and_then(|href| resolve_zip_url(&entry.detail_url, &href));

    Ok(())
}
