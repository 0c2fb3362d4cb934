use crate::{UrlError, UrlResult};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Matches a work page link, capturing the author id and the title id
static CARD_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^.*/cards/([0-9]+)/card([0-9]+)\.html$").expect("card pattern is valid")
});

/// Identifiers extracted from a work page URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardId {
    pub author_id: String,
    pub title_id: String,
}

/// Matches `href` against `.../cards/<digits>/card<digits>.html`
///
/// The whole string must match; anything else returns `None`.
pub fn match_card_url(href: &str) -> Option<CardId> {
    let captures = CARD_PATTERN.captures(href)?;
    Some(CardId {
        author_id: captures.get(1)?.as_str().to_string(),
        title_id: captures.get(2)?.as_str().to_string(),
    })
}

/// Builds the detail page URL for a work on the listing page's host
///
/// ```
/// use aozora_collector::url::{detail_url, CardId};
///
/// let card = CardId { author_id: "000879".into(), title_id: "92".into() };
/// let url = detail_url("https://www.aozora.gr.jp/index_pages/person879.html", &card).unwrap();
/// assert_eq!(url, "https://www.aozora.gr.jp/cards/000879/card92.html");
/// ```
pub fn detail_url(listing_url: &str, card: &CardId) -> UrlResult<String> {
    let listing =
        Url::parse(listing_url).map_err(|e| UrlError::Parse(format!("{}: {}", listing_url, e)))?;
    if listing.host_str().is_none() {
        return Err(UrlError::MissingHost(listing_url.to_string()));
    }

    let path = format!("/cards/{}/card{}.html", card.author_id, card.title_id);
    listing
        .join(&path)
        .map(|u| u.to_string())
        .map_err(|e| UrlError::Parse(format!("{}: {}", path, e)))
}
