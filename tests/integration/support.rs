use aozora_collector::config::{CollectorConfig, Config, OutputConfig, UserAgentConfig};
use aozora_collector::Segmenter;
use encoding_rs::SHIFT_JIS;
use std::io::{Cursor, Write};
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Splits on whitespace so tests control the indexed tokens exactly
pub struct WhitespaceSegmenter;

impl Segmenter for WhitespaceSegmenter {
    fn segment(&self, text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }
}

pub const LISTING_PATH: &str = "/index_pages/person1.html";

/// Creates a test configuration pointing at the mock listing page
pub fn create_test_config(server: &MockServer, db_path: &Path, workers: u32) -> Config {
    Config {
        collector: CollectorConfig {
            max_concurrent_entries: workers,
            request_timeout_secs: 5,
            connect_timeout_secs: 5,
            max_retries: 0,
            retry_delay_ms: 1,
            ..CollectorConfig::with_listing_url(format!("{}{}", server.uri(), LISTING_PATH))
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestCollector".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            database_path: db_path.to_string_lossy().into_owned(),
        },
    }
}

/// Builds an archive holding `text` as a Shift_JIS `.txt` member
pub fn shift_jis_zip(text: &str) -> Vec<u8> {
    let (encoded, _, had_errors) = SHIFT_JIS.encode(text);
    assert!(!had_errors, "test text must be representable in Shift_JIS");

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("meta.xml", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(b"<meta/>").unwrap();
    writer
        .start_file("work.txt", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(&encoded).unwrap();
    writer.finish().unwrap().into_inner()
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=utf-8")
}

/// Serves a listing page with one ordered-list anchor per `(title_id, title)`
pub async fn mount_listing(server: &MockServer, author_id: &str, works: &[(&str, &str)]) {
    let items: String = works
        .iter()
        .map(|(title_id, title)| {
            format!(
                r#"<li><a href="../cards/{}/card{}.html">{}</a></li>"#,
                author_id, title_id, title
            )
        })
        .collect();
    let body = format!(
        r#"<html><body>
        <h1>作家別作品リスト</h1>
        <p><a href="../index.html">トップ</a></p>
        <ol>{}</ol>
        </body></html>"#,
        items
    );

    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .respond_with(html(body))
        .mount(server)
        .await;
}

/// Serves a detail page; `zip` of `None` leaves out the download table
pub async fn mount_detail(
    server: &MockServer,
    author_id: &str,
    title_id: &str,
    author: &str,
    zip: Option<&str>,
) {
    let downloads = zip
        .map(|href| {
            format!(
                r#"<table class="download"><tr><td><a href="{}">archive</a></td></tr></table>"#,
                href
            )
        })
        .unwrap_or_default();
    let body = format!(
        r#"<html><body>
        <table summary="作家データ">
          <tr><td class="header">分類：</td><td>著者</td></tr>
          <tr><td class="header">作家名：</td><td>{}</td></tr>
        </table>
        {}
        </body></html>"#,
        author, downloads
    );

    Mock::given(method("GET"))
        .and(path(format!("/cards/{}/card{}.html", author_id, title_id)))
        .respond_with(html(body))
        .mount(server)
        .await;
}

/// Serves a Shift_JIS archive at `/cards/<author_id>/files/<title_id>.zip`
pub async fn mount_archive(server: &MockServer, author_id: &str, title_id: &str, text: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/cards/{}/files/{}.zip", author_id, title_id)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(shift_jis_zip(text)))
        .mount(server)
        .await;
}
