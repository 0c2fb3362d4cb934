use crate::crawler::{EntryOutcome, RunSummary};
use crate::state::EntryState;
use crate::storage::SearchHit;

/// Formats the report line for an entry that did not reach `Indexed`
///
/// Returns `None` for indexed entries, which are only counted.
///
/// ```text
/// skipped 000879/92 "蜘蛛の糸": no archive link on detail page
/// failed 000879/127 "羅生門": archive: No .txt member found in archive
/// ```
pub fn format_outcome_line(outcome: &EntryOutcome) -> Option<String> {
    let label = match outcome.state {
        EntryState::SkippedNoZip => "skipped",
        EntryState::Failed => "failed",
        _ => return None,
    };

    Some(format!(
        "{} {} \"{}\": {}",
        label,
        outcome.entry.key(),
        outcome.entry.title,
        outcome.reason.as_deref().unwrap_or("unknown")
    ))
}

/// Formats the one-line run summary
pub fn format_summary_line(summary: &RunSummary) -> String {
    format!(
        "discovered {}, indexed {}, skipped {}, failed {}",
        summary.discovered,
        summary.indexed(),
        summary.skipped(),
        summary.failed()
    )
}

/// Prints the run report to stdout
///
/// Skipped and failed entries are listed in key order, followed by the
/// summary line.
pub fn print_run_summary(summary: &RunSummary) {
    let mut unsuccessful: Vec<&EntryOutcome> = summary
        .outcomes
        .iter()
        .filter(|o| !o.state.is_success())
        .collect();
    unsuccessful.sort_by(|a, b| {
        (&a.entry.author_id, &a.entry.title_id).cmp(&(&b.entry.author_id, &b.entry.title_id))
    });

    for outcome in unsuccessful {
        if let Some(line) = format_outcome_line(outcome) {
            println!("{}", line);
        }
    }

    if summary.interrupted {
        println!(
            "interrupted: {} entries not dispatched",
            summary.not_dispatched
        );
    }
    println!("{}", format_summary_line(summary));
}

/// Prints search hits as `author<TAB>title`, one per line
pub fn print_search_hits(hits: &[SearchHit]) {
    for hit in hits {
        println!("{}\t{}", hit.author, hit.title);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Entry;
    use crate::url::CardId;
    use std::time::Duration;

    fn outcome(title_id: &str, state: EntryState, reason: Option<&str>) -> EntryOutcome {
        EntryOutcome {
            entry: Entry::discovered(
                CardId {
                    author_id: "000879".to_string(),
                    title_id: title_id.to_string(),
                },
                "蜘蛛の糸",
                "https://www.aozora.gr.jp/index_pages/person879.html",
                format!("https://www.aozora.gr.jp/cards/000879/card{}.html", title_id),
            ),
            state,
            reason: reason.map(str::to_string),
            document_id: None,
        }
    }

    #[test]
    fn test_skipped_line() {
        let line = format_outcome_line(&outcome(
            "92",
            EntryState::SkippedNoZip,
            Some("no archive link on detail page"),
        ));
        assert_eq!(
            line.as_deref(),
            Some("skipped 000879/92 \"蜘蛛の糸\": no archive link on detail page")
        );
    }

    #[test]
    fn test_indexed_has_no_line() {
        assert_eq!(format_outcome_line(&outcome("92", EntryState::Indexed, None)), None);
    }

    #[test]
    fn test_summary_line() {
        let summary = RunSummary {
            run_id: 1,
            discovered: 3,
            not_dispatched: 0,
            interrupted: false,
            elapsed: Duration::from_millis(10),
            outcomes: vec![
                outcome("1", EntryState::Indexed, None),
                outcome("2", EntryState::SkippedNoZip, Some("no archive link on detail page")),
                outcome("3", EntryState::Indexed, None),
            ],
        };

        assert_eq!(
            format_summary_line(&summary),
            "discovered 3, indexed 2, skipped 1, failed 0"
        );
    }
}
