use callboard_core::format::format_duration;
use callboard_core::{Call, PageRange};
use chrono::{DateTime, Utc};

/// One line per call: id, type, direction, parties, duration, date.
pub fn call_row(call: &Call) -> String {
    let mut row = format!(
        "{:<14} {:<10} {:<9} {} -> {} via {}  {}  {}",
        call.id,
        call.call_type.as_str(),
        call.direction.label(),
        call.from,
        call.to,
        call.via,
        format_duration(call.duration),
        call.created_date(),
    );
    if call.is_archived {
        row.push_str("  [archived]");
    }
    let notes = call.notes.iter().filter(|n| !n.content.trim().is_empty()).count();
    if notes > 0 {
        row.push_str(&format!("  ({notes} note{})", if notes == 1 { "" } else { "s" }));
    }
    row
}

pub fn note_lines(call: &Call, now: DateTime<Utc>) -> Vec<String> {
    call.display_notes(now)
        .into_iter()
        .map(|n| format!("    - {}  {}", n.created_at, n.content))
        .collect()
}

/// Footer under a page of calls, e.g. `11–20 of 42 (page 2 of 5)`.
pub fn page_footer(range: PageRange, page: u32, total_pages: u64) -> String {
    format!("{range} (page {page} of {total_pages})")
}

pub fn print_calls(calls: &[Call], with_notes: bool, now: DateTime<Utc>) {
    if calls.is_empty() {
        println!("No calls.");
        return;
    }
    for call in calls {
        println!("{}", call_row(call));
        if with_notes {
            for line in note_lines(call, now) {
                println!("{line}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use callboard_core::testing;

    #[test]
    fn row_shows_duration_and_archived_marker() {
        let mut call = testing::call("c-1");
        call.duration = 61;
        call.is_archived = true;
        let row = call_row(&call);
        assert!(row.starts_with("c-1"));
        assert!(row.contains("1 minute 1 second"));
        assert!(row.ends_with("[archived]"));
    }

    #[test]
    fn row_counts_only_non_blank_notes() {
        let mut call = testing::call("c-2");
        call.notes = vec![
            testing::note("first", "2024-05-01T10:00:00Z"),
            testing::note("   ", "2024-05-01T11:00:00Z"),
        ];
        assert!(call_row(&call).ends_with("(1 note)"));
    }

    #[test]
    fn notes_print_newest_first() {
        let mut call = testing::call("c-3");
        call.notes = vec![
            testing::note("older", "2024-05-01T10:00:00Z"),
            testing::note("newer", "2024-05-02T10:00:00Z"),
        ];
        let lines = note_lines(&call, Utc::now());
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("newer"));
        assert!(lines[1].ends_with("older"));
    }

    #[test]
    fn footer_includes_range_and_page() {
        let range = PageRange {
            start: 41,
            end: 42,
            total: 42,
        };
        assert_eq!(page_footer(range, 5, 5), "41–42 of 42 (page 5 of 5)");
    }
}
