//! Grouping of raw tool output lines into logical records.
//!
//! Many tools print one diagnostic over several physical lines. The scanner
//! accumulates lines until a record is complete (a new record starts, the
//! maximum span is reached, or input ends) so that extraction always sees a
//! whole record, independent of how the output was chunked.

/// Stateful line buffer that yields complete records.
#[derive(Debug, Clone)]
pub struct RecordScanner {
    max_span: usize,
    pending: Vec<String>,
}

impl RecordScanner {
    /// Create a scanner whose records span at most `max_span` lines.
    pub fn new(max_span: usize) -> Self {
        RecordScanner {
            max_span: max_span.max(1),
            pending: Vec::new(),
        }
    }

    /// Feed one line.
    ///
    /// `starts_record` tells whether the line opens a new record. A line that
    /// does not open a record is appended to the pending one. With nothing
    /// pending it opens a record anyway, and the lines after it join that
    /// record until a new one starts or the span is full.
    ///
    /// Returns the records completed by this line, in output order.
    pub fn push(&mut self, line: &str, starts_record: bool) -> Vec<String> {
        let mut done = Vec::new();

        if starts_record {
            done.extend(self.flush());
        }

        self.pending.push(line.to_string());

        if self.pending.len() >= self.max_span {
            done.extend(self.flush());
        }

        done
    }

    /// Flush whatever is pending at end of input.
    pub fn finish(&mut self) -> Option<String> {
        self.flush()
    }

    fn flush(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.pending).join("\n"))
    }
}

/// Group a whole sequence of lines into records.
pub fn group_records<I, S, F>(lines: I, max_span: usize, starts_record: F) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    F: Fn(&str) -> bool,
{
    let mut scanner = RecordScanner::new(max_span);
    let mut records = Vec::new();

    for line in lines {
        let line = line.as_ref();
        records.extend(scanner.push(line, starts_record(line)));
    }
    records.extend(scanner.finish());

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn starts_with_percent(line: &str) -> bool {
        line.starts_with('%')
    }

    #[test]
    fn test_single_line_records() {
        let records = group_records(["a", "b", "c"], 1, |_| true);
        assert_eq!(records, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_multi_line_record_is_one_unit() {
        let records = group_records(
            ["%Error: top.sv:42: syntax error", "  near here", "  and here"],
            3,
            starts_with_percent,
        );
        assert_eq!(
            records,
            vec!["%Error: top.sv:42: syntax error\n  near here\n  and here"]
        );
    }

    #[test]
    fn test_new_record_flushes_pending() {
        let records = group_records(
            ["%Warning: a.v:1: x", "detail", "%Error: b.v:2: y"],
            3,
            starts_with_percent,
        );
        assert_eq!(records, vec!["%Warning: a.v:1: x\ndetail", "%Error: b.v:2: y"]);
    }

    #[test]
    fn test_span_is_capped() {
        let records = group_records(["%E", "1", "2", "3"], 3, starts_with_percent);
        assert_eq!(records, vec!["%E\n1\n2", "3"]);
    }

    #[test]
    fn test_leading_orphan_opens_a_record() {
        let mut scanner = RecordScanner::new(3);
        assert!(scanner.push("banner", false).is_empty());
        assert_eq!(scanner.push("%Error: x", true), vec!["banner"]);
        assert_eq!(scanner.finish(), Some("%Error: x".to_string()));
        assert_eq!(scanner.finish(), None);
    }

    #[test]
    fn test_lines_after_orphan_join_it() {
        let records = group_records(
            ["banner", "more banner", "%Error: x", "tail"],
            3,
            starts_with_percent,
        );
        assert_eq!(records, vec!["banner\nmore banner", "%Error: x\ntail"]);
    }
}
