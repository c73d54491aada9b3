//! Recovery of the last prompt time from the responder log.
//!
//! Log lines look like `[2026-10-19 14:03:27]  INFO ...: found prompt in dev:0.1: ...`.
//! This is advisory display data only.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};

/// Timestamp format inside the leading brackets of every log line.
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Message prefix the responder logs when it detects a prompt.
pub const PROMPT_LOG_PREFIX: &str = "found prompt in";

/// Parse the bracketed timestamp at the start of a log line.
pub fn parse_line_timestamp(line: &str) -> Option<DateTime<Local>> {
    let rest = line.trim_start().strip_prefix('[')?;
    let (stamp, _) = rest.split_once(']')?;
    let naive = NaiveDateTime::parse_from_str(stamp.trim(), LOG_TIMESTAMP_FORMAT).ok()?;
    Local.from_local_datetime(&naive).earliest()
}

/// Most recent `found prompt in <pane_id>:` entry in `log`.
pub fn last_prompt_in_log(log: &str, pane_id: &str) -> Option<DateTime<Local>> {
    let needle = format!("{PROMPT_LOG_PREFIX} {pane_id}:");
    log.lines()
        .rev()
        .filter(|line| line.contains(&needle))
        .find_map(parse_line_timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn parses_bracketed_timestamp() {
        let ts = parse_line_timestamp("[2026-10-19 14:03:27]  INFO x: hello").expect("parse");
        assert_eq!((ts.hour(), ts.minute(), ts.second()), (14, 3, 27));
    }

    #[test]
    fn rejects_lines_without_brackets() {
        assert!(parse_line_timestamp("2026-10-19 14:03:27 INFO").is_none());
        assert!(parse_line_timestamp("[not a time] INFO").is_none());
        assert!(parse_line_timestamp("").is_none());
    }

    #[test]
    fn finds_latest_prompt_for_pane() {
        let log = "\
[2026-10-19 10:00:00]  INFO r: found prompt in dev:0.1: sending confirm
[2026-10-19 10:05:00]  INFO r: found prompt in dev:0.10: sending confirm
[2026-10-19 10:07:00]  INFO r: found prompt in dev:0.1: sending confirm
[2026-10-19 10:09:00]  INFO r: sent confirm to dev:0.1
";
        let ts = last_prompt_in_log(log, "dev:0.1").expect("found");
        assert_eq!((ts.hour(), ts.minute()), (10, 7));

        let ts = last_prompt_in_log(log, "dev:0.10").expect("found");
        assert_eq!(ts.minute(), 5);
    }

    #[test]
    fn missing_pane_yields_none() {
        let log = "[2026-10-19 10:00:00]  INFO r: found prompt in dev:0.1: x\n";
        assert!(last_prompt_in_log(log, "other:1.0").is_none());
        assert!(last_prompt_in_log("", "dev:0.1").is_none());
    }

    #[test]
    fn unparsable_match_falls_back_to_earlier_entry() {
        let log = "\
[2026-10-19 09:00:00]  INFO r: found prompt in a:0.0: x
garbage found prompt in a:0.0: x
";
        let ts = last_prompt_in_log(log, "a:0.0").expect("found");
        assert_eq!(ts.hour(), 9);
    }
}
