// src/classify.rs
//
// Line splitting and classification for the inbound sensor stream.
//
// The HC-05 side firmware emits newline-delimited ASCII records:
//   T:<value> D:<value>   combined temperature + ultrasonic distance reading
//   LDR:<value>           light sensor reading
// Anything else on the wire is noise and is dropped.

/// Destination log for a classified record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    Temperature,
    Distance,
    Light,
}

/// One classified line, ready to append to its channel's log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    pub channel: Channel,
    pub text: String,
}

impl Record {
    fn new(channel: Channel, text: impl Into<String>) -> Self {
        Record {
            channel,
            text: text.into(),
        }
    }
}

// ============================================================================
// Line Splitter
// ============================================================================

/// Accumulates raw serial chunks and yields completed lines.
///
/// Serial reads land on arbitrary byte boundaries, so a line frequently
/// spans two chunks. The trailing partial segment is carried over until the
/// next chunk (or `flush`) completes it, instead of being split per chunk
/// and lost.
#[derive(Debug, Default)]
pub struct LineSplitter {
    carry: Vec<u8>,
}

impl LineSplitter {
    pub fn new() -> Self {
        LineSplitter { carry: Vec::new() }
    }

    /// Feed a chunk of raw bytes, returning every line completed by it.
    /// Line terminators (`\n`, with an optional preceding `\r`) are stripped.
    /// Bytes after the last terminator are retained for the next feed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();

        for &byte in chunk {
            if byte == b'\n' {
                if self.carry.last() == Some(&b'\r') {
                    self.carry.pop();
                }
                let line = std::mem::take(&mut self.carry);
                lines.push(String::from_utf8_lossy(&line).into_owned());
            } else {
                self.carry.push(byte);
            }
        }

        lines
    }

    /// Return the trailing partial line, if any. Called at stream end.
    pub fn flush(&mut self) -> Option<String> {
        if self.carry.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.carry);
        Some(String::from_utf8_lossy(&line).into_owned())
    }
}

// ============================================================================
// Classification
// ============================================================================

/// Classify one line into zero, one or two records.
///
/// A `T:` line carrying a ` D:` segment is a composite reading: the part
/// before ` D:` becomes a temperature record and `D:` plus the remainder a
/// distance record, appended together. An `LDR:` line maps whole to the
/// light channel. The two patterns are mutually exclusive and any other
/// line (including an empty one) produces nothing.
pub fn classify_line(line: &str) -> Vec<Record> {
    if line.starts_with("T:") {
        if let Some((temperature, distance_rest)) = line.split_once(" D:") {
            return vec![
                Record::new(Channel::Temperature, temperature),
                Record::new(Channel::Distance, format!("D:{}", distance_rest)),
            ];
        }
    } else if line.starts_with("LDR:") {
        return vec![Record::new(Channel::Light, line)];
    }

    Vec::new()
}

/// Feed a chunk through the splitter and classify every completed line.
pub fn classify_chunk(splitter: &mut LineSplitter, chunk: &[u8]) -> Vec<Record> {
    splitter
        .feed(chunk)
        .iter()
        .flat_map(|line| classify_line(line))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_line_splits_into_pair() {
        let records = classify_line("T:23 D:150");
        assert_eq!(
            records,
            vec![
                Record::new(Channel::Temperature, "T:23"),
                Record::new(Channel::Distance, "D:150"),
            ]
        );
    }

    #[test]
    fn test_ldr_line_routes_whole() {
        let records = classify_line("LDR:42");
        assert_eq!(records, vec![Record::new(Channel::Light, "LDR:42")]);
    }

    #[test]
    fn test_unrecognized_line_dropped() {
        assert!(classify_line("HELLO").is_empty());
        assert!(classify_line("").is_empty());
        // T: without a distance segment is not a valid composite reading
        assert!(classify_line("T:23").is_empty());
        // D: alone never matches
        assert!(classify_line("D:150").is_empty());
    }

    #[test]
    fn test_patterns_mutually_exclusive() {
        // An LDR line containing " D:" must not be split
        let records = classify_line("LDR:42 D:1");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].channel, Channel::Light);
    }

    #[test]
    fn test_splitter_handles_crlf_and_lf() {
        let mut splitter = LineSplitter::new();
        let lines = splitter.feed(b"T:20 D:100\r\nLDR:7\n");
        assert_eq!(lines, vec!["T:20 D:100", "LDR:7"]);
    }

    #[test]
    fn test_splitter_carries_partial_line_across_chunks() {
        let mut splitter = LineSplitter::new();
        assert!(splitter.feed(b"T:23 D").is_empty());
        let lines = splitter.feed(b":150\nLDR:9");
        assert_eq!(lines, vec!["T:23 D:150"]);
        assert_eq!(splitter.flush(), Some("LDR:9".to_string()));
        assert_eq!(splitter.flush(), None);
    }

    #[test]
    fn test_splitter_crlf_split_across_chunks() {
        let mut splitter = LineSplitter::new();
        assert!(splitter.feed(b"LDR:1\r").is_empty());
        assert_eq!(splitter.feed(b"\n"), vec!["LDR:1"]);
    }

    #[test]
    fn test_consecutive_delimiters_yield_empty_lines_only() {
        let mut splitter = LineSplitter::new();
        let lines = splitter.feed(b"\n\n\n");
        assert_eq!(lines, vec!["", "", ""]);
        // ...and empty lines classify to nothing
        assert!(lines.iter().all(|l| classify_line(l).is_empty()));
    }

    #[test]
    fn test_classify_chunk_end_to_end() {
        let mut splitter = LineSplitter::new();
        let records = classify_chunk(&mut splitter, b"T:23 D:150\nnoise\nLDR:42\n");
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].channel, Channel::Temperature);
        assert_eq!(records[1].channel, Channel::Distance);
        assert_eq!(records[2].channel, Channel::Light);
    }
}
