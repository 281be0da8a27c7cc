// src/logs.rs
//
// Append-only sensor logs, one per channel, rendered most-recent-at-bottom.
// Each log keeps a bounded ring of lines so a long-running session does not
// grow without limit.

use std::collections::VecDeque;

use crate::classify::{Channel, Record};

/// Default retention per log.
pub const DEFAULT_LOG_LIMIT: usize = 1000;

/// Bounded, ordered log of text lines. Appending past the cap evicts the
/// oldest line.
#[derive(Clone, Debug)]
pub struct SensorLog {
    lines: VecDeque<String>,
    max_lines: usize,
}

impl SensorLog {
    pub fn new(max_lines: usize) -> Self {
        SensorLog {
            lines: VecDeque::new(),
            max_lines: max_lines.max(1),
        }
    }

    pub fn append(&mut self, line: String) {
        self.lines.push_back(line);
        while self.lines.len() > self.max_lines {
            self.lines.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The newest `n` lines, oldest first. Used to pin the view to the
    /// bottom of the log.
    pub fn tail(&self, n: usize) -> impl Iterator<Item = &str> {
        let skip = self.lines.len().saturating_sub(n);
        self.lines.iter().skip(skip).map(String::as_str)
    }
}

/// The three channel logs of a connection session.
#[derive(Clone, Debug)]
pub struct LogStore {
    temperature: SensorLog,
    distance: SensorLog,
    light: SensorLog,
}

impl LogStore {
    pub fn new(max_lines: usize) -> Self {
        LogStore {
            temperature: SensorLog::new(max_lines),
            distance: SensorLog::new(max_lines),
            light: SensorLog::new(max_lines),
        }
    }

    /// Route a classified record to exactly one log.
    pub fn append(&mut self, record: Record) {
        self.get_mut(record.channel).append(record.text);
    }

    pub fn get(&self, channel: Channel) -> &SensorLog {
        match channel {
            Channel::Temperature => &self.temperature,
            Channel::Distance => &self.distance,
            Channel::Light => &self.light,
        }
    }

    fn get_mut(&mut self, channel: Channel) -> &mut SensorLog {
        match channel {
            Channel::Temperature => &mut self.temperature,
            Channel::Distance => &mut self.distance,
            Channel::Light => &mut self.light,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify_line;

    fn drain(log: &SensorLog) -> Vec<&str> {
        log.tail(usize::MAX).collect()
    }

    #[test]
    fn test_append_keeps_order() {
        let mut log = SensorLog::new(10);
        log.append("a".to_string());
        log.append("b".to_string());
        assert_eq!(drain(&log), vec!["a", "b"]);
    }

    #[test]
    fn test_cap_evicts_oldest() {
        let mut log = SensorLog::new(3);
        for n in 0..5 {
            log.append(n.to_string());
        }
        assert_eq!(drain(&log), vec!["2", "3", "4"]);
    }

    #[test]
    fn test_tail_returns_newest_lines() {
        let mut log = SensorLog::new(10);
        for n in 0..6 {
            log.append(n.to_string());
        }
        assert_eq!(log.tail(2).collect::<Vec<_>>(), vec!["4", "5"]);
    }

    #[test]
    fn test_composite_record_lands_in_both_logs() {
        let mut store = LogStore::new(100);
        for record in classify_line("T:23 D:150") {
            store.append(record);
        }
        assert_eq!(drain(store.get(Channel::Temperature)), vec!["T:23"]);
        assert_eq!(drain(store.get(Channel::Distance)), vec!["D:150"]);
        assert!(store.get(Channel::Light).is_empty());
    }

    #[test]
    fn test_light_record_leaves_others_untouched() {
        let mut store = LogStore::new(100);
        for record in classify_line("LDR:42") {
            store.append(record);
        }
        assert!(store.get(Channel::Temperature).is_empty());
        assert!(store.get(Channel::Distance).is_empty());
        assert_eq!(drain(store.get(Channel::Light)), vec!["LDR:42"]);
    }
}
