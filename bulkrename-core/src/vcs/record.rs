use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::Index;

/// One tagged record: a string map. Missing keys read as `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Record {
    fields: BTreeMap<String, String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> &str {
        self.fields.get(key).map_or("", String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Index<&str> for Record {
    type Output = str;

    fn index(&self, key: &str) -> &str {
        self.get(key)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (key, value) in iter {
            record.insert(key, value);
        }
        record
    }
}

/// Everything one command produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordSet {
    pub records: Vec<Record>,
    pub info: Vec<String>,
    pub errors: Vec<String>,
}

impl RecordSet {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn first(&self) -> Option<&Record> {
        self.records.first()
    }
}

/// Parse tagged command output.
///
/// Records are runs of `... key value` lines separated by blank lines; other
/// stdout lines are informational and every non-blank stderr line is an
/// error message.
pub fn parse_tagged(stdout: &str, stderr: &str) -> RecordSet {
    let mut set = RecordSet::default();
    let mut current = Record::new();

    for line in stdout.lines() {
        let line = line.trim_end_matches('\r');
        if let Some(tagged) = line.strip_prefix("... ") {
            let (key, value) = tagged.split_once(' ').unwrap_or((tagged, ""));
            current.insert(key, value);
        } else if line.trim().is_empty() {
            if !current.is_empty() {
                set.records.push(std::mem::take(&mut current));
            }
        } else {
            set.info.push(line.to_string());
        }
    }
    if !current.is_empty() {
        set.records.push(current);
    }

    set.errors = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect();
    set
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_reads_empty() {
        let record: Record = [("unicode", "enabled")].into_iter().collect();
        assert_eq!(&record["unicode"], "enabled");
        assert_eq!(&record["absent"], "");
        assert!(!record.contains_key("absent"));
    }

    #[test]
    fn test_parse_info_record() {
        let stdout = "\
... userName alice
... clientName ws
... unicode enabled
";
        let set = parse_tagged(stdout, "");
        assert_eq!(set.records.len(), 1);
        assert!(set.records[0].contains_key("unicode"));
        assert_eq!(set.records[0].get("userName"), "alice");
        assert!(!set.has_errors());
    }

    #[test]
    fn test_parse_multiple_records_and_errors() {
        let stdout = "\
... depotFile //depot/a.txt
... action edit

... depotFile //depot/b.txt
... action edit

User alice logged in.
";
        let stderr = "//depot/c.txt - file(s) not on client.\n\n";
        let set = parse_tagged(stdout, stderr);
        assert_eq!(set.records.len(), 2);
        assert_eq!(set.records[1].get("depotFile"), "//depot/b.txt");
        assert_eq!(set.info, vec!["User alice logged in.".to_string()]);
        assert_eq!(set.errors.len(), 1);
    }

    #[test]
    fn test_key_without_value() {
        let set = parse_tagged("... isTrue\n", "");
        assert!(set.records[0].contains_key("isTrue"));
        assert_eq!(set.records[0].get("isTrue"), "");
    }
}
