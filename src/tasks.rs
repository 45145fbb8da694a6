//! Daily report records, task entries and the per-team grouping.
//!
//! Records arrive one per employee per day. Each record carries a list of task
//! entries that are either bare strings or labeled objects with a `details`
//! field.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap, HashSet};

/// One unit of reported work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskEntry {
    /// A bare free-text entry
    Text(String),
    /// A labeled record; only `details` is used
    Detailed {
        #[serde(default)]
        details: String,
    },
    /// Anything else the store holds (numbers, nulls, ...)
    Other(Value),
}

impl TaskEntry {
    /// The entry's text, untrimmed. Unusable shapes yield an empty string.
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            TaskEntry::Text(text) => Cow::Borrowed(text),
            TaskEntry::Detailed { details } => Cow::Borrowed(details),
            TaskEntry::Other(Value::Number(n)) => Cow::Owned(n.to_string()),
            TaskEntry::Other(Value::Bool(b)) => Cow::Owned(b.to_string()),
            TaskEntry::Other(_) => Cow::Borrowed(""),
        }
    }
}

impl From<&str> for TaskEntry {
    fn from(text: &str) -> Self {
        TaskEntry::Text(text.to_string())
    }
}

/// A single employee's report for one day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    /// Reporting day as `YYYY-MM-DD`
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub employee_name: String,
    #[serde(default)]
    pub tasks: Option<Vec<TaskEntry>>,
}

impl ReportRecord {
    /// Reported tasks; a missing or null list is empty.
    pub fn tasks(&self) -> &[TaskEntry] {
        self.tasks.as_deref().unwrap_or_default()
    }

    /// Trimmed team name, empty when absent.
    pub fn team_name(&self) -> &str {
        self.team.as_deref().map(str::trim).unwrap_or_default()
    }
}

/// Trim, drop blanks and drop repeats, keeping the first occurrence of each value.
pub fn dedup<I, T>(tasks: I) -> Vec<String>
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for task in tasks {
        let text = task.as_ref().trim();
        if text.is_empty() || seen.contains(text) {
            continue;
        }
        seen.insert(text.to_string());
        unique.push(text.to_string());
    }
    unique
}

/// All task texts reported for one team on one day.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamTaskSet {
    pub team: String,
    pub entries: Vec<String>,
}

/// Task sets keyed by team, in order of first appearance.
#[derive(Debug, Clone, Default)]
pub struct TeamTasks {
    teams: Vec<TeamTaskSet>,
    index: HashMap<String, usize>,
}

impl TeamTasks {
    /// Group the non-blank task details of every record under its team.
    ///
    /// A team only appears once at least one of its records has a non-blank
    /// task, so teams with nothing reported have no entry at all.
    pub fn from_records(records: &[ReportRecord]) -> Self {
        let mut grouped = TeamTasks::default();
        for record in records {
            let team = record.team_name();
            for task in record.tasks() {
                let details = task.text();
                let details = details.trim();
                if !details.is_empty() {
                    grouped.push(team, details);
                }
            }
        }
        grouped
    }

    fn push(&mut self, team: &str, details: &str) {
        let slot = match self.index.get(team) {
            Some(&slot) => slot,
            None => {
                self.teams.push(TeamTaskSet {
                    team: team.to_string(),
                    entries: Vec::new(),
                });
                self.index.insert(team.to_string(), self.teams.len() - 1);
                self.teams.len() - 1
            }
        };
        self.teams[slot].entries.push(details.to_string());
    }

    pub fn get(&self, team: &str) -> Option<&TeamTaskSet> {
        self.index.get(team).map(|&slot| &self.teams[slot])
    }

    pub fn iter(&self) -> impl Iterator<Item = &TeamTaskSet> {
        self.teams.iter()
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }
}

/// How many employees of a department/team reported at least one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamReporting {
    pub department: String,
    pub team: String,
    pub reported: usize,
}

/// Count reporting employees per (department, team), sorted by both.
///
/// Records without an employee name are ignored. Missing department or team
/// names are reported as `Unknown`.
pub fn reporting_summary(records: &[ReportRecord]) -> Vec<TeamReporting> {
    let mut groups: BTreeMap<(String, String), HashSet<&str>> = BTreeMap::new();
    for record in records {
        let employee = record.employee_name.trim();
        if employee.is_empty() {
            continue;
        }
        let department = record.department.as_deref().unwrap_or("Unknown").trim();
        let team = record.team.as_deref().unwrap_or("Unknown").trim();
        let reported = groups
            .entry((department.to_string(), team.to_string()))
            .or_default();
        if !record.tasks().is_empty() {
            reported.insert(employee);
        }
    }

    groups
        .into_iter()
        .map(|((department, team), reported)| TeamReporting {
            department,
            team,
            reported: reported.len(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> ReportRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_dedup_keeps_first_occurrence_order() {
        let input = ["  fix login ", "write docs", "fix login", "", "   ", "deploy", "write docs"];
        assert_eq!(dedup(input), vec!["fix login", "write docs", "deploy"]);
    }

    #[test]
    fn test_dedup_empty_input() {
        assert!(dedup(Vec::<String>::new()).is_empty());
    }

    #[test]
    fn test_dedup_output_has_no_duplicates() {
        let input: Vec<String> = (0..50).map(|i| format!("task {}", i % 7)).collect();
        let out = dedup(&input);
        let unique: HashSet<_> = out.iter().collect();
        assert_eq!(out.len(), unique.len());
        assert_eq!(out.first().map(String::as_str), Some("task 0"));
        assert_eq!(out.len(), 7);
    }

    #[test]
    fn test_task_entry_shapes() {
        let tasks: Vec<TaskEntry> = serde_json::from_value(json!([
            "Plain entry",
            {"details": "Detailed entry", "hours": 2},
            {"hours": 3},
            42,
            null
        ]))
        .unwrap();

        let texts: Vec<String> = tasks.iter().map(|t| t.text().into_owned()).collect();
        assert_eq!(texts, vec!["Plain entry", "Detailed entry", "", "42", ""]);
    }

    #[test]
    fn test_record_with_missing_fields() {
        let rec = record(json!({"employee_name": "Asha", "tasks": null}));
        assert!(rec.tasks().is_empty());
        assert_eq!(rec.team_name(), "");
        assert_eq!(rec.date, "");
    }

    #[test]
    fn test_group_by_team_skips_blank_details() {
        let records = vec![
            record(json!({"team": " Data ", "tasks": ["ETL fixes", {"details": "  "}]})),
            record(json!({"team": "Web", "tasks": [{"details": "Landing page"}]})),
            record(json!({"team": "Data", "tasks": ["Dashboards"]})),
            record(json!({"team": "Ops", "tasks": []})),
        ];

        let teams = TeamTasks::from_records(&records);
        assert_eq!(teams.len(), 2);
        let names: Vec<&str> = teams.iter().map(|t| t.team.as_str()).collect();
        assert_eq!(names, vec!["Data", "Web"]);
        assert_eq!(teams.get("Data").unwrap().entries, vec!["ETL fixes", "Dashboards"]);
        assert!(teams.get("Ops").is_none());
    }

    #[test]
    fn test_reporting_summary_counts_distinct_reporters() {
        let records = vec![
            record(json!({"department": "Tech", "team": "Data", "employee_name": "Asha", "tasks": ["a"]})),
            record(json!({"department": "Tech", "team": "Data", "employee_name": "Asha", "tasks": ["b"]})),
            record(json!({"department": "Tech", "team": "Data", "employee_name": "Ravi", "tasks": []})),
            record(json!({"team": "Web", "employee_name": "Mei", "tasks": ["c"]})),
            record(json!({"department": "Tech", "team": "Data", "employee_name": " ", "tasks": ["d"]})),
        ];

        let summary = reporting_summary(&records);
        assert_eq!(
            summary,
            vec![
                TeamReporting { department: "Tech".into(), team: "Data".into(), reported: 1 },
                TeamReporting { department: "Unknown".into(), team: "Web".into(), reported: 1 },
            ]
        );
    }
}
