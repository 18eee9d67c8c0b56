use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What kind of document an activity entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    User,
    Item,
    Question,
}

impl ActivityKind {
    pub fn action(self) -> &'static str {
        match self {
            ActivityKind::User => "New user registered",
            ActivityKind::Item => "New item added",
            ActivityKind::Question => "New question added",
        }
    }
}

/// One line in the dashboard's "recent activity" feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub action: String,
    pub name: String,
    /// Human label relative to the request time ("3 hours ago").
    pub time: String,
    pub at: DateTime<Utc>,
}

impl Activity {
    pub fn new(kind: ActivityKind, name: impl Into<String>, at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            kind,
            action: kind.action().to_string(),
            name: name.into(),
            time: time_ago(at, now),
            at,
        }
    }
}

pub fn time_ago(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - at).num_seconds();
    match secs {
        s if s < 60 => "Just now".to_string(),
        s if s < 3_600 => format!("{} minutes ago", s / 60),
        s if s < 86_400 => format!("{} hours ago", s / 3_600),
        s => format!("{} days ago", s / 86_400),
    }
}

/// Newest first, at most `limit` entries.
pub fn most_recent(mut entries: Vec<Activity>, limit: usize) -> Vec<Activity> {
    entries.sort_by(|a, b| b.at.cmp(&a.at));
    entries.truncate(limit);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn time_ago_buckets() {
        let now = Utc::now();
        assert_eq!(time_ago(now - Duration::seconds(5), now), "Just now");
        assert_eq!(time_ago(now - Duration::minutes(12), now), "12 minutes ago");
        assert_eq!(time_ago(now - Duration::hours(5), now), "5 hours ago");
        assert_eq!(time_ago(now - Duration::days(40), now), "40 days ago");
    }

    #[test]
    fn most_recent_orders_by_timestamp_not_label() {
        let now = Utc::now();
        let entries = vec![
            Activity::new(ActivityKind::User, "old", now - Duration::days(10), now),
            Activity::new(ActivityKind::Item, "mid", now - Duration::days(2), now),
            Activity::new(ActivityKind::Question, "new", now - Duration::minutes(3), now),
        ];

        let recent = most_recent(entries, 2);
        let names: Vec<&str> = recent.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["new", "mid"]);
        assert_eq!(recent[0].action, "New question added");
    }
}
