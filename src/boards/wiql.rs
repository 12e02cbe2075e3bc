//! WIQL statement construction.

use serde::{Deserialize, Serialize};
use std::fmt;

const SELECT_IDS: &str = "Select [System.Id] From WorkItems";
const SELECT_TASK_FIELDS: &str =
    "Select [System.Id], [System.Title], [System.State], [System.WorkItemType] From WorkItems";

/// Work item types the tools can filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkItemType {
    Epic,
    #[serde(rename = "User Story")]
    UserStory,
    Task,
}

impl WorkItemType {
    pub const ALL: [WorkItemType; 3] = [Self::Task, Self::UserStory, Self::Epic];

    pub fn as_str(self) -> &'static str {
        match self {
            WorkItemType::Epic => "Epic",
            WorkItemType::UserStory => "User Story",
            WorkItemType::Task => "Task",
        }
    }
}

impl fmt::Display for WorkItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A complete WIQL statement.
///
/// Only built through the constructors below: integers are formatted as
/// numbers and text values go through [`quote`], so caller input never
/// changes the shape of the statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wiql(String);

impl Wiql {
    /// Every work item ID, unfiltered.
    pub fn all_ids() -> Self {
        Self(SELECT_IDS.to_string())
    }

    /// IDs of every item of the given type, regardless of state.
    pub fn ids_of_type(item_type: WorkItemType) -> Self {
        Self(format!(
            "{} Where [System.WorkItemType] = {}",
            SELECT_IDS,
            quote(item_type.as_str())
        ))
    }

    /// Task, User Story and Epic children of `parent_id`.
    pub fn children_of(parent_id: i64) -> Self {
        let types: Vec<String> = WorkItemType::ALL
            .iter()
            .map(|t| quote(t.as_str()))
            .collect();

        Self(format!(
            "{} Where [System.Parent] = {} AND [System.WorkItemType] IN ({})",
            SELECT_TASK_FIELDS,
            parent_id,
            types.join(", ")
        ))
    }

    /// Items of one type, with the task fields selected.
    pub fn by_type(item_type: WorkItemType) -> Self {
        Self(format!(
            "{} Where [System.WorkItemType] = {}",
            SELECT_TASK_FIELDS,
            quote(item_type.as_str())
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Wiql {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Quote a WIQL string literal. Embedded single quotes are doubled.
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
