//! Azure Boards work-item connector.

mod client;
mod wiql;


pub use client::AzureBoardsClient;
pub use wiql::{quote, Wiql, WorkItemType};

use crate::error::Result;
use crate::markup::strip_html;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Upstream cap on IDs per work-item batch request.
pub const MAX_BATCH: usize = 200;

/// Fields requested for every batch fetch.
pub const TASK_FIELDS: [&str; 4] = [
    "System.Id",
    "System.Title",
    "System.State",
    "System.WorkItemType",
];

const FIELD_TITLE: &str = "System.Title";
const FIELD_STATE: &str = "System.State";
const FIELD_TYPE: &str = "System.WorkItemType";
const FIELD_DESCRIPTION: &str = "System.Description";
const FIELD_REPRO_STEPS: &str = "Microsoft.VSTS.TCM.ReproSteps";

/// States that make a task inactive.
const INACTIVE_STATES: [&str; 2] = ["Closed", "Removed"];

/// Raw work item as returned by the work-item API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkItem {
    pub id: i64,
    #[serde(default)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl WorkItem {
    fn text(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(|v| v.as_str())
    }
}

/// Normalized work item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: i64,
    pub title: String,
    pub state: String,
    #[serde(rename = "type")]
    pub item_type: String,
}

impl TaskRecord {
    /// Type "Task" and not closed or removed.
    pub fn is_active_task(&self) -> bool {
        self.item_type == WorkItemType::Task.as_str()
            && !INACTIVE_STATES.contains(&self.state.as_str())
    }
}

impl From<&WorkItem> for TaskRecord {
    fn from(item: &WorkItem) -> Self {
        let text = |field: &str| item.text(field).unwrap_or_default().to_string();
        Self {
            id: item.id,
            title: text(FIELD_TITLE),
            state: text(FIELD_STATE),
            item_type: text(FIELD_TYPE),
        }
    }
}

/// Work item with its plain-text description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: TaskRecord,
    pub description: String,
}

impl From<&WorkItem> for TaskDetail {
    fn from(item: &WorkItem) -> Self {
        let description = item
            .text(FIELD_DESCRIPTION)
            .filter(|d| !d.is_empty())
            .or_else(|| item.text(FIELD_REPRO_STEPS))
            .unwrap_or_default();

        Self {
            task: TaskRecord::from(item),
            description: strip_html(description),
        }
    }
}

/// Transport-level access to the work-item store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WorkItemApi: Send + Sync {
    /// Run a WIQL statement and return matching IDs in upstream order.
    async fn query_ids(&self, wiql: &Wiql) -> Result<Vec<i64>>;

    /// Fetch [`TASK_FIELDS`] for at most [`MAX_BATCH`] IDs in one request.
    async fn get_work_items(&self, ids: &[i64]) -> Result<Vec<WorkItem>>;

    /// Fetch a single work item with all of its fields.
    async fn get_work_item(&self, id: i64) -> Result<WorkItem>;
}

/// Tool-level operations over a [`WorkItemApi`].
pub struct BoardsConnector<A> {
    api: A,
}

impl<A: WorkItemApi> BoardsConnector<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    /// All tasks that are neither closed nor removed.
    ///
    /// The ID query is unfiltered; type and state are checked client-side
    /// once every batch has been fetched. A failing batch fails the call.
    pub async fn list_active_tasks(&self) -> Result<Vec<TaskRecord>> {
        tracing::info!("Requesting all active tasks");

        let ids = self.api.query_ids(&Wiql::all_ids()).await?;
        if ids.is_empty() {
            tracing::info!("No work items found");
            return Ok(Vec::new());
        }

        tracing::info!("Found {} work items, fetching details", ids.len());

        let mut items = Vec::with_capacity(ids.len());
        for (n, batch) in ids.chunks(MAX_BATCH).enumerate() {
            tracing::debug!(batch = n, size = batch.len(), "Fetching work item batch");
            items.extend(self.api.get_work_items(batch).await?);
        }

        let tasks: Vec<TaskRecord> = items
            .iter()
            .map(TaskRecord::from)
            .filter(TaskRecord::is_active_task)
            .collect();

        tracing::info!("Found {} active tasks", tasks.len());
        Ok(tasks)
    }

    /// One work item with its description, unfiltered.
    pub async fn get_task_detail(&self, id: i64) -> Result<TaskDetail> {
        tracing::info!("Requesting description for task {}", id);
        let item = self.api.get_work_item(id).await?;
        Ok(TaskDetail::from(&item))
    }

    /// Number of items of type Task, in any state.
    pub async fn count_tasks(&self) -> Result<u64> {
        let ids = self
            .api
            .query_ids(&Wiql::ids_of_type(WorkItemType::Task))
            .await?;
        tracing::info!("Found {} total tasks", ids.len());
        Ok(ids.len() as u64)
    }

    /// Task, User Story and Epic children of `parent_id`.
    pub async fn get_child_tasks(&self, parent_id: i64) -> Result<Vec<TaskRecord>> {
        tracing::info!("Requesting child tasks for parent {}", parent_id);
        self.fetch_matching(&Wiql::children_of(parent_id)).await
    }

    /// All items of one type, in any state.
    pub async fn get_tasks_by_type(&self, item_type: WorkItemType) -> Result<Vec<TaskRecord>> {
        tracing::info!("Requesting tasks of type {}", item_type);
        self.fetch_matching(&Wiql::by_type(item_type)).await
    }

    /// Query IDs, then fetch them all in a single batch.
    async fn fetch_matching(&self, wiql: &Wiql) -> Result<Vec<TaskRecord>> {
        let ids = self.api.query_ids(wiql).await?;
        if ids.is_empty() {
            tracing::info!("No matching work items");
            return Ok(Vec::new());
        }

        tracing::info!("Found {} work items, fetching details", ids.len());
        let items = self.api.get_work_items(&ids).await?;
        Ok(items.iter().map(TaskRecord::from).collect())
    }
}
