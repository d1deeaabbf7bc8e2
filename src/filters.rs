use crate::entities::{Category, Task};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Completed,
}

/// Query string for `GET /api/tasks`, e.g. `?status=active&search=milk&category=Work,Health`.
#[derive(Debug, Default, Deserialize)]
pub struct TaskQuery {
    #[serde(default)]
    pub status: StatusFilter,
    pub search: Option<String>,
    pub category: Option<String>,
}

impl TaskQuery {
    fn categories(&self) -> Vec<&str> {
        self.category
            .as_deref()
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn matches(&self, task: &Task) -> bool {
        let status_ok = match self.status {
            StatusFilter::All => true,
            StatusFilter::Active => !task.completed,
            StatusFilter::Completed => task.completed,
        };
        if !status_ok {
            return false;
        }

        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            let needle = search.to_lowercase();
            let in_title = task.title.to_lowercase().contains(&needle);
            let in_description = task
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle));
            if !in_title && !in_description {
                return false;
            }
        }

        let categories = self.categories();
        if !categories.is_empty() {
            return task
                .category
                .as_deref()
                .is_some_and(|c| categories.contains(&c));
        }
        true
    }

    /// Keeps the input order.
    pub fn apply(&self, tasks: Vec<Task>) -> Vec<Task> {
        tasks.into_iter().filter(|task| self.matches(task)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
    pub by_category: Vec<CategoryCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub name: String,
    pub color: String,
    pub count: usize,
}

pub fn summarize(tasks: &[Task], categories: &[Category]) -> TaskSummary {
    let completed = tasks.iter().filter(|t| t.completed).count();
    let by_category = categories
        .iter()
        .map(|category| CategoryCount {
            name: category.name.clone(),
            color: category.color.clone(),
            count: tasks
                .iter()
                .filter(|t| t.category.as_deref() == Some(category.name.as_str()))
                .count(),
        })
        .collect();

    TaskSummary {
        total: tasks.len(),
        active: tasks.len() - completed,
        completed,
        by_category,
    }
}
