//! Task Registry - keyed task definitions with a display-name index

use std::collections::HashMap;

use crate::action::Action;
use crate::error::GraphError;
use crate::key::TaskKey;

/// What runs once a task's dependencies are done
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Action(Action),
    /// Children run concurrently
    Parallel(Vec<TaskKey>),
}

/// A registered task. `depends_on` runs in series before `body`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDef {
    pub key: TaskKey,
    pub depends_on: Vec<TaskKey>,
    pub body: Body,
}

impl TaskDef {
    pub fn action(key: TaskKey, action: Action) -> Self {
        Self {
            key,
            depends_on: Vec::new(),
            body: Body::Action(action),
        }
    }

    pub fn parallel(key: TaskKey, children: Vec<TaskKey>) -> Self {
        Self {
            key,
            depends_on: Vec::new(),
            body: Body::Parallel(children),
        }
    }

    /// Run `dependency` to completion first
    pub fn after(mut self, dependency: TaskKey) -> Self {
        self.depends_on.push(dependency);
        self
    }

    /// Dependencies followed by parallel children
    pub fn edges(&self) -> impl Iterator<Item = &TaskKey> {
        let children = match &self.body {
            Body::Parallel(children) => children.as_slice(),
            Body::Action(_) => &[],
        };
        self.depends_on.iter().chain(children)
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.body, Body::Action(_))
    }
}

/// All tasks of a project, in registration order
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: Vec<TaskDef>,
    by_key: HashMap<TaskKey, usize>,
    by_name: HashMap<String, usize>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, task: TaskDef) -> Result<(), GraphError> {
        let name = task.key.to_string();
        if self.by_key.contains_key(&task.key) || self.by_name.contains_key(&name) {
            return Err(GraphError::Duplicate(name));
        }

        let idx = self.tasks.len();
        self.by_key.insert(task.key.clone(), idx);
        self.by_name.insert(name, idx);
        self.tasks.push(task);
        Ok(())
    }

    pub fn get(&self, key: &TaskKey) -> Option<&TaskDef> {
        self.by_key.get(key).map(|&idx| &self.tasks[idx])
    }

    /// Look a task up by its display name
    pub fn resolve(&self, name: &str) -> Option<&TaskDef> {
        self.by_name.get(name).map(|&idx| &self.tasks[idx])
    }

    pub fn contains(&self, key: &TaskKey) -> bool {
        self.by_key.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaskDef> {
        self.tasks.iter()
    }

    /// Display names in registration order
    pub fn names(&self) -> Vec<String> {
        self.tasks.iter().map(|t| t.key.to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
