use std::collections::HashMap;

use crate::config::LocatorEntry;
use crate::driver::traits::Locator;
use crate::tasks::types::{TaskDescriptor, TaskType};

/// Immutable task-type → locator-pair table, built once from config and
/// shared read-only across all workers.
#[derive(Debug, Default)]
pub struct DescriptorTable {
    entries: HashMap<TaskType, TaskDescriptor>,
}

impl DescriptorTable {
    pub fn from_config(tasks: &HashMap<TaskType, LocatorEntry>) -> Self {
        let entries = tasks
            .iter()
            .map(|(task_type, entry)| {
                (
                    *task_type,
                    TaskDescriptor {
                        action: Locator::new(&entry.action),
                        verify: Locator::new(&entry.verify),
                    },
                )
            })
            .collect();
        Self { entries }
    }

    pub fn lookup(&self, task_type: TaskType) -> Option<&TaskDescriptor> {
        self.entries.get(&task_type)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
