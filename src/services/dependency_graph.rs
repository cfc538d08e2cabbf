//! Dependency graph checking: cycle detection over the validated task
//! map.

use std::collections::{BTreeMap, HashMap};

use crate::domain::errors::{MissionError, MissionResult};
use crate::domain::models::TaskSpec;

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    InProgress,
    Done,
}

/// Verify the `depends_on` relation is acyclic.
///
/// Depth-first traversal from every task with in-progress/done marker
/// sets; revisiting an in-progress node signals a cycle, reported with
/// the id at which it was detected. O(V+E). Unknown dependencies are
/// re-checked here as a graph property even though the validator has
/// already rejected them.
pub fn ensure_acyclic(tasks: &BTreeMap<String, TaskSpec>) -> MissionResult<()> {
    let mut marks: HashMap<&str, Mark> = HashMap::with_capacity(tasks.len());
    for id in tasks.keys() {
        visit(id, tasks, &mut marks)?;
    }
    Ok(())
}

fn visit<'a>(
    id: &'a str,
    tasks: &'a BTreeMap<String, TaskSpec>,
    marks: &mut HashMap<&'a str, Mark>,
) -> MissionResult<()> {
    match marks.get(id) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::InProgress) => {
            return Err(MissionError::Spec(format!("cycle detected at task '{id}'")))
        }
        None => {}
    }

    let task = tasks
        .get(id)
        .ok_or_else(|| MissionError::Spec(format!("dependency on unknown task '{id}'")))?;

    marks.insert(&task.id, Mark::InProgress);
    for dep in &task.depends_on {
        visit(dep, tasks, marks)?;
    }
    marks.insert(&task.id, Mark::Done);
    Ok(())
}
