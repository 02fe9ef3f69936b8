//! Tracing physical paths through links, containers and mirrored ports.

use kw_business::{navigation, objects, relationships};
use kw_database::Tables;
use kw_domain::constants::{
    CLASS_DUMMY_ROOT, CLASS_GENERIC_LOGICAL_PORT, CLASS_GENERIC_PORT, PHYSICAL_PATH_RELATIONSHIPS, POOL_CLASS,
};
use kw_domain::model::{ObjectKey, ObjectLight};
use kw_kernel::error::InventoryError;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet, VecDeque};

/// Upper bound of search steps. Dense mirror fans make the search exponential; past this
/// point the longest path found so far is returned.
const MAX_STEPS: usize = 100_000;

fn neighbours(tables: &Tables, key: &ObjectKey) -> Vec<ObjectKey> {
    let found: BTreeSet<ObjectKey> = tables
        .relationships
        .of_object(key)
        .filter(|r| PHYSICAL_PATH_RELATIONSHIPS.contains(&r.name.as_str()))
        .filter_map(|r| r.other(key).cloned())
        .collect();
    found.into_iter().collect()
}

/// Longest simple path from `start`, by depth first search over every branch.
fn longest_from(tables: &Tables, start: &ObjectKey) -> Vec<ObjectKey> {
    let mut best = vec![start.clone()];
    let mut path = vec![start.clone()];
    let mut on_path = HashSet::from([start.clone()]);
    let mut frames = vec![neighbours(tables, start)];
    let mut steps = 0;
    while let Some(frame) = frames.last_mut() {
        steps += 1;
        if steps > MAX_STEPS {
            break;
        }
        match frame.pop() {
            Some(next) if !on_path.contains(&next) => {
                on_path.insert(next.clone());
                path.push(next.clone());
                if path.len() > best.len() {
                    best.clone_from(&path);
                }
                frames.push(neighbours(tables, &next));
            },
            Some(_) => {},
            None => {
                frames.pop();
                if let Some(done) = path.pop() {
                    on_path.remove(&done);
                }
            },
        }
    }
    best
}

/// The physical port a logical port rides on: its closest ancestor that is a port.
fn physical_parent_port(tables: &Tables, class_name: &str, id: &str) -> Result<Option<ObjectKey>, InventoryError> {
    Ok(navigation::parents(tables, class_name, id)?
        .into_iter()
        .take_while(|a| a.class_name != POOL_CLASS && a.class_name != CLASS_DUMMY_ROOT)
        .find(|a| tables.classes.is_subclass_of(&a.class_name, CLASS_GENERIC_PORT))
        .map(|a| a.key()))
}

fn lights(tables: &Tables, keys: &[ObjectKey]) -> Vec<ObjectLight> {
    keys.iter().filter_map(|key| relationships::light(tables, key)).collect()
}

/// The longest chain of ports, links and mirrors starting at a port. A logical port starts
/// the path and the trace continues from the physical port it belongs to; a logical port
/// outside any physical port has no path.
///
/// # Errors
/// * [`InventoryError::NotFound`] for unknown objects.
/// * [`InventoryError::InvalidArgument`] for objects that are no port.
pub fn physical_path(tables: &Tables, class_name: &str, id: &str) -> Result<Vec<ObjectLight>, InventoryError> {
    let object = objects::object(tables, class_name, id)?;
    if tables.classes.is_subclass_of(&object.class_name, CLASS_GENERIC_LOGICAL_PORT) {
        let Some(physical) = physical_parent_port(tables, &object.class_name, &object.id)? else {
            return Ok(Vec::new());
        };
        let mut path = vec![object.light()];
        path.extend(lights(tables, &longest_from(tables, &physical)));
        return Ok(path);
    }
    if !tables.classes.is_subclass_of(&object.class_name, CLASS_GENERIC_PORT) {
        return Err(InventoryError::invalid(format!("Class {} is not a port", object.class_name)));
    }
    Ok(lights(tables, &longest_from(tables, &object.key())))
}

/// One node of a physical tree and the nodes first reached from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    pub object: ObjectLight,
    pub children: Vec<ObjectLight>,
}

/// Everything physically reachable from an object, breadth first. Each node lists the
/// nodes discovered through it, so the listing reads as a tree rooted at the start.
///
/// # Errors
/// [`InventoryError::NotFound`] for unknown objects.
pub fn physical_tree(tables: &Tables, class_name: &str, id: &str) -> Result<Vec<TreeNode>, InventoryError> {
    let start = objects::object(tables, class_name, id)?.key();
    let mut seen = HashSet::from([start.clone()]);
    let mut queue = VecDeque::from([start]);
    let mut tree = Vec::new();
    while let Some(key) = queue.pop_front() {
        let Some(object) = relationships::light(tables, &key) else {
            continue;
        };
        let discovered: Vec<ObjectKey> = neighbours(tables, &key).into_iter().filter(|n| seen.insert(n.clone())).collect();
        tree.push(TreeNode { object, children: lights(tables, &discovered) });
        queue.extend(discovered);
    }
    Ok(tree)
}
