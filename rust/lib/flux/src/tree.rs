//! Path-addressed navigation and mutation of the state tree.

use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::path::PathKey;

/// The state tree: nested JSON mappings, rooted in a mapping.
pub type StateTree = Map<String, Value>;

/// Walk all but the last segment of `path`, materializing empty mappings for
/// missing (or null) intermediates, and return the immediate container plus
/// the last segment.
///
/// Returns `(tree, None)` for the root path.
///
/// Fails with `StructuralConflict` if a prefix of `path` holds a scalar or
/// array, leaving the tree untouched past that prefix.
pub fn resolve<'t, 'p>(
    tree: &'t mut StateTree,
    path: &'p PathKey,
) -> Result<(&'t mut StateTree, Option<&'p str>), StoreError> {
    let Some((parents, last)) = path.split_last() else {
        return Ok((tree, None));
    };

    let mut node = tree;
    for (depth, segment) in parents.iter().enumerate() {
        let next = node
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if next.is_null() {
            *next = Value::Object(Map::new());
        }
        node = match next {
            Value::Object(map) => map,
            _ => {
                return Err(StoreError::StructuralConflict {
                    path: path.to_dotted(),
                    prefix: path.prefix(depth + 1).to_dotted(),
                })
            }
        };
    }

    Ok((node, Some(last)))
}

/// Read the value at `path` without modifying the tree.
///
/// The root path returns the whole tree. Missing nodes, and paths that
/// descend through a non-mapping value, return `None`.
pub fn read(tree: &StateTree, path: &PathKey) -> Option<Value> {
    let Some((first, rest)) = path.segments().split_first() else {
        return Some(Value::Object(tree.clone()));
    };

    let mut node = tree.get(first)?;
    for segment in rest {
        node = node.as_object()?.get(segment)?;
    }
    Some(node.clone())
}

/// Write `value` at `path`, overwriting whatever subtree was there.
///
/// Writing the root replaces the whole tree and requires a mapping.
pub fn write(tree: &mut StateTree, path: &PathKey, value: Value) -> Result<(), StoreError> {
    match resolve(tree, path)? {
        (root, None) => match value {
            Value::Object(map) => {
                *root = map;
                Ok(())
            }
            _ => Err(StoreError::RootNotMapping),
        },
        (container, Some(last)) => {
            container.insert(last.to_string(), value);
            Ok(())
        }
    }
}
