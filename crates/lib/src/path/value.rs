//! Reading and writing [`PropertyPath`]s on JSON values.

use serde_json::{Map, Value};

use super::{PropertyPath, Segment};

/// Returns the value at `path`, or `None` if any step is missing or has the
/// wrong shape.
pub fn get_path<'a>(value: &'a Value, path: &PropertyPath) -> Option<&'a Value> {
    path.segments()
        .iter()
        .try_fold(value, |current, segment| match segment {
            Segment::Key(key) => current.as_object()?.get(key),
            Segment::Index(index) => current.as_array()?.get(*index),
        })
}

/// Parses `path` and reads it from `value`. Unparseable paths read as missing.
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let path = PropertyPath::parse(path).ok()?;
    get_path(value, &path)
}

/// Sets `new_value` at `path`, creating intermediate containers as needed.
///
/// A step that holds the wrong kind of container (or a scalar) is replaced
/// by an empty object for key steps and an empty array for index steps.
/// Arrays are padded with `null` up to the addressed index.
pub fn set_path(target: &mut Value, path: &PropertyPath, new_value: Value) {
    let mut current = target;
    for segment in path.segments() {
        current = child_mut(current, segment);
    }
    *current = new_value;
}

fn child_mut<'a>(current: &'a mut Value, segment: &Segment) -> &'a mut Value {
    match segment {
        Segment::Key(key) => object_mut(current)
            .entry(key.clone())
            .or_insert(Value::Null),
        Segment::Index(index) => {
            let items = array_mut(current);
            if items.len() <= *index {
                items.resize(*index + 1, Value::Null);
            }
            &mut items[*index]
        }
    }
}

/// The object at `value`, replacing any non-object first.
fn object_mut(value: &mut Value) -> &mut Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => {
            *other = Value::Object(Map::new());
            object_mut(other)
        }
    }
}

/// The array at `value`, replacing any non-array first.
fn array_mut(value: &mut Value) -> &mut Vec<Value> {
    match value {
        Value::Array(items) => items,
        other => {
            *other = Value::Array(Vec::new());
            array_mut(other)
        }
    }
}
