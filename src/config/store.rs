//! Key/value store shared by the load phases

use serde_json::{Map, Value};

/// Hierarchical store addressed by delimiter-separated key paths.
///
/// Scalars written later replace earlier ones; maps overlay deeply so only
/// colliding leaves are replaced. Map keys containing the delimiter are
/// split into nested paths on the way in.
#[derive(Debug, Clone)]
pub struct KeyStore {
    delimiter: char,
    root: Map<String, Value>,
}

impl KeyStore {
    pub fn new(delimiter: char) -> Self {
        Self { delimiter, root: Map::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Write `value` at `key`, replacing whatever is there.
    ///
    /// Intermediate scalars on the path are replaced by maps.
    pub fn set(&mut self, key: &str, value: Value) {
        let delimiter = self.delimiter;
        insert_path(&mut self.root, key.split(delimiter), value, delimiter);
    }

    /// Deep-merge a decoded tree into the store.
    pub fn merge(&mut self, tree: Map<String, Value>) {
        let delimiter = self.delimiter;
        merge_map(&mut self.root, tree, delimiter);
    }

    /// Look up the value at `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        let mut segments = key.split(self.delimiter);
        let first = segments.next()?;
        let mut current = self.root.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Whether a leaf or subtree exists at `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// All leaf keys, joined with the delimiter, in sorted order.
    pub fn keys(&self) -> Vec<String> {
        let mut out = Vec::new();
        collect_keys(&self.root, &mut String::new(), self.delimiter, &mut out);
        out.sort();
        out
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.root)
    }
}

fn insert_path<'a>(
    map: &mut Map<String, Value>,
    segments: impl Iterator<Item = &'a str>,
    value: Value,
    delimiter: char,
) {
    let mut segments: Vec<&str> = segments.collect();
    let Some(leaf) = segments.pop() else {
        return;
    };
    let mut target = map;
    for segment in segments {
        target = child_map(target, segment);
    }
    match value {
        Value::Object(tree) => {
            // Replace, then re-split nested keys so they follow the same rules.
            let mut fresh = Map::new();
            merge_map(&mut fresh, tree, delimiter);
            target.insert(leaf.to_string(), Value::Object(fresh));
        }
        other => {
            target.insert(leaf.to_string(), other);
        }
    }
}

fn merge_map(base: &mut Map<String, Value>, tree: Map<String, Value>, delimiter: char) {
    for (key, value) in tree {
        let mut segments: Vec<&str> = key.split(delimiter).collect();
        let Some(leaf) = segments.pop() else {
            continue;
        };
        let mut target = &mut *base;
        for segment in segments {
            target = child_map(target, segment);
        }
        match value {
            Value::Object(subtree) => merge_map(child_map(target, leaf), subtree, delimiter),
            other => {
                target.insert(leaf.to_string(), other);
            }
        }
    }
}

/// The map stored under `key`, created (or replacing a scalar) if needed.
fn child_map<'a>(map: &'a mut Map<String, Value>, key: &str) -> &'a mut Map<String, Value> {
    let slot = map.entry(key.to_string()).or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    match slot {
        Value::Object(child) => child,
        _ => unreachable!("slot holds a map"),
    }
}

/// Deep-merge `overlay` onto `base`; non-map values in `overlay` replace.
pub(crate) fn overlay(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(top)) => {
            for (key, value) in top {
                match base.get_mut(&key) {
                    Some(existing) => self::overlay(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, top) => *base = top,
    }
}

fn collect_keys(map: &Map<String, Value>, prefix: &mut String, delimiter: char, out: &mut Vec<String>) {
    for (key, value) in map {
        let len = prefix.len();
        if !prefix.is_empty() {
            prefix.push(delimiter);
        }
        prefix.push_str(key);
        match value {
            Value::Object(child) if !child.is_empty() => collect_keys(child, prefix, delimiter, out),
            _ => out.push(prefix.clone()),
        }
        prefix.truncate(len);
    }
}
