use tracing::debug;

use super::MergeOptions;
use crate::{Mapping, Value};

/// Receives the dotted paths touched by a merge.
///
/// Used by callers that track which layer set each field. Paths of leaves
/// written by the incoming tree are reported through
/// [`assigned`](Self::assigned); subtrees dropped from the current tree are
/// reported through [`removed`](Self::removed) before anything replaces them.
pub trait MergeObserver {
    /// A leaf (scalar or whole sequence) at `path` now holds an incoming value.
    fn assigned(&mut self, path: &str);

    /// The subtree at `path` was removed or is about to be replaced.
    fn removed(&mut self, path: &str) {
        let _ = path;
    }
}

struct Silent;

impl MergeObserver for Silent {
    fn assigned(&mut self, _path: &str) {}
}

/// Recursively deep-merge `incoming` into `current`.
///
/// - Mappings merge per key; keys only in `current` are kept.
/// - Sequences are replaced or appended according to `options`.
/// - An incoming null is skipped unless `merge_nil_values` is set.
/// - Anything else from `incoming` replaces the current value.
pub fn deep_merge(current: &mut Value, incoming: &Value, options: &MergeOptions) {
    merge_at(current, incoming, options, "", &mut Silent);
}

/// Deep-merge `incoming` into `current`, reporting touched paths to
/// `observer`.
pub fn deep_merge_observed(
    current: &mut Value,
    incoming: &Value,
    options: &MergeOptions,
    observer: &mut dyn MergeObserver,
) {
    merge_at(current, incoming, options, "", observer);
}

/// Copying form of [`deep_merge`]: returns the merged tree and leaves both
/// inputs untouched.
#[must_use]
pub fn merged(current: &Value, incoming: &Value, options: &MergeOptions) -> Value {
    let mut out = current.clone();
    deep_merge(&mut out, incoming, options);
    out
}

fn merge_at(
    current: &mut Value,
    incoming: &Value,
    options: &MergeOptions,
    path: &str,
    observer: &mut dyn MergeObserver,
) {
    match (current, incoming) {
        (Value::Mapping(dest), Value::Mapping(src)) => {
            merge_mappings(dest, src, options, path, observer);
        },
        (_, Value::Null) if !options.merge_nil_values => {},
        (Value::Sequence(dest), Value::Sequence(src)) => {
            merge_sequences(dest, src, options);
            observer.assigned(path);
        },
        // A bare marker outside a mapping has no key to delete.
        (_, incoming) if options.is_knockout(incoming) => {},
        (current, incoming) => {
            observer.removed(path);
            *current = scrub(incoming, options);
            record_leaves(current, path, observer);
        },
    }
}

fn merge_mappings(
    dest: &mut Mapping,
    src: &Mapping,
    options: &MergeOptions,
    path: &str,
    observer: &mut dyn MergeObserver,
) {
    for (key, incoming) in src {
        let child = join(path, key);

        if options.is_knockout(incoming) {
            if dest.shift_remove(key).is_some() {
                debug!(path = %child, "knocked out key");
                observer.removed(&child);
            }
            continue;
        }

        if let Some(current) = dest.get_mut(key) {
            merge_at(current, incoming, options, &child, observer);
        } else {
            let fresh = scrub(incoming, options);
            record_leaves(&fresh, &child, observer);
            dest.insert(key.clone(), fresh);
        }
    }
}

fn merge_sequences(dest: &mut Vec<Value>, src: &[Value], options: &MergeOptions) {
    let mut saw_marker = false;

    if let Some(prefix) = options.knockout() {
        if src.iter().any(|v| v.as_str() == Some(prefix)) {
            dest.clear();
            saw_marker = true;
        }

        let knocked: Vec<&str> = src
            .iter()
            .filter_map(|v| v.as_str()?.strip_prefix(prefix))
            .filter(|s| !s.is_empty())
            .collect();
        if !knocked.is_empty() {
            dest.retain(|v| !v.as_str().is_some_and(|s| knocked.contains(&s)));
            saw_marker = true;
        }
    }

    let incoming: Vec<Value> = src
        .iter()
        .filter(|v| !options.is_knockout_element(v))
        .map(|v| scrub(v, options))
        .collect();

    if options.overwrite_arrays {
        // A sequence made only of markers edits the current one in place.
        if !(saw_marker && incoming.is_empty()) {
            *dest = incoming;
        }
        return;
    }

    for item in incoming {
        if !options.keep_array_duplicates && dest.contains(&item) {
            continue;
        }
        dest.push(item);
    }
}

/// Copy an incoming value, dropping knockout markers that have nothing to
/// act on because the current side is empty.
fn scrub(val: &Value, options: &MergeOptions) -> Value {
    if options.knockout().is_none() {
        return val.clone();
    }
    match val {
        Value::Mapping(map) => Value::Mapping(
            map.iter()
                .filter(|(_, v)| !options.is_knockout(v))
                .map(|(k, v)| (k.clone(), scrub(v, options)))
                .collect(),
        ),
        Value::Sequence(seq) => Value::Sequence(
            seq.iter()
                .filter(|v| !options.is_knockout_element(v))
                .map(|v| scrub(v, options))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn record_leaves(val: &Value, path: &str, observer: &mut dyn MergeObserver) {
    if let Value::Mapping(map) = val {
        for (key, child) in map {
            record_leaves(child, &join(path, key), observer);
        }
    } else {
        observer.assigned(path);
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_owned()
    } else {
        format!("{prefix}.{key}")
    }
}
