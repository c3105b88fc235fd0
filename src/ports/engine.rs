/*!
 * 列表差异引擎
 *
 * 纯函数：过滤、排序、差异比较和差异合并。没有共享状态，
 * 相同输入总是得到相同输出，因此可以安全地在后台线程执行。
 */

use std::collections::{HashMap, HashSet};

use super::types::{ListChanges, ListRecord};

/// 按查询词过滤，空查询原样返回
pub fn filter<T: ListRecord>(items: &[T], query: &str) -> Vec<T> {
    if query.is_empty() {
        return items.to_vec();
    }

    let query_lower = query.to_lowercase();
    items
        .iter()
        .filter(|item| item.matches(query, &query_lower))
        .cloned()
        .collect()
}

/// 稳定排序，返回新的列表，不修改输入
pub fn sort<T: ListRecord>(items: &[T], sort_key: &T::SortKey) -> Vec<T> {
    let mut sorted = items.to_vec();
    sorted.sort_by(|a, b| a.compare_by(b, sort_key));
    sorted
}

/// 建立 键 -> 最后一次出现位置 的映射
fn last_positions<T: ListRecord>(items: &[T]) -> HashMap<T::Key, usize> {
    let mut positions = HashMap::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        positions.insert(item.key(), index);
    }
    positions
}

/// 比较两个快照
///
/// - `added`: 新快照中存在、旧快照中不存在的键
/// - `changed`: 两者都存在且值不相等
/// - `removed`: 旧快照中存在、新快照中不存在的键
pub fn diff<T: ListRecord>(old_items: &[T], new_items: &[T]) -> ListChanges<T> {
    let old_positions = last_positions(old_items);
    let new_positions = last_positions(new_items);

    let mut changes = ListChanges::default();

    for (index, item) in new_items.iter().enumerate() {
        let key = item.key();
        if new_positions.get(&key) != Some(&index) {
            continue;
        }
        match old_positions.get(&key) {
            None => changes.added.push(item.clone()),
            Some(&old_index) if old_items[old_index] != *item => {
                changes.changed.push(item.clone())
            }
            Some(_) => {}
        }
    }

    for (index, item) in old_items.iter().enumerate() {
        let key = item.key();
        if old_positions.get(&key) != Some(&index) {
            continue;
        }
        if !new_positions.contains_key(&key) {
            changes.removed.push(item.clone());
        }
    }

    changes
}

/// 把差异合并进当前显示的列表
///
/// 删除 `removed` 的键，原位替换 `changed`，在末尾追加 `added`（已存在的键按替换处理）。
pub fn apply_changes<T: ListRecord>(displayed: &[T], changes: &ListChanges<T>) -> Vec<T> {
    let mut replacements: HashMap<T::Key, &T> = HashMap::new();
    for item in changes.changed.iter().chain(changes.added.iter()) {
        replacements.insert(item.key(), item);
    }
    let removed: HashSet<T::Key> = changes.removed.iter().map(|i| i.key()).collect();

    let mut merged: Vec<T> = Vec::with_capacity(displayed.len() + changes.added.len());
    let mut seen: HashMap<T::Key, usize> = HashMap::new();

    for item in displayed {
        let key = item.key();
        if removed.contains(&key) && !replacements.contains_key(&key) {
            continue;
        }
        let value = replacements
            .get(&key)
            .map(|replacement| (*replacement).clone())
            .unwrap_or_else(|| item.clone());
        match seen.get(&key) {
            Some(&position) => merged[position] = value,
            None => {
                seen.insert(key, merged.len());
                merged.push(value);
            }
        }
    }

    for item in &changes.added {
        let key = item.key();
        if !seen.contains_key(&key) {
            seen.insert(key, merged.len());
            merged.push(item.clone());
        }
    }

    merged
}
