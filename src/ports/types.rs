/*!
 * 列表监控数据类型定义
 *
 * `ListRecord` 描述可以被过滤、排序和差异比较的列表项，
 * `PortInfo` 是端口面板使用的实现。
 */

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::hash::Hash;

/// 可被列表引擎处理的记录
///
/// 同一快照内 `key()` 应当唯一；重复时以最后一次出现为准。
pub trait ListRecord: Clone + PartialEq + Send + 'static {
    /// 跨快照识别同一实体的复合键
    type Key: Eq + Hash + Clone;
    /// 排序字段
    type SortKey;

    fn key(&self) -> Self::Key;

    /// `query` 非空；`query_lower` 为其小写形式
    fn matches(&self, query: &str, query_lower: &str) -> bool;

    fn compare_by(&self, other: &Self, sort_key: &Self::SortKey) -> Ordering;
}

/// 端口信息，字段名与后端序列化格式一致
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortInfo {
    pub port: u16,
    pub protocol: String,
    #[serde(default)]
    pub pid: Option<u32>,
    #[serde(default)]
    pub process_name: Option<String>,
    pub local_address: String,
    pub state: String,
}

impl PortInfo {
    pub fn new(port: u16, protocol: impl Into<String>) -> Self {
        Self {
            port,
            protocol: protocol.into(),
            pid: None,
            process_name: None,
            local_address: String::new(),
            state: String::new(),
        }
    }

    pub fn with_process(mut self, pid: u32, process_name: impl Into<String>) -> Self {
        self.pid = Some(pid);
        self.process_name = Some(process_name.into());
        self
    }

    pub fn with_address(mut self, local_address: impl Into<String>) -> Self {
        self.local_address = local_address.into();
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = state.into();
        self
    }
}

/// 端口复合键 (端口号, 协议)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PortKey {
    pub port: u16,
    pub protocol: String,
}

impl std::fmt::Display for PortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.port, self.protocol)
    }
}

/// 端口排序字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortSortKey {
    Port,
    Protocol,
    Process,
    Address,
}

impl PortSortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            PortSortKey::Port => "port",
            PortSortKey::Protocol => "protocol",
            PortSortKey::Process => "process",
            PortSortKey::Address => "address",
        }
    }
}

impl std::fmt::Display for PortSortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PortSortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "port" => Ok(PortSortKey::Port),
            "protocol" => Ok(PortSortKey::Protocol),
            "process" => Ok(PortSortKey::Process),
            "address" => Ok(PortSortKey::Address),
            _ => Err(format!("未知的排序字段: {}", s)),
        }
    }
}

/// 忽略大小写的字典序，大小写相同时按字节序区分
pub fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

impl ListRecord for PortInfo {
    type Key = PortKey;
    type SortKey = PortSortKey;

    fn key(&self) -> PortKey {
        PortKey {
            port: self.port,
            protocol: self.protocol.clone(),
        }
    }

    fn matches(&self, query: &str, query_lower: &str) -> bool {
        self.port.to_string().contains(query)
            || self
                .process_name
                .as_deref()
                .is_some_and(|name| name.to_lowercase().contains(query_lower))
            || self.local_address.to_lowercase().contains(query_lower)
            || self.protocol.to_lowercase().contains(query_lower)
    }

    fn compare_by(&self, other: &Self, sort_key: &PortSortKey) -> Ordering {
        match sort_key {
            PortSortKey::Port => self.port.cmp(&other.port),
            PortSortKey::Protocol => compare_text(&self.protocol, &other.protocol),
            PortSortKey::Process => compare_text(
                self.process_name.as_deref().unwrap_or_default(),
                other.process_name.as_deref().unwrap_or_default(),
            ),
            PortSortKey::Address => compare_text(&self.local_address, &other.local_address),
        }
    }
}

/// 两个快照之间的差异
///
/// 三个分组互不相交。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListChanges<T> {
    pub added: Vec<T>,
    pub removed: Vec<T>,
    pub changed: Vec<T>,
}

impl<T> ListChanges<T> {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.added.len() + self.removed.len() + self.changed.len()
    }
}

impl<T> Default for ListChanges<T> {
    fn default() -> Self {
        Self {
            added: Vec::new(),
            removed: Vec::new(),
            changed: Vec::new(),
        }
    }
}

pub type PortChanges = ListChanges<PortInfo>;
