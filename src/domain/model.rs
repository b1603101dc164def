use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::time::Duration;

/// email store 中 Moodle 來源的固定鍵
pub const MOODLE_SOURCE_KEY: &str = "moodle";

/// 參與者列表單一頁面的解析結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    pub contacts: Vec<String>,
    pub has_next_page: bool,
}

/// 請求之間的隨機等待區間（毫秒，含上下界）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    pub const fn none() -> Self {
        Self::new(0, 0)
    }

    pub fn is_zero(&self) -> bool {
        self.max_ms == 0
    }

    pub fn sample(&self) -> Duration {
        if self.min_ms >= self.max_ms {
            return Duration::from_millis(self.min_ms);
        }
        let ms = rand::thread_rng().gen_range(self.min_ms..=self.max_ms);
        Duration::from_millis(ms)
    }
}

/// 依來源系統分組的 email 紀錄，對應磁碟上的 JSON 物件。
///
/// 只會改動 `moodle` 鍵，其他頂層鍵原樣保留。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmailStore {
    entries: Map<String, Value>,
}

impl EmailStore {
    pub fn new() -> Self {
        let mut store = Self::default();
        store.ensure_source(MOODLE_SOURCE_KEY);
        store
    }

    pub fn from_entries(entries: Map<String, Value>) -> Self {
        let mut store = Self { entries };
        store.ensure_source(MOODLE_SOURCE_KEY);
        store
    }

    pub fn entries(&self) -> &Map<String, Value> {
        &self.entries
    }

    /// 確保來源鍵存在且為字串陣列；非字串項目會被丟棄
    pub fn ensure_source(&mut self, source: &str) {
        let emails = self.emails(source);
        self.entries.insert(
            source.to_string(),
            Value::Array(emails.into_iter().map(Value::String).collect()),
        );
    }

    pub fn emails(&self, source: &str) -> Vec<String> {
        match self.entries.get(source) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// 以集合語意合併新 email，結果依字典序排列
    pub fn merge(&mut self, source: &str, new_emails: &[String]) {
        let merged: BTreeSet<String> = self
            .emails(source)
            .into_iter()
            .chain(new_emails.iter().cloned())
            .collect();

        self.entries.insert(
            source.to_string(),
            Value::Array(merged.into_iter().map(Value::String).collect()),
        );
    }
}
