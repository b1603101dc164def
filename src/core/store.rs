use crate::domain::model::EmailStore;
use crate::utils::error::Result;
use serde::Serialize;
use serde_json::Value;

impl EmailStore {
    /// 解析磁碟上的 JSON；內容不是 JSON 物件時回傳 `None`
    pub fn from_json_bytes(bytes: &[u8]) -> Option<Self> {
        match serde_json::from_slice::<Value>(bytes) {
            Ok(Value::Object(entries)) => Some(Self::from_entries(entries)),
            Ok(other) => {
                tracing::warn!("Email store is not a JSON object (found {})", json_kind(&other));
                None
            }
            Err(e) => {
                tracing::warn!("Failed to parse email store: {}", e);
                None
            }
        }
    }

    /// 四格縮排的 JSON
    pub fn to_pretty_json(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        self.entries().serialize(&mut serializer)?;
        Ok(buffer)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
