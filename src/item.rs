use crate::error::ParseServiceError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
/// One structured work item as returned by the parsing service.
///
/// The object is kept as-is so custom fields survive; well-known fields are
/// read through accessors and a missing field reads as empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParsedItem(Map<String, Value>);
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Blank,
    Text(String),
    Number(f64),
    Bool(bool),
}
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    Name,
    Count,
}
impl ParsedItem {
    pub fn from_value(index: usize, value: Value) -> Result<Self, ParseServiceError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(ParseServiceError::MalformedItem {
                index,
                reason: format!("객체가 아닙니다: {other}"),
            }),
        }
    }
    pub fn from_values(values: Vec<Value>) -> Result<Vec<Self>, ParseServiceError> {
        values
            .into_iter()
            .enumerate()
            .map(|(i, v)| Self::from_value(i, v))
            .collect()
    }
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
    pub fn lookup(&self, key: &str) -> Option<&Value> {
        self.0.get(key).or_else(|| {
            self.0
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v)
        })
    }
    pub fn section(&self) -> Option<String> {
        self.lookup("section").and_then(non_empty_text)
    }
    pub fn company(&self) -> Option<String> {
        self.lookup("company").and_then(non_empty_text)
    }
}
impl From<Map<String, Value>> for ParsedItem {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
impl CellValue {
    /// Zero, empty text, `false` and missing values are not written unless
    /// strict writes are enabled.
    pub fn is_falsy(&self) -> bool {
        match self {
            Self::Blank => true,
            Self::Text(s) => s.is_empty(),
            Self::Number(n) => *n == 0.0 || n.is_nan(),
            Self::Bool(b) => !b,
        }
    }
    pub fn display(&self) -> String {
        match self {
            Self::Blank => String::new(),
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
            Self::Bool(true) => "TRUE".to_string(),
            Self::Bool(false) => "FALSE".to_string(),
        }
    }
}
pub fn scalar(value: Option<&Value>) -> CellValue {
    match value {
        None | Some(Value::Null) => CellValue::Blank,
        Some(Value::String(s)) => CellValue::Text(s.trim().to_string()),
        Some(Value::Number(n)) => n.as_f64().map_or(CellValue::Blank, CellValue::Number),
        Some(Value::Bool(b)) => CellValue::Bool(*b),
        Some(Value::Array(_)) => resource_list(value),
        Some(Value::Object(obj)) => CellValue::Text(Value::Object(obj.clone()).to_string()),
    }
}
/// `[{name, count}]` renders as `"name count, name count"`; the legacy
/// string and string-array forms are joined as they are.
pub fn resource_list(value: Option<&Value>) -> CellValue {
    match value {
        Some(Value::Array(entries)) => {
            let joined = entries
                .iter()
                .filter_map(render_resource_entry)
                .collect::<Vec<_>>()
                .join(", ");
            CellValue::Text(joined)
        }
        Some(Value::String(s)) => CellValue::Text(s.trim().to_string()),
        None | Some(Value::Null) => CellValue::Blank,
        other => scalar(other),
    }
}
/// Name-only or count-only view of a resource array, joined by `", "`.
/// Legacy string entries only carry a name.
pub fn resource_projection(value: Option<&Value>, projection: Projection) -> CellValue {
    let pieces: Vec<String> = match value {
        Some(Value::Array(entries)) => entries
            .iter()
            .filter_map(|entry| match (entry, projection) {
                (Value::Object(obj), Projection::Name) => obj.get("name").and_then(non_empty_text),
                (Value::Object(obj), Projection::Count) => obj.get("count").and_then(non_empty_text),
                (Value::String(s), Projection::Name) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) if projection == Projection::Name => {
            return CellValue::Text(s.trim().to_string());
        }
        _ => return CellValue::Blank,
    };
    CellValue::Text(pieces.join(", "))
}
fn render_resource_entry(entry: &Value) -> Option<String> {
    match entry {
        Value::Object(obj) => {
            let name = obj.get("name").and_then(non_empty_text);
            let count = obj.get("count").and_then(non_empty_text);
            match (name, count) {
                (Some(n), Some(c)) => Some(format!("{n} {c}")),
                (Some(n), None) => Some(n),
                (None, Some(c)) => Some(c),
                (None, None) => None,
            }
        }
        Value::Null => None,
        other => non_empty_text(other),
    }
}
fn non_empty_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    if text.is_empty() { None } else { Some(text) }
}
#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    #[test]
    fn resources_render_name_and_count() {
        let v = json!([{"name": "보통인부", "count": 3}, {"name": "굴삭기", "count": "1대"}, {"name": "신호수"}]);
        assert_eq!(resource_list(Some(&v)), CellValue::Text("보통인부 3, 굴삭기 1대, 신호수".to_string()), "objects");
        let legacy = json!(["목공 2", "철근공"]);
        assert_eq!(resource_list(Some(&legacy)), CellValue::Text("목공 2, 철근공".to_string()), "string array");
        assert_eq!(resource_list(Some(&json!("반장 1"))), CellValue::Text("반장 1".to_string()), "plain string");
        assert_eq!(resource_list(None), CellValue::Blank, "missing");
    }
    #[test]
    fn projections_split_names_and_counts() {
        let v = json!([{"name": "보통인부", "count": 3}, {"name": "굴삭기", "count": 1}, "목공"]);
        assert_eq!(resource_projection(Some(&v), Projection::Name), CellValue::Text("보통인부, 굴삭기, 목공".to_string()), "names");
        assert_eq!(resource_projection(Some(&v), Projection::Count), CellValue::Text("3, 1".to_string()), "counts");
        assert_eq!(resource_projection(Some(&json!("목공")), Projection::Count), CellValue::Blank, "legacy count");
    }
    #[test]
    fn falsy_values() {
        assert!(scalar(Some(&json!(0))).is_falsy(), "zero");
        assert!(scalar(Some(&json!(""))).is_falsy(), "empty");
        assert!(scalar(Some(&json!(false))).is_falsy(), "false");
        assert!(scalar(None).is_falsy(), "missing");
        assert!(!scalar(Some(&json!(12))).is_falsy(), "number");
        assert_eq!(scalar(Some(&json!(12))).display(), "12", "integral display");
    }
    #[test]
    fn items_must_be_objects() {
        let items = ParsedItem::from_values(vec![json!({"section": " 토공 ", "Company": "A사"})]).unwrap();
        assert_eq!(items[0].section().as_deref(), Some("토공"), "trimmed section");
        assert_eq!(items[0].company().as_deref(), Some("A사"), "case-insensitive key");
        let err = ParsedItem::from_values(vec![json!({}), json!("토공")]).unwrap_err();
        assert!(matches!(err, ParseServiceError::MalformedItem { index: 1, .. }), "index: {err}");
    }
}
