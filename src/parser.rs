use crate::{
    error::ParseServiceError,
    item::ParsedItem,
    template::{Template, TemplateMode},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{path::PathBuf, process::Stdio};
use tokio::{io::AsyncWriteExt, process::Command};
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseRequest {
    pub text: String,
    pub section_hints: Vec<String>,
    pub column_hints: Vec<ColumnHint>,
    pub freeform_instructions: Option<String>,
    pub mode: TemplateMode,
}
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnHint {
    pub key: String,
    pub display_name: String,
}
impl ParseRequest {
    pub fn for_template(template: &Template, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            section_hints: template.section_hints(),
            column_hints: template
                .columns
                .iter()
                .map(|c| ColumnHint {
                    key: c.key.clone(),
                    display_name: c.display_name.clone(),
                })
                .collect(),
            freeform_instructions: template.freeform_instructions.clone(),
            mode: template.mode,
        }
    }
}
#[async_trait::async_trait]
pub trait ItemParser: Send + Sync {
    async fn parse(&self, request: &ParseRequest) -> Result<Vec<ParsedItem>, ParseServiceError>;
}
/// Accepts an array of items, a single item object, or an `{"items": [...]}`
/// envelope.
pub fn normalize_response(value: Value) -> Result<Vec<ParsedItem>, ParseServiceError> {
    match value {
        Value::Array(values) => ParsedItem::from_values(values),
        Value::Object(mut map) => match map.remove("items") {
            Some(Value::Array(values)) => ParsedItem::from_values(values),
            Some(other) => Err(ParseServiceError::UnexpectedShape(format!(
                "items가 배열이 아닙니다: {other}"
            ))),
            None => Ok(vec![ParsedItem::from(map)]),
        },
        other => Err(ParseServiceError::UnexpectedShape(format!(
            "배열 또는 객체가 필요합니다: {other}"
        ))),
    }
}
pub fn parse_response_text(text: &str) -> Result<Vec<ParsedItem>, ParseServiceError> {
    let value: Value = serde_json::from_str(text.trim()).map_err(ParseServiceError::NotJson)?;
    normalize_response(value)
}
/// Runs an external program: the request JSON goes to stdin, the item JSON
/// is read from stdout.
#[derive(Debug, Clone)]
pub struct CommandItemParser {
    program: PathBuf,
    args: Vec<String>,
}
impl CommandItemParser {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}
#[async_trait::async_trait]
impl ItemParser for CommandItemParser {
    async fn parse(&self, request: &ParseRequest) -> Result<Vec<ParsedItem>, ParseServiceError> {
        let payload = serde_json::to_vec(request).map_err(ParseServiceError::Request)?;
        let program = self.program.display().to_string();
        let spawn_error = |source| ParseServiceError::Spawn {
            program: program.clone(),
            source,
        };
        tracing::debug!(program = %program, bytes = payload.len(), "파싱 서비스 호출");
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(spawn_error)?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&payload).await.map_err(spawn_error)?;
            stdin.shutdown().await.map_err(spawn_error)?;
        }
        let output = child.wait_with_output().await.map_err(spawn_error)?;
        if !output.status.success() {
            return Err(ParseServiceError::Failed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        let items = parse_response_text(&String::from_utf8_lossy(&output.stdout))?;
        tracing::info!(items = items.len(), "파싱 서비스 응답 수신");
        Ok(items)
    }
}
#[derive(Debug, Clone)]
pub struct StaticItemParser {
    response: Value,
}
impl StaticItemParser {
    pub const fn new(response: Value) -> Self {
        Self { response }
    }
}
#[async_trait::async_trait]
impl ItemParser for StaticItemParser {
    async fn parse(&self, _request: &ParseRequest) -> Result<Vec<ParsedItem>, ParseServiceError> {
        normalize_response(self.response.clone())
    }
}
