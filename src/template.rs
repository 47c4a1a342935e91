use crate::{
    address::column_letter_to_index,
    error::{FillError, Result},
    excel::writer::Workbook,
    field::FieldKind,
    layout::locate::locate_section,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{info, warn};
use uuid::Uuid;
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemplateMode {
    #[default]
    Standard,
    Offset,
}
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionAnchor {
    pub header_row: u32,
}
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDefinition {
    pub key: String,
    #[serde(default)]
    pub display_name: String,
    pub column_letter: String,
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: Uuid,
    pub name: String,
    pub mode: TemplateMode,
    pub sheet_name: String,
    /// Labels the template was registered with, including ones that were not
    /// found in the workbook.
    #[serde(default)]
    pub section_labels: Vec<String>,
    pub sections: BTreeMap<String, SectionAnchor>,
    pub columns: Vec<ColumnDefinition>,
    #[serde(default)]
    pub row_offset: u32,
    #[serde(default)]
    pub freeform_instructions: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDraft {
    pub name: String,
    #[serde(default)]
    pub mode: TemplateMode,
    pub sheet_name: String,
    pub section_labels: Vec<String>,
    pub columns: Vec<ColumnDefinition>,
    #[serde(default)]
    pub row_offset: i64,
    #[serde(default)]
    pub freeform_instructions: Option<String>,
}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplateEdit {
    pub name: Option<String>,
    pub mode: Option<TemplateMode>,
    pub sheet_name: Option<String>,
    pub section_labels: Option<Vec<String>>,
    pub columns: Option<Vec<ColumnDefinition>>,
    pub row_offset: Option<i64>,
    pub freeform_instructions: Option<String>,
}
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundColumn {
    pub kind: FieldKind,
    pub display_name: String,
    pub letter: String,
    pub index: u32,
}
impl Template {
    pub fn register(draft: TemplateDraft, workbook_bytes: &[u8]) -> Result<Self> {
        let row_offset = validate_draft(&draft)?;
        let workbook = Workbook::open(workbook_bytes)?;
        let sections = derive_sections(&workbook, &draft.sheet_name, &draft.section_labels)?;
        let now = Utc::now();
        let template = Self {
            id: Uuid::new_v4(),
            name: draft.name,
            mode: draft.mode,
            sheet_name: draft.sheet_name,
            section_labels: draft.section_labels,
            sections,
            columns: draft.columns,
            row_offset,
            freeform_instructions: draft.freeform_instructions,
            created_at: now,
            updated_at: now,
        };
        template.warn_duplicate_columns();
        info!(
            id = %template.id,
            name = %template.name,
            anchored = template.sections.len(),
            "템플릿 등록"
        );
        Ok(template)
    }
    /// Applies `changes` and re-derives the section anchors from
    /// `workbook_bytes` (the new upload, or the stored original).
    pub fn edit(&mut self, changes: TemplateEdit, workbook_bytes: &[u8]) -> Result<()> {
        let mut draft = TemplateDraft {
            name: changes.name.unwrap_or_else(|| self.name.clone()),
            mode: changes.mode.unwrap_or(self.mode),
            sheet_name: changes.sheet_name.unwrap_or_else(|| self.sheet_name.clone()),
            section_labels: changes
                .section_labels
                .unwrap_or_else(|| self.section_labels.clone()),
            columns: changes.columns.unwrap_or_else(|| self.columns.clone()),
            row_offset: changes.row_offset.unwrap_or_else(|| i64::from(self.row_offset)),
            freeform_instructions: self.freeform_instructions.clone(),
        };
        if let Some(instructions) = changes.freeform_instructions {
            draft.freeform_instructions = Some(instructions).filter(|s| !s.trim().is_empty());
        }
        let row_offset = validate_draft(&draft)?;
        let workbook = Workbook::open(workbook_bytes)?;
        self.sections = derive_sections(&workbook, &draft.sheet_name, &draft.section_labels)?;
        self.name = draft.name;
        self.mode = draft.mode;
        self.sheet_name = draft.sheet_name;
        self.section_labels = draft.section_labels;
        self.columns = draft.columns;
        self.row_offset = row_offset;
        self.freeform_instructions = draft.freeform_instructions;
        self.updated_at = Utc::now();
        self.warn_duplicate_columns();
        info!(id = %self.id, anchored = self.sections.len(), "템플릿 수정");
        Ok(())
    }
    pub fn anchors_by_row(&self) -> Vec<(&str, u32)> {
        let mut anchors: Vec<(&str, u32)> = self
            .sections
            .iter()
            .map(|(label, anchor)| (label.as_str(), anchor.header_row))
            .collect();
        anchors.sort_by_key(|&(label, row)| (row, label));
        anchors
    }
    pub fn bound_columns(&self) -> Result<Vec<BoundColumn>> {
        self.columns
            .iter()
            .map(|def| -> Result<BoundColumn> {
                Ok(BoundColumn {
                    kind: FieldKind::resolve(&def.key, &def.display_name),
                    display_name: def.display_name.clone(),
                    letter: def.column_letter.trim().to_ascii_uppercase(),
                    index: column_letter_to_index(def.column_letter.trim())?,
                })
            })
            .collect()
    }
    /// Column letters claimed by more than one definition. Such templates are
    /// accepted; the definition listed last wins.
    pub fn duplicate_column_letters(&self) -> Vec<String> {
        let mut seen: HashMap<String, usize> = HashMap::new();
        for def in &self.columns {
            *seen
                .entry(def.column_letter.trim().to_ascii_uppercase())
                .or_default() += 1;
        }
        let mut dupes: Vec<String> = seen
            .into_iter()
            .filter_map(|(letter, n)| (n > 1).then_some(letter))
            .collect();
        dupes.sort();
        dupes
    }
    pub fn section_hints(&self) -> Vec<String> {
        if self.section_labels.is_empty() {
            return self.anchors_by_row().into_iter().map(|(l, _)| l.to_string()).collect();
        }
        self.section_labels.clone()
    }
    fn warn_duplicate_columns(&self) {
        let dupes = self.duplicate_column_letters();
        if !dupes.is_empty() {
            warn!(columns = ?dupes, "같은 열에 여러 필드가 지정되었습니다. 마지막 정의가 적용됩니다.");
        }
    }
}
fn validate_draft(draft: &TemplateDraft) -> Result<u32> {
    if draft.name.trim().is_empty() {
        return Err(FillError::InvalidTemplate("템플릿 이름이 비어 있습니다.".to_string()));
    }
    if draft.sheet_name.trim().is_empty() {
        return Err(FillError::InvalidTemplate("시트 이름이 비어 있습니다.".to_string()));
    }
    for def in &draft.columns {
        column_letter_to_index(def.column_letter.trim())?;
    }
    u32::try_from(draft.row_offset).map_err(|_| {
        FillError::InvalidTemplate(format!(
            "행 오프셋은 0 이상이어야 합니다: {}",
            draft.row_offset
        ))
    })
}
fn derive_sections(
    workbook: &Workbook,
    sheet_name: &str,
    labels: &[String],
) -> Result<BTreeMap<String, SectionAnchor>> {
    let sheet = workbook.sheet(sheet_name)?;
    let mut sections = BTreeMap::new();
    let mut taken: HashMap<u32, &str> = HashMap::new();
    for label in labels.iter().map(|l| l.trim()).filter(|l| !l.is_empty()) {
        let Some(row) = locate_section(sheet, workbook.shared_strings(), label) else {
            warn!(section = label, sheet = sheet_name, "구역 제목을 찾지 못했습니다. 채우기 시 동적 구역으로 처리됩니다.");
            continue;
        };
        if let Some(other) = taken.get(&row) {
            warn!(section = label, row, other = *other, "다른 구역과 같은 행에서 발견되어 제외합니다.");
            continue;
        }
        taken.insert(row, label);
        sections.insert(label.to_string(), SectionAnchor { header_row: row });
    }
    Ok(sections)
}
