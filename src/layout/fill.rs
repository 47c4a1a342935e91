use super::{
    clear::clear_range,
    dynamic::{order_sections, write_dynamic_sections},
    group::{Group, group_by_section},
    rows::fill_rows,
    summary::build_summary,
};
use crate::{
    address::column_letter_to_index,
    config::FillConfig,
    error::Result,
    excel::writer::{SheetEditor, Workbook},
    item::ParsedItem,
    template::{BoundColumn, Template, TemplateMode},
};
use serde::Serialize;
use tracing::{debug, info, warn};
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FillPhase {
    Idle,
    SectionsResolved,
    DetailFilled,
    SummaryFilled,
    Done,
}
impl FillPhase {
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::SectionsResolved),
            Self::SectionsResolved => Some(Self::DetailFilled),
            Self::DetailFilled => Some(Self::SummaryFilled),
            Self::SummaryFilled => Some(Self::Done),
            Self::Done => None,
        }
    }
}
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionBlock {
    pub section: String,
    pub header_row: u32,
    pub first_row: u32,
    pub last_row: u32,
    pub items: usize,
}
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryBlock {
    pub first_row: u32,
    pub last_row: u32,
    pub companies: Vec<String>,
}
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FillReport {
    pub anchored: Vec<SectionBlock>,
    pub dynamic: Vec<SectionBlock>,
    pub summary: Option<SummaryBlock>,
    pub phases: Vec<FillPhase>,
}
impl Default for FillReport {
    fn default() -> Self {
        Self {
            anchored: Vec::new(),
            dynamic: Vec::new(),
            summary: None,
            phases: vec![FillPhase::Idle],
        }
    }
}
impl FillReport {
    pub fn phase(&self) -> FillPhase {
        self.phases.last().copied().unwrap_or(FillPhase::Idle)
    }
    fn advance(&mut self) {
        if let Some(next) = self.phase().next() {
            debug!(phase = ?next, "채우기 단계");
            self.phases.push(next);
        }
    }
    pub fn item_count(&self) -> usize {
        self.anchored
            .iter()
            .chain(&self.dynamic)
            .map(|b| b.items)
            .sum()
    }
}
pub fn fill_template_bytes(
    template: &Template,
    workbook_bytes: &[u8],
    items: &[ParsedItem],
    config: &FillConfig,
) -> Result<(Vec<u8>, FillReport)> {
    let mut workbook = Workbook::open(workbook_bytes)?;
    let report = fill_workbook(&mut workbook, template, items, config)?;
    let bytes = workbook.into_bytes()?;
    Ok((bytes, report))
}
pub fn fill_workbook(
    workbook: &mut Workbook,
    template: &Template,
    items: &[ParsedItem],
    config: &FillConfig,
) -> Result<FillReport> {
    let columns = template.bound_columns()?;
    let (summary_columns, detail_columns): (Vec<BoundColumn>, Vec<BoundColumn>) =
        columns.into_iter().partition(|c| c.kind.is_summary());
    let label_column = match detail_columns.iter().find(|c| c.kind.is_section()) {
        Some(c) => c.index,
        None => column_letter_to_index(&config.fallback_label_column)?,
    };
    let mut editor = workbook.editor(&template.sheet_name)?;
    let mut report = FillReport::default();
    let groups = group_by_section(items, &config.unlabeled_section);
    let anchors = template.anchors_by_row();
    let offset = match template.mode {
        TemplateMode::Standard => 0,
        TemplateMode::Offset => template.row_offset,
    };
    report.advance();
    let detail_indices: Vec<u32> = detail_columns.iter().map(|c| c.index).collect();
    let mut used_until = 0u32;
    for (i, &(label, anchor_row)) in anchors.iter().enumerate() {
        let start = anchor_row.saturating_add(offset);
        let section_items: &[&ParsedItem] = groups
            .iter()
            .find(|g| g.key == label)
            .map(|g| g.items.as_slice())
            .unwrap_or_default();
        let count = u32::try_from(section_items.len()).unwrap_or(u32::MAX);
        let needed_end = start.saturating_add(count).saturating_sub(1);
        let end = match anchors.get(i + 1) {
            Some(&(next_label, next_row)) => {
                let end = next_row.saturating_sub(1);
                if count > 0 && needed_end > end {
                    warn!(
                        section = label,
                        next = next_label,
                        rows = count,
                        "구역 데이터가 다음 구역 제목 행을 넘어갑니다."
                    );
                }
                end
            }
            None => editor.max_row().max(needed_end),
        };
        clear_range(&mut editor, start, end, &detail_indices);
        let last = fill_rows(
            &mut editor,
            start,
            section_items,
            &detail_columns,
            config.strict_write,
        );
        used_until = used_until
            .max(start.saturating_sub(1))
            .max(last.unwrap_or(anchor_row));
        if let Some(last_row) = last {
            debug!(section = label, start, last_row, end, "고정 구역 작성");
            report.anchored.push(SectionBlock {
                section: label.to_string(),
                header_row: anchor_row,
                first_row: start,
                last_row,
                items: section_items.len(),
            });
        } else {
            debug!(section = label, start, end, "항목 없는 구역 비움");
        }
    }
    let dynamic_start = if anchors.is_empty() {
        config.default_start_row.for_mode(template.mode)
    } else {
        used_until.saturating_add(1)
    };
    clear_trailing_region(&mut editor, dynamic_start, &detail_indices, label_column, config);
    let dynamic_groups: Vec<Group<'_>> = groups
        .iter()
        .filter(|g| !template.sections.contains_key(&g.key))
        .cloned()
        .collect();
    let dynamic_groups = order_sections(dynamic_groups, &config.section_order);
    report.dynamic = write_dynamic_sections(
        &mut editor,
        &dynamic_groups,
        dynamic_start,
        &detail_columns,
        label_column,
        config,
    )?;
    report.advance();
    let summary_start = anchors.first().map_or_else(
        || config.default_start_row.for_mode(template.mode),
        |&(_, row)| row.saturating_add(offset),
    );
    report.summary = build_summary(&mut editor, summary_start, items, &summary_columns, config);
    report.advance();
    report.advance();
    info!(
        template = %template.name,
        sheet = %template.sheet_name,
        items = items.len(),
        anchored = report.anchored.len(),
        dynamic = report.dynamic.len(),
        "채우기 완료"
    );
    Ok(report)
}
/// Blanks the detail columns below the anchored content and removes headers a
/// previous fill appended there.
fn clear_trailing_region(
    editor: &mut SheetEditor<'_>,
    from: u32,
    detail_columns: &[u32],
    label_column: u32,
    config: &FillConfig,
) {
    let end = editor.max_row();
    clear_range(editor, from, end, detail_columns);
    if from > end || config.header_marker.is_empty() {
        return;
    }
    for row in from..=end {
        if editor
            .display_at(label_column, row)
            .starts_with(&config.header_marker)
        {
            editor.clear(label_column, row);
        }
    }
}
