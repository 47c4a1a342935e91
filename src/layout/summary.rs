use super::{
    clear::clear_range,
    fill::SummaryBlock,
    group::group_by_company,
    rows::write_value,
};
use crate::{
    address::col_to_name,
    config::FillConfig,
    excel::writer::SheetEditor,
    field::FieldKind,
    item::{CellValue, ParsedItem},
    template::BoundColumn,
};
/// Writes one row per distinct company from `start_row`. Values come from the
/// first item seen for each company; totals are taken as given, not summed.
pub fn build_summary(
    editor: &mut SheetEditor<'_>,
    start_row: u32,
    items: &[ParsedItem],
    columns: &[BoundColumn],
    config: &FillConfig,
) -> Option<SummaryBlock> {
    if columns.is_empty() {
        return None;
    }
    if config.clear_summary {
        let indices: Vec<u32> = columns.iter().map(|c| c.index).collect();
        let end = editor.max_row();
        clear_range(editor, start_row, end, &indices);
    }
    let companies = group_by_company(items, &config.unknown_company);
    let mut last_row = None;
    for (row, group) in (start_row..).zip(&companies) {
        let Some(representative) = group.items.first() else {
            continue;
        };
        for column in columns {
            let value = match column.kind {
                FieldKind::Company => CellValue::Text(group.key.clone()),
                _ => column.kind.extract(representative, &column.display_name),
            };
            write_value(editor, column.index, row, &value, config.strict_write);
        }
        last_row = Some(row);
    }
    tracing::debug!(start_row, companies = companies.len(), "업체별 요약 작성");
    Some(SummaryBlock {
        first_row: start_row,
        last_row: last_row.unwrap_or(start_row),
        companies: companies.into_iter().map(|g| g.key).collect(),
    })
}
