use super::{fill::SectionBlock, group::Group, rows::fill_rows};
use crate::{
    address::col_to_name,
    config::FillConfig,
    error::WorkbookError,
    excel::writer::SheetEditor,
    template::BoundColumn,
};
use tracing::debug;
pub fn order_sections<'a>(groups: Vec<Group<'a>>, order: &[String]) -> Vec<Group<'a>> {
    let (mut known, rest): (Vec<Group<'a>>, Vec<Group<'a>>) = groups
        .into_iter()
        .partition(|g| order.iter().any(|label| *label == g.key));
    known.sort_by_key(|g| order.iter().position(|label| *label == g.key));
    known.extend(rest);
    known
}
/// Appends each section as a bold `◆ <label>` header followed by its rows,
/// starting at `start_row` and leaving one blank row between sections.
pub fn write_dynamic_sections(
    editor: &mut SheetEditor<'_>,
    groups: &[Group<'_>],
    start_row: u32,
    columns: &[BoundColumn],
    label_column: u32,
    config: &FillConfig,
) -> Result<Vec<SectionBlock>, WorkbookError> {
    let mut blocks = Vec::with_capacity(groups.len());
    let mut cursor = start_row;
    let last_detail_col = columns
        .iter()
        .map(|c| c.index)
        .max()
        .unwrap_or(label_column);
    for group in groups {
        let header_row = cursor;
        let header = format!("{} {}", config.header_marker, group.key);
        editor.set_text(label_column, header_row, &header);
        editor.set_bold(label_column, header_row)?;
        if config.merge_dynamic_headers && last_detail_col > label_column {
            editor.merge(
                &col_to_name(label_column),
                &col_to_name(last_detail_col),
                header_row,
            )?;
        }
        let first_row = header_row.saturating_add(1);
        let last_row = fill_rows(editor, first_row, &group.items, columns, config.strict_write)
            .unwrap_or(header_row);
        debug!(section = %group.key, header_row, first_row, last_row, "동적 구역 작성");
        blocks.push(SectionBlock {
            section: group.key.clone(),
            header_row,
            first_row,
            last_row,
            items: group.items.len(),
        });
        cursor = last_row.saturating_add(2);
    }
    Ok(blocks)
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        excel::{styles::StyleSheet, writer::Worksheet},
        field::FieldKind,
        item::ParsedItem,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;
    const STYLES: &str = r#"<styleSheet><fonts count="1"><font/></fonts><cellXfs count="1"><xf fontId="0"/></cellXfs></styleSheet>"#;
    fn group<'a>(key: &str, items: &'a [ParsedItem]) -> Group<'a> {
        Group {
            key: key.to_string(),
            items: items.iter().collect(),
        }
    }
    #[test]
    fn default_order_first_then_first_seen() {
        let none: Vec<ParsedItem> = vec![];
        let groups = vec![group("신규공", &none), group("포장공", &none), group("기타공", &none), group("토공", &none)];
        let order = FillConfig::default().section_order;
        let keys: Vec<String> = order_sections(groups, &order).into_iter().map(|g| g.key).collect();
        assert_eq!(keys, vec!["토공", "포장공", "신규공", "기타공"], "order");
    }
    #[test]
    fn headers_are_bold_and_rows_follow() {
        let mut sheet = Worksheet::parse("<worksheet><sheetData/><pageMargins/></worksheet>").unwrap();
        let mut styles = StyleSheet::from_xml(STYLES);
        let mut editor = SheetEditor::new(&mut sheet, &[], &mut styles);
        let a = ParsedItem::from_values(vec![json!({"location": "L1"}), json!({"location": "L2"})]).unwrap();
        let b = ParsedItem::from_values(vec![json!({"location": "L3"})]).unwrap();
        let columns = vec![BoundColumn {
            kind: FieldKind::Location,
            display_name: String::new(),
            letter: "C".to_string(),
            index: 3,
        }];
        let config = FillConfig {
            merge_dynamic_headers: true,
            ..FillConfig::default()
        };
        let blocks = write_dynamic_sections(&mut editor, &[group("신규공", &a), group("기타", &b)], 10, &columns, 1, &config).unwrap();
        assert_eq!(editor.display_at(1, 10), "◆ 신규공", "header");
        assert!(editor.is_bold(1, 10), "bold header");
        assert_eq!(editor.display_at(3, 11), "L1", "first row");
        assert_eq!(editor.display_at(3, 12), "L2", "second row");
        assert_eq!(editor.display_at(1, 14), "◆ 기타", "blank separator row");
        assert_eq!(editor.display_at(3, 15), "L3", "next rows");
        assert_eq!((blocks[1].header_row, blocks[1].first_row, blocks[1].last_row), (14, 15, 15), "block");
        assert_eq!(editor.sheet().merged_ranges(), vec!["A10:C10".to_string(), "A14:C14".to_string()], "merged headers");
    }
}
