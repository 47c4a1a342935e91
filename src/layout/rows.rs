use crate::{
    address::col_to_name,
    excel::writer::SheetEditor,
    item::{CellValue, ParsedItem},
    template::BoundColumn,
};
/// Writes `items[i]` into row `start_row + i`, one cell per column. Returns
/// the last row used, or `None` when there was nothing to write.
///
/// When several columns share a letter the later definition overwrites the
/// earlier one.
pub fn fill_rows(
    editor: &mut SheetEditor<'_>,
    start_row: u32,
    items: &[&ParsedItem],
    columns: &[BoundColumn],
    strict: bool,
) -> Option<u32> {
    let mut last = None;
    for (row, item) in (start_row..).zip(items) {
        for column in columns {
            let value = column.kind.extract(item, &column.display_name);
            write_value(editor, column.index, row, &value, strict);
        }
        last = Some(row);
    }
    last
}
pub fn write_value(
    editor: &mut SheetEditor<'_>,
    col: u32,
    row: u32,
    value: &CellValue,
    strict: bool,
) -> bool {
    if value.is_falsy() && !strict {
        return false;
    }
    match value {
        CellValue::Blank => editor.clear(col, row),
        CellValue::Number(n) => editor.set_number(col, row, *n),
        CellValue::Text(s) if s.is_empty() => editor.clear(col, row),
        CellValue::Text(_) | CellValue::Bool(_) => editor.set_text(col, row, &value.display()),
    }
    true
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        excel::{styles::StyleSheet, writer::Worksheet},
        field::FieldKind,
    };
    use serde_json::json;
    fn column(kind: FieldKind, index: u32) -> BoundColumn {
        BoundColumn {
            kind,
            display_name: String::new(),
            letter: col_to_name(index),
            index,
        }
    }
    fn items() -> Vec<ParsedItem> {
        ParsedItem::from_values(vec![
            json!({"location": "A1", "content": "굴착", "personnel": [{"name": "보통인부", "count": 4}], "qty": 0}),
            json!({"location": "A2", "content": "", "equipment": ["굴삭기 1"], "qty": 12.5}),
        ])
        .unwrap()
    }
    #[test]
    fn items_fill_consecutive_rows() {
        let mut sheet = Worksheet::parse(r#"<worksheet><sheetData><row r="6"><c r="C6"><v>old</v></c></row></sheetData></worksheet>"#).unwrap();
        let mut styles = StyleSheet::default();
        let mut editor = SheetEditor::new(&mut sheet, &[], &mut styles);
        let items = items();
        let refs: Vec<&ParsedItem> = items.iter().collect();
        let columns = vec![
            column(FieldKind::Location, 2),
            column(FieldKind::Content, 3),
            column(FieldKind::Personnel, 4),
            column(FieldKind::Equipment, 5),
            column(FieldKind::Custom("qty".to_string()), 6),
        ];
        assert_eq!(fill_rows(&mut editor, 5, &refs, &columns, false), Some(6), "last row");
        assert_eq!(editor.display_at(2, 5), "A1", "B5");
        assert_eq!(editor.display_at(3, 5), "굴착", "C5");
        assert_eq!(editor.display_at(4, 5), "보통인부 4", "D5");
        assert_eq!(editor.display_at(5, 6), "굴삭기 1", "legacy E6");
        assert_eq!(editor.display_at(3, 6), "old", "empty content skipped");
        assert_eq!(editor.display_at(6, 5), "", "zero skipped");
        assert_eq!(editor.display_at(6, 6), "12.5", "number");
        assert_eq!(fill_rows(&mut editor, 9, &[], &columns, false), None, "no items");
    }
    #[test]
    fn strict_mode_writes_falsy_values() {
        let mut sheet = Worksheet::parse(r#"<worksheet><sheetData><row r="6"><c r="C6"><v>old</v></c></row></sheetData></worksheet>"#).unwrap();
        let mut styles = StyleSheet::default();
        let mut editor = SheetEditor::new(&mut sheet, &[], &mut styles);
        let items = items();
        let refs: Vec<&ParsedItem> = items.iter().collect();
        let columns = vec![column(FieldKind::Content, 3), column(FieldKind::Custom("qty".to_string()), 6)];
        fill_rows(&mut editor, 5, &refs, &columns, true);
        assert_eq!(editor.display_at(3, 6), "", "empty overwrites");
        assert_eq!(editor.display_at(6, 5), "0", "zero written");
    }
    #[test]
    fn later_duplicate_column_wins() {
        let mut sheet = Worksheet::default();
        sheet.prefix = "<worksheet><sheetData>".to_string();
        sheet.suffix = "</sheetData></worksheet>".to_string();
        let mut styles = StyleSheet::default();
        let mut editor = SheetEditor::new(&mut sheet, &[], &mut styles);
        let items = items();
        let refs: Vec<&ParsedItem> = items.iter().take(1).collect();
        let columns = vec![column(FieldKind::Location, 2), column(FieldKind::Content, 2)];
        fill_rows(&mut editor, 1, &refs, &columns, false);
        assert_eq!(editor.display_at(2, 1), "굴착", "last definition wins");
    }
}
