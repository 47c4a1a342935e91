use crate::excel::writer::SheetEditor;
/// Blanks `columns` over rows `start..=end`. Styles and borders stay; an
/// inverted range is a no-op.
pub fn clear_range(editor: &mut SheetEditor<'_>, start: u32, end: u32, columns: &[u32]) {
    if end < start || columns.is_empty() {
        return;
    }
    tracing::debug!(start, end, columns = columns.len(), "범위 비우기");
    for row in start..=end {
        for &col in columns {
            editor.clear(col, row);
        }
    }
}
