use crate::excel::writer::Worksheet;
/// Row of the first cell, in row then column order, whose displayed text
/// contains `label`. Matching is case-sensitive.
pub fn locate_section(sheet: &Worksheet, shared_strings: &[String], label: &str) -> Option<u32> {
    if label.is_empty() {
        return None;
    }
    sheet
        .cell_texts(shared_strings)
        .find(|(_, _, text)| text.contains(label))
        .map(|(row, _, _)| row)
}
