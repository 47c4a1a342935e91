use super::{
    container::XlsxContainer,
    ooxml::{load_shared_strings, load_sheet_catalog},
    styles::StyleSheet,
    xml::{
        Attrs, attrs_to_xml, container_body, decode_xml_entities, element_spans,
        extract_all_tag_text, extract_first_tag_text, find_end_tag, find_start_tag, find_tag_end,
        get_attr, parse_tag_attrs, remove_attr, rewrite_start_tag, set_attr, xml_escape_attr,
        xml_escape_text,
    },
};
use crate::{
    address::{cell_ref, col_to_name, column_letter_to_index, parse_cell_ref},
    error::{AddressError, WorkbookError},
};
use std::collections::{BTreeMap, HashMap};
/// Worksheet children that must follow `<mergeCells>`, in schema order.
const AFTER_MERGE_CELLS: &[&str] = &[
    "phoneticPr",
    "conditionalFormatting",
    "dataValidations",
    "hyperlinks",
    "printOptions",
    "pageMargins",
    "pageSetup",
    "headerFooter",
    "rowBreaks",
    "colBreaks",
    "customProperties",
    "cellWatches",
    "ignoredErrors",
    "smartTags",
    "drawing",
    "legacyDrawing",
    "legacyDrawingHF",
    "picture",
    "oleObjects",
    "controls",
    "webPublishItems",
    "tableParts",
    "extLst",
];
#[derive(Debug)]
pub struct Workbook {
    container: XlsxContainer,
    shared_strings: Vec<String>,
    styles: StyleSheet,
    sheet_order: Vec<String>,
    sheet_paths: HashMap<String, String>,
    sheets: HashMap<String, Worksheet>,
}
#[derive(Debug, Clone, Default)]
pub struct Worksheet {
    pub prefix: String,
    pub suffix: String,
    pub rows: BTreeMap<u32, Row>,
}
#[derive(Debug, Clone, Default)]
pub struct Row {
    pub attrs: Attrs,
    pub cells: BTreeMap<u32, Cell>,
}
#[derive(Debug, Clone, Default)]
pub struct Cell {
    pub attrs: Attrs,
    pub inner_xml: Option<String>,
}
#[derive(Debug)]
pub struct SheetEditor<'a> {
    sheet: &'a mut Worksheet,
    shared_strings: &'a [String],
    styles: &'a mut StyleSheet,
}
impl Workbook {
    pub fn open(bytes: &[u8]) -> Result<Self, WorkbookError> {
        let container = XlsxContainer::open_bytes(bytes)?;
        let catalog = load_sheet_catalog(&container)?;
        let shared_strings = load_shared_strings(&container)?;
        let styles = StyleSheet::load(&container)?;
        let mut sheet_paths = HashMap::new();
        let mut sheets = HashMap::new();
        for sheet_name in &catalog.sheet_order {
            let Some(sheet_path) = catalog.sheet_name_to_path.get(sheet_name) else {
                continue;
            };
            let xml = container.read_text(sheet_path)?;
            let sheet = Worksheet::parse(&xml)?;
            sheet_paths.insert(sheet_name.clone(), sheet_path.clone());
            sheets.insert(sheet_name.clone(), sheet);
        }
        Ok(Self {
            container,
            shared_strings,
            styles,
            sheet_order: catalog.sheet_order,
            sheet_paths,
            sheets,
        })
    }
    pub fn sheet_names(&self) -> &[String] {
        &self.sheet_order
    }
    pub fn shared_strings(&self) -> &[String] {
        &self.shared_strings
    }
    pub fn sheet(&self, name: &str) -> Result<&Worksheet, WorkbookError> {
        self.sheets
            .get(name)
            .ok_or_else(|| WorkbookError::SheetNotFound(name.to_string()))
    }
    pub fn sheet_mut(&mut self, name: &str) -> Result<&mut Worksheet, WorkbookError> {
        self.sheets
            .get_mut(name)
            .ok_or_else(|| WorkbookError::SheetNotFound(name.to_string()))
    }
    pub fn bold_style_for(&mut self, style_id: u32) -> Result<u32, WorkbookError> {
        self.styles.bold_variant(style_id)
    }
    pub fn editor(&mut self, name: &str) -> Result<SheetEditor<'_>, WorkbookError> {
        let (shared_strings, styles, sheets) =
            (&self.shared_strings, &mut self.styles, &mut self.sheets);
        let sheet = sheets
            .get_mut(name)
            .ok_or_else(|| WorkbookError::SheetNotFound(name.to_string()))?;
        Ok(SheetEditor::new(sheet, shared_strings, styles))
    }
    /// Serializes the workbook. Parts this type never touched are copied
    /// through byte for byte.
    pub fn into_bytes(mut self) -> Result<Vec<u8>, WorkbookError> {
        for (sheet_name, sheet) in &mut self.sheets {
            let Some(path) = self.sheet_paths.get(sheet_name) else {
                continue;
            };
            sheet.update_dimension()?;
            self.container.write_text(path, &sheet.to_xml())?;
        }
        self.styles.save_into(&mut self.container)?;
        self.container.to_bytes()
    }
}
impl Worksheet {
    pub fn parse(xml: &str) -> Result<Self, WorkbookError> {
        let Some(sheet_data_open) = find_start_tag(xml, "sheetData", 0) else {
            return Err(WorkbookError::Malformed(
                "worksheet XML에 <sheetData>가 없습니다.".to_string(),
            ));
        };
        let Some(sheet_data_open_end) = find_tag_end(xml, sheet_data_open) else {
            return Err(WorkbookError::Malformed(
                "worksheet XML의 <sheetData> 시작 태그가 손상되었습니다.".to_string(),
            ));
        };
        if xml[..=sheet_data_open_end].ends_with("/>") {
            let prefix = format!("{}>", xml[..sheet_data_open_end - 1].trim_end());
            let suffix = format!("</sheetData>{}", &xml[sheet_data_open_end + 1..]);
            return Ok(Self {
                prefix,
                suffix,
                rows: BTreeMap::new(),
            });
        }
        let sheet_data_body_start = sheet_data_open_end + 1;
        let Some(sheet_data_close) = find_end_tag(xml, "sheetData", sheet_data_body_start) else {
            return Err(WorkbookError::Malformed(
                "worksheet XML에 </sheetData>가 없습니다.".to_string(),
            ));
        };
        let prefix = xml[..sheet_data_body_start].to_string();
        let body = &xml[sheet_data_body_start..sheet_data_close];
        let suffix = xml[sheet_data_close..].to_string();
        let rows = parse_rows_from_sheet_data(body)?;
        Ok(Self {
            prefix,
            suffix,
            rows,
        })
    }
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.prefix);
        for row in self.rows.values() {
            out.push_str(&row_to_xml(row));
        }
        out.push_str(&self.suffix);
        out
    }
    pub fn display_at(&self, col: u32, row: u32, shared_strings: &[String]) -> String {
        let Some(row_obj) = self.rows.get(&row) else {
            return String::new();
        };
        let Some(cell) = row_obj.cells.get(&col) else {
            return String::new();
        };
        cell_display_value(cell, shared_strings).unwrap_or_default()
    }
    pub fn cell_texts<'a>(
        &'a self,
        shared_strings: &'a [String],
    ) -> impl Iterator<Item = (u32, u32, String)> + 'a {
        self.rows.iter().flat_map(move |(&row, row_obj)| {
            row_obj.cells.iter().filter_map(move |(&col, cell)| {
                cell.inner_xml.as_ref()?;
                cell_display_value(cell, shared_strings).map(|text| (row, col, text))
            })
        })
    }
    pub fn set_string_at(&mut self, col: u32, row: u32, value: &str) {
        let cell = self.get_or_create_cell_mut(col, row);
        set_attr(&mut cell.attrs, "t", "inlineStr".to_string());
        let text = xml_escape_text(value);
        let inner = if needs_xml_space_preserve(value) {
            format!("<is><t xml:space=\"preserve\">{text}</t></is>")
        } else {
            format!("<is><t>{text}</t></is>")
        };
        cell.inner_xml = Some(inner);
    }
    pub fn set_number_at(&mut self, col: u32, row: u32, value: f64) {
        let cell = self.get_or_create_cell_mut(col, row);
        remove_attr(&mut cell.attrs, "t");
        cell.inner_xml = Some(format!("<v>{value}</v>"));
    }
    pub fn set_blank_at(&mut self, col: u32, row: u32) {
        let Some(row_obj) = self.rows.get_mut(&row) else {
            return;
        };
        let Some(cell) = row_obj.cells.get_mut(&col) else {
            return;
        };
        remove_attr(&mut cell.attrs, "t");
        cell.inner_xml = None;
    }
    pub fn style_at(&self, col: u32, row: u32) -> u32 {
        self.rows
            .get(&row)
            .and_then(|r| r.cells.get(&col))
            .and_then(|c| get_attr(&c.attrs, "s"))
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(0)
    }
    pub fn set_style_at(&mut self, col: u32, row: u32, style: u32) {
        let cell = self.get_or_create_cell_mut(col, row);
        set_attr(&mut cell.attrs, "s", style.to_string());
    }
    pub fn max_cell_col(&self) -> u32 {
        self.rows
            .values()
            .flat_map(|row| row.cells.keys().copied())
            .max()
            .unwrap_or(1)
    }
    pub fn max_row(&self) -> u32 {
        self.rows.keys().copied().max().unwrap_or(1)
    }
    pub fn merged_ranges(&self) -> Vec<String> {
        let Some((_, body_start, body_end)) = container_body(&self.suffix, "mergeCells") else {
            return vec![];
        };
        let body = &self.suffix[body_start..body_end];
        element_spans(body, "mergeCell")
            .unwrap_or_default()
            .into_iter()
            .filter_map(|(s, e)| {
                let attrs = parse_tag_attrs(&body[s..e]).ok()?;
                get_attr(&attrs, "ref").map(str::to_string)
            })
            .collect()
    }
    /// Registers `range` (`A1:C1`) as a merged area. Already merged ranges are
    /// left alone.
    pub fn merge_cells(&mut self, range: &str) -> Result<(), WorkbookError> {
        let Some((from, to)) = range.split_once(':') else {
            return Err(AddressError::InvalidAddress(range.to_string()).into());
        };
        let (c1, r1) = parse_cell_ref(from)?;
        let (c2, r2) = parse_cell_ref(to)?;
        let normalized = format!(
            "{}:{}",
            cell_ref(c1.min(c2), r1.min(r2)),
            cell_ref(c1.max(c2), r1.max(r2))
        );
        let mut ranges = self.merged_ranges();
        if ranges.contains(&normalized) {
            return Ok(());
        }
        ranges.push(normalized);
        let mut block = format!("<mergeCells count=\"{}\">", ranges.len());
        for r in &ranges {
            block.push_str(&format!("<mergeCell ref=\"{}\"/>", xml_escape_attr(r)));
        }
        block.push_str("</mergeCells>");
        if let Some(start) = find_start_tag(&self.suffix, "mergeCells", 0) {
            let end = match container_body(&self.suffix, "mergeCells") {
                Some((_, _, close)) => close + "</mergeCells>".len(),
                None => find_tag_end(&self.suffix, start).map_or(self.suffix.len(), |e| e + 1),
            };
            self.suffix.replace_range(start..end, &block);
            return Ok(());
        }
        let insert_at = AFTER_MERGE_CELLS
            .iter()
            .filter_map(|tag| find_start_tag(&self.suffix, tag, 0))
            .min()
            .or_else(|| find_end_tag(&self.suffix, "worksheet", 0))
            .ok_or_else(|| {
                WorkbookError::Malformed("worksheet XML에 </worksheet>가 없습니다.".to_string())
            })?;
        self.suffix.insert_str(insert_at, &block);
        Ok(())
    }
    pub fn update_dimension(&mut self) -> Result<(), WorkbookError> {
        let max_row = self.max_row();
        let max_col = self.max_cell_col();
        let end_ref = format!("{}{}", col_to_name(max_col), max_row);
        self.prefix = update_dimension_ref_xml(&self.prefix, "A1", &end_ref)?;
        Ok(())
    }
    pub fn get_or_create_cell_mut(&mut self, col: u32, row: u32) -> &mut Cell {
        let row_obj = self.rows.entry(row).or_insert_with(|| Row {
            attrs: vec![("r".to_string(), row.to_string())],
            cells: BTreeMap::new(),
        });
        if get_attr(&row_obj.attrs, "r").is_none() {
            set_attr(&mut row_obj.attrs, "r", row.to_string());
        }
        let row_style = row_default_style(&row_obj.attrs);
        row_obj.cells.entry(col).or_insert_with(|| Cell {
            attrs: vec![
                ("r".to_string(), cell_ref(col, row)),
                ("s".to_string(), row_style.to_string()),
            ],
            inner_xml: None,
        })
    }
}
impl<'a> SheetEditor<'a> {
    pub fn new(
        sheet: &'a mut Worksheet,
        shared_strings: &'a [String],
        styles: &'a mut StyleSheet,
    ) -> Self {
        Self {
            sheet,
            shared_strings,
            styles,
        }
    }
    pub fn sheet(&self) -> &Worksheet {
        &*self.sheet
    }
    pub fn shared_strings(&self) -> &[String] {
        self.shared_strings
    }
    pub fn display_at(&self, col: u32, row: u32) -> String {
        self.sheet.display_at(col, row, self.shared_strings)
    }
    pub fn set_text(&mut self, col: u32, row: u32, value: &str) {
        self.sheet.set_string_at(col, row, value);
    }
    pub fn set_number(&mut self, col: u32, row: u32, value: f64) {
        self.sheet.set_number_at(col, row, value);
    }
    pub fn clear(&mut self, col: u32, row: u32) {
        self.sheet.set_blank_at(col, row);
    }
    pub fn set_bold(&mut self, col: u32, row: u32) -> Result<(), WorkbookError> {
        let base = self.sheet.style_at(col, row);
        let bold = self.styles.bold_variant(base)?;
        self.sheet.set_style_at(col, row, bold);
        Ok(())
    }
    pub fn is_bold(&self, col: u32, row: u32) -> bool {
        self.styles.is_bold(self.sheet.style_at(col, row))
    }
    pub fn merge(&mut self, first_col: &str, last_col: &str, row: u32) -> Result<(), WorkbookError> {
        let first = column_letter_to_index(first_col)?;
        let last = column_letter_to_index(last_col)?;
        if first == last {
            return Ok(());
        }
        self.sheet
            .merge_cells(&format!("{}:{}", cell_ref(first, row), cell_ref(last, row)))
    }
    pub fn max_row(&self) -> u32 {
        self.sheet.max_row()
    }
}
fn row_default_style(row_attrs: &[(String, String)]) -> u32 {
    if get_attr(row_attrs, "customFormat").is_some_and(|v| v == "1" || v == "true") {
        get_attr(row_attrs, "s")
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(0)
    } else {
        0
    }
}
fn parse_rows_from_sheet_data(body: &str) -> Result<BTreeMap<u32, Row>, WorkbookError> {
    let mut rows = BTreeMap::new();
    let mut cursor = 0usize;
    while let Some(row_open) = find_start_tag(body, "row", cursor) {
        let Some(row_tag_end) = find_tag_end(body, row_open) else {
            return Err(WorkbookError::Malformed(format!(
                "sheetData row 시작 태그가 손상되었습니다. (offset={row_open})"
            )));
        };
        let row_tag = &body[row_open..=row_tag_end];
        let mut row_attrs = parse_tag_attrs(row_tag)?;
        let row_num = get_attr(&row_attrs, "r")
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or_else(|| rows.keys().last().copied().unwrap_or(0) + 1);
        set_attr(&mut row_attrs, "r", row_num.to_string());
        if row_tag.ends_with("/>") {
            rows.insert(
                row_num,
                Row {
                    attrs: row_attrs,
                    cells: BTreeMap::new(),
                },
            );
            cursor = row_tag_end + 1;
            continue;
        }
        let row_body_start = row_tag_end + 1;
        let Some(row_body_end) = find_end_tag(body, "row", row_body_start) else {
            return Err(WorkbookError::Malformed(format!(
                "sheetData row 종료 태그를 찾지 못했습니다. (row={row_num})"
            )));
        };
        let mut row = Row {
            attrs: row_attrs,
            cells: BTreeMap::new(),
        };
        parse_row_cells(&body[row_body_start..row_body_end], row_num, &mut row)?;
        rows.insert(row_num, row);
        cursor = row_body_end + "</row>".len();
    }
    Ok(rows)
}
fn parse_row_cells(row_body: &str, row_num: u32, row: &mut Row) -> Result<(), WorkbookError> {
    let mut cursor = 0usize;
    let mut next_col = 1u32;
    while let Some(cell_open) = find_start_tag(row_body, "c", cursor) {
        let Some(cell_tag_end) = find_tag_end(row_body, cell_open) else {
            return Err(WorkbookError::Malformed(format!(
                "row 내 cell 시작 태그가 손상되었습니다. (row={row_num}, offset={cell_open})"
            )));
        };
        let cell_tag = &row_body[cell_open..=cell_tag_end];
        let mut attrs = parse_tag_attrs(cell_tag)?;
        let col = get_attr(&attrs, "r")
            .and_then(|v| parse_cell_ref(v).ok().map(|(c, _)| c))
            .unwrap_or(next_col);
        set_attr(&mut attrs, "r", cell_ref(col, row_num));
        if cell_tag.ends_with("/>") {
            row.cells.insert(
                col,
                Cell {
                    attrs,
                    inner_xml: None,
                },
            );
            next_col = col.saturating_add(1);
            cursor = cell_tag_end + 1;
            continue;
        }
        let cell_body_start = cell_tag_end + 1;
        let Some(cell_body_end) = find_end_tag(row_body, "c", cell_body_start) else {
            return Err(WorkbookError::Malformed(format!(
                "row 내 cell 종료 태그를 찾지 못했습니다. (row={row_num}, col={col})"
            )));
        };
        let inner_xml = row_body[cell_body_start..cell_body_end].to_string();
        row.cells.insert(
            col,
            Cell {
                attrs,
                inner_xml: Some(inner_xml),
            },
        );
        next_col = col.saturating_add(1);
        cursor = cell_body_end + "</c>".len();
    }
    Ok(())
}
fn row_to_xml(row: &Row) -> String {
    let mut attrs = row.attrs.clone();
    attrs.sort_by(|a, b| attr_sort_key(&a.0).cmp(&attr_sort_key(&b.0)));
    let mut out = String::new();
    out.push_str("<row");
    out.push_str(&attrs_to_xml(&attrs));
    if row.cells.is_empty() {
        out.push_str("/>");
        return out;
    }
    out.push('>');
    for cell in row.cells.values() {
        out.push_str(&cell_to_xml(cell));
    }
    out.push_str("</row>");
    out
}
fn cell_to_xml(cell: &Cell) -> String {
    let mut attrs = cell.attrs.clone();
    attrs.sort_by(|a, b| attr_sort_key(&a.0).cmp(&attr_sort_key(&b.0)));
    let mut out = String::new();
    out.push_str("<c");
    out.push_str(&attrs_to_xml(&attrs));
    if let Some(inner) = &cell.inner_xml {
        out.push('>');
        out.push_str(inner);
        out.push_str("</c>");
    } else {
        out.push_str("/>");
    }
    out
}
fn attr_sort_key(name: &str) -> (u8, &str) {
    match name {
        "r" => (0, name),
        "s" => (1, name),
        "t" => (2, name),
        _ => (3, name),
    }
}
fn cell_display_value(cell: &Cell, shared_strings: &[String]) -> Option<String> {
    let cell_type = get_attr(&cell.attrs, "t");
    let inner = cell.inner_xml.as_deref().unwrap_or("");
    if matches!(cell_type, Some("inlineStr")) {
        return extract_all_tag_text(inner, "t").map(|v| decode_xml_entities(&v));
    }
    let raw_v = extract_first_tag_text(inner, "v").unwrap_or_default();
    let decoded = decode_xml_entities(&raw_v);
    if matches!(cell_type, Some("s")) {
        let idx = decoded.parse::<usize>().ok()?;
        return shared_strings.get(idx).cloned();
    }
    if matches!(cell_type, Some("b")) {
        return Some(if decoded == "1" {
            "TRUE".to_string()
        } else {
            "FALSE".to_string()
        });
    }
    Some(decoded)
}
fn needs_xml_space_preserve(s: &str) -> bool {
    s.starts_with(' ') || s.ends_with(' ') || s.contains("  ") || s.contains('\n')
}
fn update_dimension_ref_xml(
    prefix_xml: &str,
    start_ref: &str,
    end_ref: &str,
) -> Result<String, WorkbookError> {
    let mut out = prefix_xml.to_string();
    if let Some(dim_pos) = find_start_tag(&out, "dimension", 0)
        && let Some(dim_end) = find_tag_end(&out, dim_pos)
    {
        let tag = out[dim_pos..=dim_end].to_string();
        let mut attrs = parse_tag_attrs(&tag)?;
        set_attr(&mut attrs, "ref", format!("{start_ref}:{end_ref}"));
        out.replace_range(dim_pos..=dim_end, &rewrite_start_tag(&tag, "dimension", &attrs));
    }
    Ok(out)
}
