use planfill::{
    config::FillConfig,
    error::{FillError, RegistryError, WorkbookError},
    excel::writer::Workbook,
    item::ParsedItem,
    layout::fill::{FillPhase, fill_template_bytes},
    parser::StaticItemParser,
    registry::{MemoryRegistry, TemplateRegistry},
    service::PlanService,
    template::{ColumnDefinition, Template, TemplateDraft, TemplateMode},
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::{
    collections::BTreeSet,
    io::{Cursor, Write},
};
use uuid::Uuid;
use zip::{ZipWriter, write::SimpleFileOptions};
const SHEET: &str = "작업계획";
const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/></Types>"#;
const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="표지" sheetId="1" r:id="rId1"/><sheet name="작업계획" sheetId="2" r:id="rId2"/></sheets></workbook>"#;
const RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="worksheet" Target="/xl/worksheets/sheet2.xml"/><Relationship Id="rId3" Type="styles" Target="styles.xml"/></Relationships>"#;
const STYLES: &str = r#"<styleSheet><fonts count="1"><font><sz val="11"/></font></fonts><cellXfs count="2"><xf numFmtId="0" fontId="0"/><xf numFmtId="0" fontId="0" borderId="1" applyBorder="1"/></cellXfs></styleSheet>"#;
const SHARED: &str = r#"<sst count="4" uniqueCount="4"><si><t>1. 가설공</t></si><si><t>2. 토공</t></si><si><t>위치</t></si><si><t>업체</t></si></sst>"#;
const COVER: &str = r#"<worksheet><sheetData><row r="1"><c r="A1" t="inlineStr"><is><t>토공 표지</t></is></c></row></sheetData></worksheet>"#;
/// Section 가설공 on row 3, 토공 on row 5, bordered data rows down to 7.
const PLAN: &str = concat!(
    r#"<worksheet><dimension ref="A1:C7"/><sheetData>"#,
    r#"<row r="1"><c r="B1" t="s"><v>2</v></c><c r="H1" t="s"><v>3</v></c></row>"#,
    r#"<row r="3"><c r="A3" t="s"><v>0</v></c><c r="B3" s="1"/><c r="C3" s="1"/></row>"#,
    r#"<row r="5"><c r="A5" t="s"><v>1</v></c><c r="B5" s="1"/><c r="C5" s="1"/></row>"#,
    r#"<row r="6"><c r="B6" s="1"/><c r="C6" s="1"/></row>"#,
    r#"<row r="7"><c r="B7" s="1"/><c r="C7" s="1"/></row>"#,
    r#"</sheetData><pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/></worksheet>"#
);
/// Offset layout: 가설공 on row 3 and 토공 on row 9, each followed by an
/// instruction row.
const GAP_PLAN: &str = concat!(
    r#"<worksheet><dimension ref="A1:C14"/><sheetData>"#,
    r#"<row r="3"><c r="A3" t="s"><v>0</v></c></row>"#,
    r#"<row r="4"><c r="B4" t="inlineStr"><is><t>안내: 측점 기입</t></is></c></row>"#,
    r#"<row r="5"><c r="B5" s="1"/><c r="C5" s="1"/></row>"#,
    r#"<row r="8"><c r="B8" s="1"/><c r="C8" s="1"/></row>"#,
    r#"<row r="9"><c r="A9" t="s"><v>1</v></c></row>"#,
    r#"<row r="10"><c r="B10" t="inlineStr"><is><t>안내: 작업 내용</t></is></c></row>"#,
    r#"<row r="14"><c r="B14" s="1"/><c r="C14" s="1"/></row>"#,
    r#"</sheetData></worksheet>"#
);
fn template_bytes() -> Vec<u8> {
    package(PLAN)
}
fn package(plan: &str) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, body) in [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("xl/workbook.xml", WORKBOOK),
        ("xl/_rels/workbook.xml.rels", RELS),
        ("xl/styles.xml", STYLES),
        ("xl/sharedStrings.xml", SHARED),
        ("xl/worksheets/sheet1.xml", COVER),
        ("xl/worksheets/sheet2.xml", plan),
        ("docProps/app.xml", "<Properties/>"),
    ] {
        writer.start_file(name, SimpleFileOptions::default()).unwrap();
        writer.write_all(body.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}
fn column(key: &str, letter: &str) -> ColumnDefinition {
    ColumnDefinition {
        key: key.to_string(),
        display_name: String::new(),
        column_letter: letter.to_string(),
    }
}
fn draft(mode: TemplateMode, row_offset: i64, columns: Vec<ColumnDefinition>) -> TemplateDraft {
    TemplateDraft {
        name: "주간 작업계획".to_string(),
        mode,
        sheet_name: SHEET.to_string(),
        section_labels: vec!["가설공".to_string(), "토공".to_string(), "부대공".to_string()],
        columns,
        row_offset,
        freeform_instructions: None,
    }
}
fn register(mode: TemplateMode, row_offset: i64, columns: Vec<ColumnDefinition>) -> Template {
    Template::register(draft(mode, row_offset, columns), &template_bytes()).unwrap()
}
fn register_on(source: &[u8], row_offset: i64) -> Template {
    let columns = vec![column("location", "B"), column("content", "C")];
    Template::register(draft(TemplateMode::Offset, row_offset, columns), source).unwrap()
}
fn items(values: Value) -> Vec<ParsedItem> {
    let Value::Array(values) = values else {
        panic!("array expected");
    };
    ParsedItem::from_values(values).unwrap()
}
fn fill(template: &Template, source: &[u8], items: &[ParsedItem]) -> Workbook {
    let (bytes, _) = fill_template_bytes(template, source, items, &FillConfig::default()).unwrap();
    Workbook::open(&bytes).unwrap()
}
fn text(workbook: &Workbook, cell: &str) -> String {
    let (col, row) = planfill::address::parse_cell_ref(cell).unwrap();
    workbook
        .sheet(SHEET)
        .unwrap()
        .display_at(col, row, workbook.shared_strings())
}
fn non_empty_cells(workbook: &Workbook) -> BTreeSet<(u32, u32, String)> {
    workbook
        .sheet(SHEET)
        .unwrap()
        .cell_texts(workbook.shared_strings())
        .filter(|(_, _, t)| !t.is_empty())
        .collect()
}
#[test]
fn registration_locates_sections_on_the_configured_sheet() {
    let template = register(TemplateMode::Standard, 0, vec![column("location", "B")]);
    assert_eq!(template.anchors_by_row(), vec![("가설공", 3), ("토공", 5)], "anchors");
    assert!(!template.sections.contains_key("부대공"), "missing label left for dynamic fill");
    let mut wrong = draft(TemplateMode::Standard, 0, vec![]);
    wrong.sheet_name = "없는시트".to_string();
    let err = Template::register(wrong, &template_bytes()).unwrap_err();
    assert!(matches!(err, FillError::Workbook(WorkbookError::SheetNotFound(_))), "{err}");
}
#[test]
fn standard_mode_writes_at_the_anchor_row() {
    let template = register(TemplateMode::Standard, 0, vec![column("location", "B"), column("content", "C")]);
    let out = fill(&template, &template_bytes(), &items(json!([{"section": "토공", "location": "A1", "content": "굴착"}])));
    assert_eq!(text(&out, "B5"), "A1", "B5");
    assert_eq!(text(&out, "C5"), "굴착", "C5");
    assert_eq!(text(&out, "A5"), "2. 토공", "label kept");
    assert_eq!(out.sheet(SHEET).unwrap().style_at(2, 5), 1, "border style kept");
}
#[test]
fn offset_mode_skips_the_header_rows() {
    let template = register(TemplateMode::Offset, 3, vec![column("location", "B"), column("content", "C")]);
    let out = fill(&template, &template_bytes(), &items(json!([{"section": "토공", "location": "A1", "content": "굴착"}])));
    assert_eq!(text(&out, "B8"), "A1", "B8");
    assert_eq!(text(&out, "C8"), "굴착", "C8");
    assert_eq!(text(&out, "B5"), "", "row 5 untouched");
    assert_eq!(text(&out, "C5"), "", "row 5 untouched");
}
#[test]
fn new_sections_never_land_in_instruction_rows() {
    let plan = PLAN.replace(
        r#"<c r="B6" s="1"/>"#,
        r#"<c r="B6" t="inlineStr"><is><t>안내: 측점 기입</t></is></c>"#,
    );
    let source = package(&plan);
    let template = register_on(&source, 3);
    let parsed = items(json!([{"section": "신규공", "location": "N1"}]));
    let (bytes, report) = fill_template_bytes(&template, &source, &parsed, &FillConfig::default()).unwrap();
    let out = Workbook::open(&bytes).unwrap();
    let block = &report.dynamic[0];
    assert_eq!((block.header_row, block.first_row), (8, 9), "after 토공's instruction rows");
    assert_eq!(text(&out, "B6"), "안내: 측점 기입", "instruction kept");
    assert_eq!(text(&out, "A6"), "", "no header in the gap");
    assert_eq!(text(&out, "A8"), "◆ 신규공", "header");
    assert_eq!(text(&out, "B9"), "N1", "row");
}
#[test]
fn offset_refill_clears_up_to_the_next_header_only() {
    let source = package(GAP_PLAN);
    let template = register_on(&source, 2);
    assert_eq!(template.anchors_by_row(), vec![("가설공", 3), ("토공", 9)], "anchors");
    let long = items(json!([
        {"section": "가설공", "location": "P1", "content": "비계"},
        {"section": "가설공", "location": "P2", "content": "가시설"},
        {"section": "가설공", "location": "P3", "content": "안전망"},
        {"section": "가설공", "location": "P4", "content": "가설도로"},
        {"section": "토공", "location": "E1", "content": "굴착"},
        {"section": "토공", "location": "E2", "content": "성토"},
        {"section": "토공", "location": "E3", "content": "다짐"}
    ]));
    let short = items(json!([
        {"section": "가설공", "location": "P1", "content": "비계"},
        {"section": "토공", "location": "E1", "content": "굴착"}
    ]));
    let (first, report) = fill_template_bytes(&template, &source, &long, &FillConfig::default()).unwrap();
    let block = &report.anchored[0];
    assert_eq!((block.first_row, block.last_row), (5, 8), "가설공 fills up to the 토공 header");
    let filled = Workbook::open(&first).unwrap();
    assert_eq!(text(&filled, "B8"), "P4", "last 가설공 row");
    assert_eq!(text(&filled, "B11"), "E1", "토공 after its instruction rows");
    assert_eq!(text(&filled, "B10"), "안내: 작업 내용", "instruction kept on first fill");
    let refilled = fill(&template, &first, &short);
    assert_eq!(text(&refilled, "B5"), "P1", "first row rewritten");
    assert_eq!(text(&refilled, "B8"), "", "leftover cleared");
    assert_eq!(text(&refilled, "B4"), "안내: 측점 기입", "own instruction kept");
    assert_eq!(text(&refilled, "A9"), "2. 토공", "next header kept");
    assert_eq!(text(&refilled, "B10"), "안내: 작업 내용", "next section's instruction kept");
    assert_eq!(text(&refilled, "B11"), "E1", "토공 data");
    assert_eq!(text(&refilled, "B12"), "", "토공 leftover cleared");
    assert_eq!(
        non_empty_cells(&refilled),
        non_empty_cells(&fill(&template, &source, &short)),
        "same values as a fresh fill"
    );
    assert_eq!(
        non_empty_cells(&fill(&template, &first, &long)),
        non_empty_cells(&filled),
        "idempotent"
    );
}
#[test]
fn unknown_section_gets_a_bold_header_after_anchored_blocks() {
    let template = register(TemplateMode::Standard, 0, vec![column("location", "B"), column("content", "C")]);
    let source = template_bytes();
    let parsed = items(json!([
        {"section": "토공", "location": "A1", "content": "굴착"},
        {"section": "신규공", "location": "N1", "content": "신규 작업"}
    ]));
    let (bytes, report) = fill_template_bytes(&template, &source, &parsed, &FillConfig::default()).unwrap();
    let mut out = Workbook::open(&bytes).unwrap();
    assert_eq!(report.dynamic.len(), 1, "one dynamic block");
    let block = &report.dynamic[0];
    assert_eq!((block.header_row, block.first_row), (6, 7), "right after 토공");
    assert_eq!(text(&out, "A6"), "◆ 신규공", "header");
    assert_eq!(text(&out, "B7"), "N1", "row follows header");
    assert_eq!(text(&out, "B5"), "A1", "anchored block undisturbed");
    assert!(out.editor(SHEET).unwrap().is_bold(1, 6), "bold header");
    assert_eq!(report.phase(), FillPhase::Done, "finished");
}
#[test]
fn summary_has_one_row_per_company() {
    let template = register(
        TemplateMode::Standard,
        0,
        vec![column("location", "B"), column("company", "H"), column("totalPersonnel", "I")],
    );
    let out = fill(
        &template,
        &template_bytes(),
        &items(json!([
            {"section": "가설공", "location": "P1", "company": "A사", "totalPersonnel": 12},
            {"section": "토공", "location": "E1", "company": "A사", "totalPersonnel": 30},
            {"section": "토공", "location": "E2"}
        ])),
    );
    assert_eq!(text(&out, "H3"), "A사", "first company at first anchor");
    assert_eq!(text(&out, "I3"), "12", "representative total");
    assert_eq!(text(&out, "H4"), "Unknown", "no company");
    assert_eq!(text(&out, "H5"), "", "exactly one row per company");
    assert_eq!(text(&out, "H1"), "업체", "header above summary kept");
}
#[test]
fn refilling_leaves_no_residue() {
    let template = register(
        TemplateMode::Standard,
        0,
        vec![column("section", "A"), column("location", "B"), column("content", "C"), column("company", "H")],
    );
    let long = items(json!([
        {"section": "토공", "location": "E1", "content": "굴착", "company": "A사"},
        {"section": "토공", "location": "E2", "content": "성토", "company": "B사"},
        {"section": "토공", "location": "E3", "content": "다짐", "company": "C사"},
        {"section": "신규공", "location": "N1", "content": "신규", "company": "D사"}
    ]));
    let short = items(json!([{"section": "토공", "location": "E1", "content": "굴착", "company": "A사"}]));
    let source = template_bytes();
    let (first, _) = fill_template_bytes(&template, &source, &long, &FillConfig::default()).unwrap();
    let refilled = fill(&template, &first, &short);
    let fresh = fill(&template, &source, &short);
    assert_eq!(non_empty_cells(&refilled), non_empty_cells(&fresh), "same values as a fresh fill");
    let again = fill(&template, &source, &long);
    let twice = {
        let (bytes, _) = fill_template_bytes(&template, &source, &long, &FillConfig::default()).unwrap();
        fill(&template, &bytes, &long)
    };
    assert_eq!(non_empty_cells(&twice), non_empty_cells(&again), "idempotent");
}
#[test]
fn untouched_parts_survive_and_protected_files_are_rejected() {
    let template = register(TemplateMode::Standard, 0, vec![column("location", "B")]);
    let mut out = fill(&template, &template_bytes(), &[]);
    let bold = out.bold_style_for(1).unwrap();
    assert_eq!(out.bold_style_for(1).unwrap(), bold, "cached bold format");
    out.sheet_mut("표지").unwrap().set_style_at(1, 1, bold);
    let out = Workbook::open(&out.into_bytes().unwrap()).unwrap();
    assert_eq!(out.sheet("표지").unwrap().style_at(1, 1), bold, "style persisted");
    assert!(matches!(out.sheet("없음"), Err(WorkbookError::SheetNotFound(_))), "missing sheet");
    assert_eq!(out.sheet_names(), &["표지".to_string(), SHEET.to_string()], "sheet order");
    assert_eq!(
        out.sheet("표지").unwrap().display_at(1, 1, out.shared_strings()),
        "토공 표지",
        "other sheet untouched"
    );
    let mut ole = vec![0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
    ole.resize(512, 0);
    assert!(matches!(Workbook::open(&ole), Err(WorkbookError::Protected(_))), "ole package");
}
#[tokio::test]
async fn service_registers_and_fills_through_the_registry() {
    let registry = MemoryRegistry::new();
    let config = FillConfig::default();
    let service = PlanService::new(&registry, &config);
    let template = service
        .register_template(draft(TemplateMode::Standard, 0, vec![column("location", "B")]), &template_bytes())
        .await
        .unwrap();
    assert_eq!(registry.list().await.unwrap().len(), 1, "stored");
    let parser = StaticItemParser::new(json!({"items": [{"section": "토공", "location": "A1"}]}));
    let filled = service.fill_from_text(template.id, "토공 A1", &parser).await.unwrap();
    assert!(filled.file_name.starts_with("주간 작업계획_"), "{}", filled.file_name);
    assert!(filled.file_name.ends_with(".xlsx"), "{}", filled.file_name);
    let out = Workbook::open(&filled.bytes).unwrap();
    assert_eq!(text(&out, "B5"), "A1", "filled");
    let missing = service.fill_items(Uuid::new_v4(), &[]).await.unwrap_err();
    assert!(
        matches!(missing, FillError::Registry(RegistryError::TemplateNotFound(_))),
        "{missing}"
    );
}
