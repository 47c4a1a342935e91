use crate::{layout::fill::FillReport, template::Template};
use std::path::Path;
pub fn print_summary(template: &Template, report: &FillReport, output: Option<&Path>) {
    println!("\n==== 작업계획서 채우기 요약 ====");
    println!("- 템플릿: {} ({})", template.name, template.id);
    println!("- 시트: {}", template.sheet_name);
    println!("- 작성 항목 수: {}", report.item_count());
    println!("- 고정 구역: {}", report.anchored.len());
    for block in &report.anchored {
        println!(
            "  · {} | 제목 {}행 | {}~{}행 | {}건",
            block.section, block.header_row, block.first_row, block.last_row, block.items
        );
    }
    if !report.dynamic.is_empty() {
        println!("- 추가 구역(템플릿에 없음): {}", report.dynamic.len());
        for block in &report.dynamic {
            println!(
                "  · {} | 제목 {}행 | {}~{}행 | {}건",
                block.section, block.header_row, block.first_row, block.last_row, block.items
            );
        }
    }
    match &report.summary {
        Some(summary) => println!(
            "- 업체별 요약: {}~{}행 ({})",
            summary.first_row,
            summary.last_row,
            summary.companies.join(", ")
        ),
        None => println!("- 업체별 요약: 요약 열 없음"),
    }
    match output {
        Some(path) => println!("- 출력: {}", path.display()),
        None => println!("- 출력: (dry-run) 파일 저장 안 함"),
    }
}
pub fn print_template(template: &Template) {
    println!("{} | {} | {:?} | 시트 {}", template.id, template.name, template.mode, template.sheet_name);
    for (label, row) in template.anchors_by_row() {
        println!("  · {label}: {row}행");
    }
    let missing: Vec<&str> = template
        .section_labels
        .iter()
        .map(String::as_str)
        .filter(|l| !template.sections.contains_key(*l))
        .collect();
    if !missing.is_empty() {
        println!("  · 미발견 구역: {}", missing.join(", "));
    }
}
