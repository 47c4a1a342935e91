use clap::{Args, Parser, Subcommand, ValueEnum};
use planfill::{
    config::{DEFAULT_REGISTRY_DIR, REGISTRY_ENV},
    template::{ColumnDefinition, TemplateMode},
};
use std::path::PathBuf;
use uuid::Uuid;
#[derive(Debug, Parser)]
#[command(
    name = "planfill",
    version,
    about = "등록된 작업계획서 xlsx 템플릿에 공종별 작업 항목을 채웁니다."
)]
pub struct Cli {
    /// 템플릿 저장 폴더
    #[arg(long, global = true, env = REGISTRY_ENV, default_value = DEFAULT_REGISTRY_DIR)]
    pub registry: PathBuf,
    /// 채우기 설정 파일 (TOML)
    #[arg(long, global = true, default_value = "planfill.toml")]
    pub config: PathBuf,
    /// 디버그 로그 출력
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}
#[derive(Debug, Subcommand)]
pub enum Command {
    /// xlsx 파일을 템플릿으로 등록
    Register(RegisterArgs),
    /// 등록된 템플릿 수정 (구역 위치를 다시 찾음)
    Edit(EditArgs),
    /// 템플릿 목록
    List,
    /// 템플릿 상세 (JSON)
    Show { id: Uuid },
    /// 템플릿 삭제
    Delete { id: Uuid },
    /// 파싱 서비스로 보낼 요청 JSON 출력
    Request {
        id: Uuid,
        #[arg(long)]
        text: PathBuf,
    },
    /// 작업 항목으로 템플릿 채우기
    Fill(FillArgs),
}
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Standard,
    Offset,
}
impl From<ModeArg> for TemplateMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Standard => Self::Standard,
            ModeArg::Offset => Self::Offset,
        }
    }
}
#[derive(Debug, Args)]
pub struct RegisterArgs {
    #[arg(long)]
    pub workbook: PathBuf,
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub sheet: String,
    #[arg(long, value_enum, default_value_t = ModeArg::Standard)]
    pub mode: ModeArg,
    /// 구역 제목 (반복 가능)
    #[arg(long = "section")]
    pub sections: Vec<String>,
    /// `key=열[:표시이름]` 형식 (반복 가능)
    #[arg(long = "column", value_parser = parse_column_spec)]
    pub columns: Vec<ColumnDefinition>,
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub row_offset: i64,
    #[arg(long)]
    pub instructions: Option<String>,
}
#[derive(Debug, Args)]
pub struct EditArgs {
    pub id: Uuid,
    /// 새 xlsx 원본 (없으면 저장된 원본으로 구역을 다시 찾음)
    #[arg(long)]
    pub workbook: Option<PathBuf>,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub sheet: Option<String>,
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,
    #[arg(long = "section")]
    pub sections: Vec<String>,
    #[arg(long = "column", value_parser = parse_column_spec)]
    pub columns: Vec<ColumnDefinition>,
    #[arg(long, allow_negative_numbers = true)]
    pub row_offset: Option<i64>,
    #[arg(long)]
    pub instructions: Option<String>,
}
#[derive(Debug, Args)]
pub struct FillArgs {
    pub id: Uuid,
    /// 작업 항목 JSON 파일 (배열, 단일 객체, {"items": [...]})
    #[arg(long, conflicts_with_all = ["text", "parser_cmd"], required_unless_present = "text")]
    pub items: Option<PathBuf>,
    /// 작업계획 원문 텍스트 파일
    #[arg(long, requires = "parser_cmd")]
    pub text: Option<PathBuf>,
    /// 파싱 서비스 실행 파일 (stdin: 요청 JSON, stdout: 항목 JSON)
    #[arg(long)]
    pub parser_cmd: Option<PathBuf>,
    #[arg(long = "parser-arg", allow_hyphen_values = true)]
    pub parser_args: Vec<String>,
    #[arg(long, conflicts_with = "out_dir")]
    pub output: Option<PathBuf>,
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,
    #[arg(long)]
    pub dry_run: bool,
    /// 요약 대신 채우기 결과를 JSON으로 출력
    #[arg(long)]
    pub json: bool,
}
/// `location=B` or `location=B:위치`.
pub fn parse_column_spec(spec: &str) -> Result<ColumnDefinition, String> {
    let Some((key, rest)) = spec.split_once('=') else {
        return Err(format!("`key=열[:표시이름]` 형식이 아닙니다: {spec}"));
    };
    let (letter, display_name) = rest.split_once(':').unwrap_or((rest, ""));
    let key = key.trim();
    let letter = letter.trim();
    if key.is_empty() || letter.is_empty() {
        return Err(format!("열 정의가 비어 있습니다: {spec}"));
    }
    if !letter.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(format!("열 문자가 올바르지 않습니다: {letter}"));
    }
    Ok(ColumnDefinition {
        key: key.to_string(),
        display_name: display_name.trim().to_string(),
        column_letter: letter.to_ascii_uppercase(),
    })
}
