use serde_json::Error as JsonError;
use std::{io, path::PathBuf, result};
use thiserror::Error;
use toml::de::Error as TomlError;
use zip::result::ZipError;
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("잘못된 셀 주소입니다: {0:?}")]
    InvalidAddress(String),
}
#[derive(Debug, Error)]
pub enum WorkbookError {
    #[error("xlsx 패키지를 열 수 없습니다 (DRM 또는 암호화된 파일일 수 있습니다): {0}")]
    Protected(String),
    #[error("xlsx 압축 처리 실패: {0}")]
    Zip(#[from] ZipError),
    #[error("xlsx 입출력 실패: {0}")]
    Io(#[from] io::Error),
    #[error("xlsx 파트가 없습니다: {0}")]
    MissingPart(String),
    #[error("xlsx 파트가 UTF-8 텍스트가 아닙니다: {0}")]
    NotUtf8(String),
    #[error("허용되지 않는 파트 경로입니다: {0}")]
    InvalidPartPath(String),
    #[error("XML 구조가 손상되었습니다: {0}")]
    Malformed(String),
    #[error("시트를 찾지 못했습니다: {0}")]
    SheetNotFound(String),
    #[error(transparent)]
    Address(#[from] AddressError),
}
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("템플릿을 찾지 못했습니다: {0}")]
    TemplateNotFound(String),
    #[error("템플릿 원본 xlsx를 찾지 못했습니다: {0}")]
    WorkbookNotFound(String),
    #[error("템플릿 저장소 입출력 실패: {} ({source})", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("템플릿 JSON 처리 실패: {} ({source})", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: JsonError,
    },
}
#[derive(Debug, Error)]
pub enum ParseServiceError {
    #[error("파싱 서비스 실행 실패: {program} ({source})")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("파싱 서비스 비정상 종료 (code: {code:?}): {stderr}")]
    Failed { code: Option<i32>, stderr: String },
    #[error("파싱 서비스 응답이 JSON이 아닙니다: {0}")]
    NotJson(#[source] JsonError),
    #[error("파싱 서비스 응답 형식이 올바르지 않습니다: {0}")]
    UnexpectedShape(String),
    #[error("작업 항목 목록이 올바르지 않습니다 ({index}번째 항목): {reason}")]
    MalformedItem { index: usize, reason: String },
    #[error("파싱 요청 직렬화 실패: {0}")]
    Request(#[source] JsonError),
}
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("설정 파일 읽기 실패: {} ({source})", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("설정 파일 형식 오류: {} ({source})", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: TomlError,
    },
    #[error("설정 값 오류: {0}")]
    Invalid(String),
}
#[derive(Debug, Error)]
pub enum FillError {
    #[error(transparent)]
    Address(#[from] AddressError),
    #[error(transparent)]
    Workbook(#[from] WorkbookError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    ParseService(#[from] ParseServiceError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("템플릿 설정 오류: {0}")]
    InvalidTemplate(String),
    #[error("출력 파일 처리 실패: {} ({source})", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("출력 파일명 충돌이 너무 많아 경로를 확정할 수 없습니다: {}", .0.display())]
    OutputConflict(PathBuf),
}
pub type Result<T, E = FillError> = result::Result<T, E>;
