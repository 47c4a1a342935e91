use crate::error::WorkbookError;
use std::io::{Cursor, Read, Write};
use zip::{CompressionMethod, ZipArchive, ZipWriter, write::SimpleFileOptions};
const OLE_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const ZIP_SIGNATURE: [u8; 4] = [b'P', b'K', 0x03, 0x04];
const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
#[derive(Debug, Clone, Default)]
pub struct XlsxContainer {
    parts: Vec<(String, Vec<u8>)>,
}
impl XlsxContainer {
    pub fn open_bytes(bytes: &[u8]) -> Result<Self, WorkbookError> {
        ensure_ooxml_package(bytes)?;
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut parts = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().replace('\\', "/");
            let mut data = Vec::new();
            entry.read_to_end(&mut data)?;
            parts.push((name, data));
        }
        let container = Self { parts };
        if !container.has_part(CONTENT_TYPES_PART) {
            return Err(WorkbookError::Protected(format!(
                "{CONTENT_TYPES_PART}가 없는 패키지입니다."
            )));
        }
        Ok(container)
    }
    pub fn has_part(&self, relative_path: &str) -> bool {
        normalize_part_path(relative_path)
            .is_ok_and(|path| self.parts.iter().any(|(name, _)| *name == path))
    }
    pub fn read_text(&self, relative_path: &str) -> Result<String, WorkbookError> {
        let path = normalize_part_path(relative_path)?;
        let Some((_, data)) = self.parts.iter().find(|(name, _)| *name == path) else {
            return Err(WorkbookError::MissingPart(path));
        };
        String::from_utf8(data.clone()).map_err(|_| WorkbookError::NotUtf8(path))
    }
    pub fn write_text(&mut self, relative_path: &str, content: &str) -> Result<(), WorkbookError> {
        let path = normalize_part_path(relative_path)?;
        let data = content.as_bytes().to_vec();
        if let Some(slot) = self.parts.iter_mut().find(|(name, _)| *name == path) {
            slot.1 = data;
        } else {
            self.parts.push((path, data));
        }
        Ok(())
    }
    pub fn to_bytes(&self) -> Result<Vec<u8>, WorkbookError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let opts = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, data) in &self.parts {
            writer.start_file(name.as_str(), opts)?;
            writer.write_all(data)?;
        }
        Ok(writer.finish()?.into_inner())
    }
}
/// Rejects byte streams that cannot be an OOXML package. Encrypted and
/// DRM-wrapped Office files arrive as OLE compound documents instead of ZIP.
pub fn ensure_ooxml_package(bytes: &[u8]) -> Result<(), WorkbookError> {
    if bytes.starts_with(&OLE_SIGNATURE) {
        return Err(WorkbookError::Protected(
            "OLE 복합 문서 형식입니다 (암호화/DRM 보호 파일).".to_string(),
        ));
    }
    if !bytes.starts_with(&ZIP_SIGNATURE) {
        return Err(WorkbookError::Protected(
            "ZIP 형식이 아닌 파일입니다.".to_string(),
        ));
    }
    Ok(())
}
fn normalize_part_path(relative_path: &str) -> Result<String, WorkbookError> {
    let mut segments = Vec::new();
    for segment in relative_path.trim_start_matches('/').split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        if segment == ".." {
            return Err(WorkbookError::InvalidPartPath(relative_path.to_string()));
        }
        segments.push(segment);
    }
    if segments.is_empty() {
        return Err(WorkbookError::InvalidPartPath(relative_path.to_string()));
    }
    Ok(segments.join("/"))
}
#[cfg(test)]
mod tests {
    use super::*;
    fn package(parts: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in parts {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }
    #[test]
    fn ole_and_plain_bytes_are_protected() {
        let mut ole = OLE_SIGNATURE.to_vec();
        ole.extend_from_slice(&[0; 32]);
        assert!(matches!(XlsxContainer::open_bytes(&ole), Err(WorkbookError::Protected(_))), "ole");
        assert!(
            matches!(XlsxContainer::open_bytes(b"name,value\n"), Err(WorkbookError::Protected(_))),
            "csv"
        );
    }
    #[test]
    fn zip_without_content_types_is_protected() {
        let bytes = package(&[("xl/workbook.xml", "<workbook/>")]);
        assert!(matches!(XlsxContainer::open_bytes(&bytes), Err(WorkbookError::Protected(_))), "no content types");
    }
    #[test]
    fn parts_survive_a_rewrite_in_order() {
        let bytes = package(&[(CONTENT_TYPES_PART, "<Types/>"), ("xl/a.xml", "<a/>"), ("docProps/app.xml", "<app/>")]);
        let mut container = XlsxContainer::open_bytes(&bytes).unwrap();
        container.write_text("/xl/a.xml", "<a>1</a>").unwrap();
        let reopened = XlsxContainer::open_bytes(&container.to_bytes().unwrap()).unwrap();
        let names: Vec<&str> = reopened.parts.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec![CONTENT_TYPES_PART, "xl/a.xml", "docProps/app.xml"], "order");
        assert_eq!(reopened.read_text("xl/a.xml").unwrap(), "<a>1</a>", "rewritten part");
        assert!(matches!(reopened.read_text("xl/../x.xml"), Err(WorkbookError::InvalidPartPath(_))), "parent");
        assert!(matches!(reopened.read_text("xl/none.xml"), Err(WorkbookError::MissingPart(_))), "missing");
    }
}
