use crate::{error::RegistryError, template::Template};
use parking_lot::RwLock;
use std::{
    collections::HashMap,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};
use tokio::fs;
use uuid::Uuid;
#[async_trait::async_trait]
pub trait TemplateRegistry: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Template, RegistryError>;
    async fn put(&self, template: &Template) -> Result<(), RegistryError>;
    async fn list(&self) -> Result<Vec<Template>, RegistryError>;
    async fn delete(&self, id: Uuid) -> Result<(), RegistryError>;
    async fn load_workbook(&self, id: Uuid) -> Result<Vec<u8>, RegistryError>;
    async fn store_workbook(&self, id: Uuid, bytes: &[u8]) -> Result<(), RegistryError>;
}
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    templates: RwLock<HashMap<Uuid, Template>>,
    workbooks: RwLock<HashMap<Uuid, Vec<u8>>>,
}
impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}
#[async_trait::async_trait]
impl TemplateRegistry for MemoryRegistry {
    async fn get(&self, id: Uuid) -> Result<Template, RegistryError> {
        self.templates
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| RegistryError::TemplateNotFound(id.to_string()))
    }
    async fn put(&self, template: &Template) -> Result<(), RegistryError> {
        self.templates.write().insert(template.id, template.clone());
        Ok(())
    }
    async fn list(&self) -> Result<Vec<Template>, RegistryError> {
        let mut out: Vec<Template> = self.templates.read().values().cloned().collect();
        out.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(out)
    }
    async fn delete(&self, id: Uuid) -> Result<(), RegistryError> {
        let removed = self.templates.write().remove(&id);
        self.workbooks.write().remove(&id);
        removed
            .map(|_| ())
            .ok_or_else(|| RegistryError::TemplateNotFound(id.to_string()))
    }
    async fn load_workbook(&self, id: Uuid) -> Result<Vec<u8>, RegistryError> {
        self.workbooks
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| RegistryError::WorkbookNotFound(id.to_string()))
    }
    async fn store_workbook(&self, id: Uuid, bytes: &[u8]) -> Result<(), RegistryError> {
        self.workbooks.write().insert(id, bytes.to_vec());
        Ok(())
    }
}
/// `<root>/<id>.json` holds the template, `<root>/<id>.xlsx` its workbook.
#[derive(Debug, Clone)]
pub struct DirRegistry {
    root: PathBuf,
}
impl DirRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
    pub fn root(&self) -> &Path {
        &self.root
    }
    fn template_path(&self, id: Uuid) -> PathBuf {
        self.root.join(format!("{id}.json"))
    }
    fn workbook_path(&self, id: Uuid) -> PathBuf {
        self.root.join(format!("{id}.xlsx"))
    }
    async fn ensure_root(&self) -> Result<(), RegistryError> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|source| RegistryError::Io {
                path: self.root.clone(),
                source,
            })
    }
}
fn io_error(path: &Path) -> impl FnOnce(io::Error) -> RegistryError + '_ {
    move |source| RegistryError::Io {
        path: path.to_path_buf(),
        source,
    }
}
#[async_trait::async_trait]
impl TemplateRegistry for DirRegistry {
    async fn get(&self, id: Uuid) -> Result<Template, RegistryError> {
        let path = self.template_path(id);
        let text = match fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(RegistryError::TemplateNotFound(id.to_string()));
            }
            Err(e) => return Err(io_error(&path)(e)),
        };
        serde_json::from_str(&text).map_err(|source| RegistryError::Json { path, source })
    }
    async fn put(&self, template: &Template) -> Result<(), RegistryError> {
        self.ensure_root().await?;
        let path = self.template_path(template.id);
        let json = serde_json::to_string_pretty(template).map_err(|source| RegistryError::Json {
            path: path.clone(),
            source,
        })?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).await.map_err(io_error(&tmp))?;
        fs::rename(&tmp, &path).await.map_err(io_error(&path))?;
        tracing::debug!(path = %path.display(), "템플릿 저장");
        Ok(())
    }
    async fn list(&self) -> Result<Vec<Template>, RegistryError> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(io_error(&self.root)(e)),
        };
        let mut out = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_error(&self.root))? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let text = fs::read_to_string(&path).await.map_err(io_error(&path))?;
            match serde_json::from_str::<Template>(&text) {
                Ok(template) => out.push(template),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "템플릿 파일을 읽지 못해 건너뜁니다."),
            }
        }
        out.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(out)
    }
    async fn delete(&self, id: Uuid) -> Result<(), RegistryError> {
        let path = self.template_path(id);
        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(RegistryError::TemplateNotFound(id.to_string()));
            }
            Err(e) => return Err(io_error(&path)(e)),
        }
        let workbook = self.workbook_path(id);
        match fs::remove_file(&workbook).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(io_error(&workbook)(e)),
            _ => Ok(()),
        }
    }
    async fn load_workbook(&self, id: Uuid) -> Result<Vec<u8>, RegistryError> {
        let path = self.workbook_path(id);
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(RegistryError::WorkbookNotFound(id.to_string()))
            }
            Err(e) => Err(io_error(&path)(e)),
        }
    }
    async fn store_workbook(&self, id: Uuid, bytes: &[u8]) -> Result<(), RegistryError> {
        self.ensure_root().await?;
        let path = self.workbook_path(id);
        fs::write(&path, bytes).await.map_err(io_error(&path))
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{SectionAnchor, TemplateMode};
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    fn template(name: &str) -> Template {
        Template {
            id: Uuid::new_v4(),
            name: name.to_string(),
            mode: TemplateMode::Offset,
            sheet_name: "작업계획".to_string(),
            section_labels: vec!["토공".to_string()],
            sections: BTreeMap::from([("토공".to_string(), SectionAnchor { header_row: 5 })]),
            columns: vec![],
            row_offset: 3,
            freeform_instructions: Some("위치는 측점으로".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
    async fn exercise(registry: &dyn TemplateRegistry) {
        let b = template("나 현장");
        let a = template("가 현장");
        registry.put(&b).await.unwrap();
        registry.put(&a).await.unwrap();
        registry.store_workbook(a.id, b"PK-bytes").await.unwrap();
        assert_eq!(registry.get(a.id).await.unwrap(), a, "get");
        let names: Vec<String> = registry.list().await.unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["가 현장", "나 현장"], "sorted by name");
        assert_eq!(registry.load_workbook(a.id).await.unwrap(), b"PK-bytes".to_vec(), "workbook");
        registry.delete(a.id).await.unwrap();
        assert!(matches!(registry.get(a.id).await, Err(RegistryError::TemplateNotFound(_))), "deleted");
        assert!(matches!(registry.load_workbook(a.id).await, Err(RegistryError::WorkbookNotFound(_))), "workbook deleted");
        assert!(matches!(registry.delete(a.id).await, Err(RegistryError::TemplateNotFound(_))), "double delete");
    }
    #[tokio::test]
    async fn memory_registry_roundtrip() {
        exercise(&MemoryRegistry::new()).await;
    }
    #[tokio::test]
    async fn dir_registry_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let registry = DirRegistry::new(dir.path().join("templates"));
        assert_eq!(registry.list().await.unwrap(), vec![], "missing root lists nothing");
        exercise(&registry).await;
    }
}
