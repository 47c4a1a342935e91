use crate::{
    config::FillConfig,
    error::Result,
    item::ParsedItem,
    layout::fill::{FillReport, fill_template_bytes},
    parser::{ItemParser, ParseRequest},
    path_policy::output_file_name,
    registry::TemplateRegistry,
    template::{Template, TemplateDraft, TemplateEdit},
};
use chrono::Local;
use tracing::info;
use uuid::Uuid;
#[derive(Debug, Clone)]
pub struct FilledWorkbook {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub report: FillReport,
}
pub struct PlanService<'a> {
    registry: &'a dyn TemplateRegistry,
    config: &'a FillConfig,
}
impl<'a> PlanService<'a> {
    pub fn new(registry: &'a dyn TemplateRegistry, config: &'a FillConfig) -> Self {
        Self { registry, config }
    }
    pub async fn register_template(
        &self,
        draft: TemplateDraft,
        workbook_bytes: &[u8],
    ) -> Result<Template> {
        let template = Template::register(draft, workbook_bytes)?;
        self.registry.store_workbook(template.id, workbook_bytes).await?;
        self.registry.put(&template).await?;
        Ok(template)
    }
    /// Re-derives the sections from `workbook_bytes` when given, otherwise
    /// from the stored original.
    pub async fn edit_template(
        &self,
        id: Uuid,
        changes: TemplateEdit,
        workbook_bytes: Option<&[u8]>,
    ) -> Result<Template> {
        let mut template = self.registry.get(id).await?;
        let stored;
        let bytes = match workbook_bytes {
            Some(bytes) => bytes,
            None => {
                stored = self.registry.load_workbook(id).await?;
                stored.as_slice()
            }
        };
        template.edit(changes, bytes)?;
        if workbook_bytes.is_some() {
            self.registry.store_workbook(id, bytes).await?;
        }
        self.registry.put(&template).await?;
        Ok(template)
    }
    pub async fn request_for(&self, id: Uuid, text: &str) -> Result<ParseRequest> {
        let template = self.registry.get(id).await?;
        Ok(ParseRequest::for_template(&template, text))
    }
    pub async fn fill_items(&self, id: Uuid, items: &[ParsedItem]) -> Result<FilledWorkbook> {
        let template = self.registry.get(id).await?;
        let workbook = self.registry.load_workbook(id).await?;
        let (bytes, report) = fill_template_bytes(&template, &workbook, items, self.config)?;
        let file_name = output_file_name(&template.name, Local::now().naive_local());
        info!(template = %template.name, file = %file_name, bytes = bytes.len(), "작업계획서 생성");
        Ok(FilledWorkbook {
            file_name,
            bytes,
            report,
        })
    }
    pub async fn fill_from_text(
        &self,
        id: Uuid,
        text: &str,
        parser: &dyn ItemParser,
    ) -> Result<FilledWorkbook> {
        let request = self.request_for(id, text).await?;
        let items = parser.parse(&request).await?;
        self.fill_items(id, &items).await
    }
}
