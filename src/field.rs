use crate::item::{CellValue, ParsedItem, Projection, resource_list, resource_projection, scalar};
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Section,
    Location,
    Content,
    Personnel,
    Equipment,
    PersonnelName,
    PersonnelCount,
    EquipmentName,
    EquipmentCount,
    Company,
    TotalPersonnel,
    TotalEquipment,
    Custom(String),
}
const ALIASES: &[(FieldKind, &[&str])] = &[
    (FieldKind::Section, &["section", "worktype", "category", "공종", "공사종류", "구분"]),
    (FieldKind::Location, &["location", "위치", "장소", "작업위치"]),
    (FieldKind::Content, &["content", "내용", "작업내용", "세부작업"]),
    (FieldKind::Personnel, &["personnel", "인원", "투입인원"]),
    (FieldKind::Equipment, &["equipment", "장비", "투입장비"]),
    (FieldKind::PersonnelName, &["personnelname", "인원명", "직종"]),
    (FieldKind::PersonnelCount, &["personnelcount", "인원수"]),
    (FieldKind::EquipmentName, &["equipmentname", "장비명"]),
    (FieldKind::EquipmentCount, &["equipmentcount", "장비수", "대수"]),
    (FieldKind::Company, &["company", "업체", "업체명", "협력업체"]),
    (FieldKind::TotalPersonnel, &["totalpersonnel", "총인원", "인원합계"]),
    (FieldKind::TotalEquipment, &["totalequipment", "총장비", "장비합계"]),
];
impl FieldKind {
    /// Resolves a column's key, falling back to its display name for legacy
    /// templates. Unknown keys stay custom.
    pub fn resolve(key: &str, display_name: &str) -> Self {
        Self::known(key)
            .or_else(|| Self::known(display_name))
            .unwrap_or_else(|| Self::Custom(key.to_string()))
    }
    fn known(name: &str) -> Option<Self> {
        let needle = name.trim().replace([' ', '_', '-'], "").to_lowercase();
        if needle.is_empty() {
            return None;
        }
        ALIASES
            .iter()
            .find(|(_, names)| names.contains(&needle.as_str()))
            .map(|(kind, _)| kind.clone())
    }
    pub const fn is_summary(&self) -> bool {
        matches!(
            self,
            Self::Company | Self::TotalPersonnel | Self::TotalEquipment
        )
    }
    pub const fn is_section(&self) -> bool {
        matches!(self, Self::Section)
    }
    /// Value of this field on `item`. `display_name` is the secondary lookup
    /// key for custom fields.
    pub fn extract(&self, item: &ParsedItem, display_name: &str) -> CellValue {
        match self {
            Self::Section => scalar(item.lookup("section")),
            Self::Location => scalar(item.lookup("location")),
            Self::Content => scalar(item.lookup("content")),
            Self::Company => scalar(item.lookup("company")),
            Self::TotalPersonnel => scalar(item.lookup("totalPersonnel")),
            Self::TotalEquipment => scalar(item.lookup("totalEquipment")),
            Self::Personnel => resource_list(item.lookup("personnel")),
            Self::Equipment => resource_list(item.lookup("equipment")),
            Self::PersonnelName => resource_projection(item.lookup("personnel"), Projection::Name),
            Self::PersonnelCount => resource_projection(item.lookup("personnel"), Projection::Count),
            Self::EquipmentName => resource_projection(item.lookup("equipment"), Projection::Name),
            Self::EquipmentCount => resource_projection(item.lookup("equipment"), Projection::Count),
            Self::Custom(key) => {
                let by_key = scalar(item.lookup(key));
                if by_key.is_falsy() && !display_name.is_empty() {
                    let by_name = scalar(item.lookup(display_name));
                    if !by_name.is_falsy() {
                        return by_name;
                    }
                }
                by_key
            }
        }
    }
}
