use crate::item::ParsedItem;
use std::collections::HashMap;
#[derive(Debug, Clone, PartialEq)]
pub struct Group<'a> {
    pub key: String,
    pub items: Vec<&'a ParsedItem>,
}
pub fn group_by_section<'a>(items: &'a [ParsedItem], unlabeled: &str) -> Vec<Group<'a>> {
    group_in_order(items, |item| item.section(), unlabeled)
}
/// Groups items by company (case-sensitive). Items without a company fall
/// into the `unknown` bucket.
pub fn group_by_company<'a>(items: &'a [ParsedItem], unknown: &str) -> Vec<Group<'a>> {
    group_in_order(items, |item| item.company(), unknown)
}
fn group_in_order<'a>(
    items: &'a [ParsedItem],
    key_of: impl Fn(&ParsedItem) -> Option<String>,
    fallback: &str,
) -> Vec<Group<'a>> {
    let mut groups: Vec<Group<'a>> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for item in items {
        let key = key_of(item).unwrap_or_else(|| fallback.to_string());
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push(Group {
                key,
                items: Vec::new(),
            });
            groups.len() - 1
        });
        if let Some(group) = groups.get_mut(slot) {
            group.items.push(item);
        }
    }
    groups
}
