use super::{
    container::XlsxContainer,
    xml::{
        container_body, element_spans, find_start_tag, find_tag_end, get_attr, parse_tag_attrs,
        rewrite_start_tag, set_attr,
    },
};
use crate::error::WorkbookError;
use std::collections::HashMap;
const STYLES_PART: &str = "xl/styles.xml";
#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    xml: Option<String>,
    dirty: bool,
    bold_cache: HashMap<u32, u32>,
}
impl StyleSheet {
    pub fn load(container: &XlsxContainer) -> Result<Self, WorkbookError> {
        let xml = if container.has_part(STYLES_PART) {
            Some(container.read_text(STYLES_PART)?)
        } else {
            None
        };
        Ok(Self {
            xml,
            dirty: false,
            bold_cache: HashMap::new(),
        })
    }
    pub fn from_xml(xml: &str) -> Self {
        Self {
            xml: Some(xml.to_string()),
            ..Self::default()
        }
    }
    pub fn save_into(&self, container: &mut XlsxContainer) -> Result<(), WorkbookError> {
        match (&self.xml, self.dirty) {
            (Some(xml), true) => container.write_text(STYLES_PART, xml),
            _ => Ok(()),
        }
    }
    /// Index of a cell format identical to `base_xf` except for a bold font.
    /// Without a style part the base index is returned unchanged.
    pub fn bold_variant(&mut self, base_xf: u32) -> Result<u32, WorkbookError> {
        if let Some(&cached) = self.bold_cache.get(&base_xf) {
            return Ok(cached);
        }
        let Some(xml) = self.xml.as_mut() else {
            tracing::warn!("styles.xml이 없어 굵은 글꼴을 적용하지 못했습니다.");
            return Ok(base_xf);
        };
        let (xf_element, xf_count) = nth_element(xml, "cellXfs", "xf", base_xf)?;
        let xf_attrs = parse_tag_attrs(&xf_element)?;
        let font_id = get_attr(&xf_attrs, "fontId")
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(0);
        let (font_element, font_count) = nth_element(xml, "fonts", "font", font_id)?;
        if is_bold_font(&font_element) {
            self.bold_cache.insert(base_xf, base_xf);
            return Ok(base_xf);
        }
        let bold_font = make_bold_font(&font_element);
        append_child(xml, "fonts", &bold_font, font_count + 1)?;
        let mut new_xf_attrs = xf_attrs;
        set_attr(&mut new_xf_attrs, "fontId", font_count.to_string());
        set_attr(&mut new_xf_attrs, "applyFont", "1".to_string());
        let new_xf = rewrite_start_tag(&xf_element, "xf", &new_xf_attrs);
        append_child(xml, "cellXfs", &new_xf, xf_count + 1)?;
        self.dirty = true;
        self.bold_cache.insert(base_xf, xf_count);
        Ok(xf_count)
    }
    pub fn is_bold(&self, xf: u32) -> bool {
        let Some(xml) = self.xml.as_deref() else {
            return false;
        };
        let Ok((xf_element, _)) = nth_element(xml, "cellXfs", "xf", xf) else {
            return false;
        };
        let font_id = parse_tag_attrs(&xf_element)
            .ok()
            .and_then(|attrs| get_attr(&attrs, "fontId").and_then(|v| v.parse::<u32>().ok()))
            .unwrap_or(0);
        nth_element(xml, "fonts", "font", font_id)
            .is_ok_and(|(font, _)| is_bold_font(&font))
    }
}
fn nth_element(
    xml: &str,
    parent: &str,
    child: &str,
    index: u32,
) -> Result<(String, u32), WorkbookError> {
    let Some((_, body_start, body_end)) = container_body(xml, parent) else {
        return Err(WorkbookError::Malformed(format!(
            "styles.xml에 <{parent}>가 없습니다."
        )));
    };
    let body = &xml[body_start..body_end];
    let spans = element_spans(body, child)?;
    let count = u32::try_from(spans.len()).unwrap_or(u32::MAX);
    let picked = usize::try_from(index)
        .ok()
        .and_then(|i| spans.get(i))
        .or_else(|| spans.first());
    let Some(&(start, end)) = picked else {
        return Err(WorkbookError::Malformed(format!(
            "styles.xml의 <{parent}>에 <{child}>가 없습니다."
        )));
    };
    Ok((body[start..end].to_string(), count))
}
fn append_child(
    xml: &mut String,
    parent: &str,
    element: &str,
    new_count: u32,
) -> Result<(), WorkbookError> {
    let Some((open, _, body_end)) = container_body(xml, parent) else {
        return Err(WorkbookError::Malformed(format!(
            "styles.xml에 <{parent}>가 없습니다."
        )));
    };
    xml.insert_str(body_end, element);
    let Some(open_end) = find_tag_end(xml, open) else {
        return Err(WorkbookError::Malformed(format!(
            "<{parent}> 시작 태그가 손상되었습니다."
        )));
    };
    let open_tag = xml[open..=open_end].to_string();
    let mut attrs = parse_tag_attrs(&open_tag)?;
    if attrs.iter().any(|(k, _)| k == "count") {
        set_attr(&mut attrs, "count", new_count.to_string());
        let rewritten = rewrite_start_tag(&open_tag, parent, &attrs);
        xml.replace_range(open..=open_end, &rewritten);
    }
    Ok(())
}
fn is_bold_font(font_element: &str) -> bool {
    let Some(b) = find_start_tag(font_element, "b", 0) else {
        return false;
    };
    let Some(b_end) = find_tag_end(font_element, b) else {
        return false;
    };
    parse_tag_attrs(&font_element[b..=b_end]).is_ok_and(|attrs| {
        !matches!(get_attr(&attrs, "val"), Some("0" | "false"))
    })
}
fn make_bold_font(font_element: &str) -> String {
    let Some(tag_end) = font_element.find('>') else {
        return "<font><b/></font>".to_string();
    };
    if font_element[..=tag_end].ends_with("/>") {
        let open = font_element[..tag_end - 1].trim_end();
        return format!("{open}><b/></font>");
    }
    let mut out = font_element.to_string();
    if let Some(b) = find_start_tag(&out, "b", 0)
        && let Some(b_end) = find_tag_end(&out, b)
    {
        out.replace_range(b..=b_end, "<b/>");
        return out;
    }
    out.insert_str(tag_end + 1, "<b/>");
    out
}
