use crate::error::WorkbookError;
pub(super) type Attrs = Vec<(String, String)>;
fn malformed(msg: String) -> WorkbookError {
    WorkbookError::Malformed(msg)
}
pub(super) fn extract_attr(tag: &str, attr_name: &str) -> Option<String> {
    let pattern = format!("{attr_name}=");
    let bytes = tag.as_bytes();
    let mut cursor = 0usize;
    while let Some(rel) = tag[cursor..].find(&pattern) {
        let idx = cursor + rel;
        if idx > 0 {
            let prev = *bytes.get(idx - 1)?;
            if !prev.is_ascii_whitespace() && prev != b'<' {
                cursor = idx + pattern.len();
                continue;
            }
        }
        let quote_idx = idx + pattern.len();
        let quote = *bytes.get(quote_idx)?;
        if quote != b'"' && quote != b'\'' {
            cursor = quote_idx;
            continue;
        }
        let value_start = quote_idx + 1;
        let value_end_rel = tag[value_start..].find(char::from(quote))?;
        let value_end = value_start + value_end_rel;
        return Some(decode_xml_entities(&tag[value_start..value_end]));
    }
    None
}
pub(super) fn find_start_tag(xml: &str, tag_name: &str, from: usize) -> Option<usize> {
    let mut cursor = from.min(xml.len());
    let wanted = local_tag_name(tag_name);
    while let Some(rel) = xml[cursor..].find('<') {
        let start = cursor + rel;
        let rest = xml.get(start + 1..)?;
        if rest.starts_with('/') || rest.starts_with('!') || rest.starts_with('?') {
            cursor = start + 1;
            continue;
        }
        let name_end_rel = rest
            .find(|ch: char| ch.is_ascii_whitespace() || ch == '/' || ch == '>')
            .unwrap_or(rest.len());
        let raw_name = rest.get(..name_end_rel)?;
        if !raw_name.is_empty() && local_tag_name(raw_name) == wanted {
            return Some(start);
        }
        cursor = start + 1;
    }
    None
}
pub(super) fn find_end_tag(xml: &str, tag_name: &str, from: usize) -> Option<usize> {
    let mut cursor = from.min(xml.len());
    let wanted = local_tag_name(tag_name);
    while let Some(rel) = xml[cursor..].find("</") {
        let start = cursor + rel;
        let rest = xml.get(start + 2..)?;
        let name_end_rel = rest
            .find(|ch: char| ch.is_ascii_whitespace() || ch == '>')
            .unwrap_or(rest.len());
        let raw_name = rest.get(..name_end_rel)?;
        if !raw_name.is_empty() && local_tag_name(raw_name) == wanted {
            return Some(start);
        }
        cursor = start + 2;
    }
    None
}
pub(super) fn find_tag_end(xml: &str, tag_start: usize) -> Option<usize> {
    xml.get(tag_start..)
        .and_then(|v| v.find('>'))
        .map(|rel| tag_start + rel)
}
/// Byte spans `[start, end)` of every `<tag_name>` element in `xml`,
/// self-closing or not. Elements of the same name must not nest.
pub(super) fn element_spans(xml: &str, tag_name: &str) -> Result<Vec<(usize, usize)>, WorkbookError> {
    let mut out = Vec::new();
    let mut cursor = 0usize;
    while let Some(start) = find_start_tag(xml, tag_name, cursor) {
        let Some(tag_end) = find_tag_end(xml, start) else {
            return Err(malformed(format!("<{tag_name}> 시작 태그가 닫히지 않았습니다.")));
        };
        if xml[..=tag_end].ends_with("/>") {
            out.push((start, tag_end + 1));
            cursor = tag_end + 1;
            continue;
        }
        let Some(close) = find_end_tag(xml, tag_name, tag_end + 1) else {
            return Err(malformed(format!("</{tag_name}> 종료 태그를 찾지 못했습니다.")));
        };
        let end = xml[close..]
            .find('>')
            .map_or(xml.len(), |rel| close + rel + 1);
        out.push((start, end));
        cursor = end;
    }
    Ok(out)
}
/// Start of the body and start of the closing tag of the first `<tag_name>`
/// container element.
pub(super) fn container_body(xml: &str, tag_name: &str) -> Option<(usize, usize, usize)> {
    let open = find_start_tag(xml, tag_name, 0)?;
    let open_end = find_tag_end(xml, open)?;
    if xml[..=open_end].ends_with("/>") {
        return None;
    }
    let close = find_end_tag(xml, tag_name, open_end + 1)?;
    Some((open, open_end + 1, close))
}
pub(super) fn extract_first_tag_text(xml: &str, tag_name: &str) -> Option<String> {
    let open_pattern = format!("<{tag_name}");
    let open_start = xml.find(&open_pattern)?;
    let open_end = open_start + xml[open_start..].find('>')?;
    let body_start = open_end + 1;
    let close_pattern = format!("</{tag_name}>");
    let close_rel = xml[body_start..].find(&close_pattern)?;
    let body_end = body_start + close_rel;
    Some(xml[body_start..body_end].to_string())
}
pub(super) fn extract_all_tag_text(xml: &str, tag_name: &str) -> Option<String> {
    let mut cursor = 0usize;
    let mut out = String::new();
    while let Some(open_start) = find_start_tag(xml, tag_name, cursor) {
        let open_end = find_tag_end(xml, open_start)?;
        if xml[..=open_end].ends_with("/>") {
            cursor = open_end + 1;
            continue;
        }
        let body_start = open_end + 1;
        let body_end = find_end_tag(xml, tag_name, body_start)?;
        out.push_str(&xml[body_start..body_end]);
        cursor = body_end;
    }
    if out.is_empty() { None } else { Some(out) }
}
pub(super) fn parse_tag_attrs(tag: &str) -> Result<Attrs, WorkbookError> {
    let mut out = Vec::new();
    let Some(lt) = tag.find('<') else {
        return Err(malformed(format!("XML 태그 파싱 실패: '<'를 찾지 못했습니다. tag={tag}")));
    };
    let bytes = tag.as_bytes();
    let mut i = lt + 1;
    while matches!(bytes.get(i), Some(ch) if !ch.is_ascii_whitespace() && *ch != b'>' && *ch != b'/')
    {
        i += 1;
    }
    loop {
        while matches!(bytes.get(i), Some(ch) if ch.is_ascii_whitespace()) {
            i += 1;
        }
        if matches!(bytes.get(i), None | Some(b'>' | b'/')) {
            break;
        }
        let key_start = i;
        while matches!(bytes.get(i), Some(ch) if !ch.is_ascii_whitespace() && *ch != b'=' && *ch != b'>' && *ch != b'/')
        {
            i += 1;
        }
        let key_end = i;
        while matches!(bytes.get(i), Some(ch) if ch.is_ascii_whitespace()) {
            i += 1;
        }
        if bytes.get(i) != Some(&b'=') {
            return Err(malformed(format!("XML 속성 파싱 실패: '='가 필요합니다. tag={tag}")));
        }
        i += 1;
        while matches!(bytes.get(i), Some(ch) if ch.is_ascii_whitespace()) {
            i += 1;
        }
        let Some(&quote) = bytes.get(i).filter(|q| matches!(**q, b'"' | b'\'')) else {
            return Err(malformed(format!(
                "XML 속성 파싱 실패: 속성 값은 quote로 감싸야 합니다. tag={tag}"
            )));
        };
        i += 1;
        let value_start = i;
        while matches!(bytes.get(i), Some(ch) if *ch != quote) {
            i += 1;
        }
        if i >= bytes.len() {
            return Err(malformed(format!(
                "XML 속성 파싱 실패: 닫히지 않은 quote가 있습니다. tag={tag}"
            )));
        }
        let (Some(key), Some(raw_value)) = (tag.get(key_start..key_end), tag.get(value_start..i))
        else {
            return Err(malformed(format!("XML 속성 범위를 계산할 수 없습니다. tag={tag}")));
        };
        out.push((key.to_string(), decode_xml_entities(raw_value)));
        i += 1;
    }
    Ok(out)
}
pub(super) fn attrs_to_xml(attrs: &[(String, String)]) -> String {
    let mut out = String::new();
    for (name, value) in attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&xml_escape_attr(value));
        out.push('"');
    }
    out
}
pub(super) fn get_attr<'a>(attrs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find_map(|(k, v)| if k == name { Some(v.as_str()) } else { None })
}
pub(super) fn set_attr(attrs: &mut Attrs, name: &str, value: String) {
    for (k, v) in attrs.iter_mut() {
        if k == name {
            *v = value;
            return;
        }
    }
    attrs.push((name.to_string(), value));
}
pub(super) fn remove_attr(attrs: &mut Attrs, name: &str) {
    attrs.retain(|(k, _)| k != name);
}
pub(super) fn rewrite_start_tag(element: &str, tag_name: &str, attrs: &[(String, String)]) -> String {
    let Some(tag_end) = element.find('>') else {
        return element.to_string();
    };
    let self_closing = element[..=tag_end].ends_with("/>");
    let mut out = format!("<{tag_name}{}", attrs_to_xml(attrs));
    out.push_str(if self_closing { "/>" } else { ">" });
    out.push_str(&element[tag_end + 1..]);
    out
}
pub(super) fn decode_xml_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut i = 0usize;
    while i < s.len() {
        let rest = &s[i..];
        if rest.starts_with('&')
            && let Some(end_rel) = rest.find(';')
        {
            let end = i + end_rel;
            if end > i + 1
                && let Some(decoded) = decode_single_entity(&s[i + 1..end])
            {
                out.push(decoded);
                i = end + 1;
                continue;
            }
        }
        let mut chars = rest.chars();
        if let Some(ch) = chars.next() {
            out.push(ch);
            i += ch.len_utf8();
        } else {
            break;
        }
    }
    out
}
pub(super) fn xml_escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
pub(super) fn xml_escape_attr(s: &str) -> String {
    xml_escape_text(s)
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
fn decode_single_entity(entity: &str) -> Option<char> {
    match entity {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "amp" => Some('&'),
        _ => decode_numeric_entity(entity),
    }
}
fn decode_numeric_entity(entity: &str) -> Option<char> {
    if let Some(hex) = entity
        .strip_prefix("#x")
        .or_else(|| entity.strip_prefix("#X"))
    {
        return u32::from_str_radix(hex, 16).ok().and_then(char::from_u32);
    }
    if let Some(dec) = entity.strip_prefix('#') {
        return dec.parse::<u32>().ok().and_then(char::from_u32);
    }
    None
}
fn local_tag_name(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}
