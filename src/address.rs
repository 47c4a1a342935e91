use crate::error::AddressError;
pub const MAX_COLUMN: u32 = 16_384;
pub fn column_letter_to_index(letter: &str) -> Result<u32, AddressError> {
    let trimmed = letter.trim();
    if trimmed.is_empty() {
        return Err(AddressError::InvalidAddress(letter.to_string()));
    }
    let mut out = 0u32;
    for ch in trimmed.chars() {
        if !ch.is_ascii_alphabetic() {
            return Err(AddressError::InvalidAddress(letter.to_string()));
        }
        let digit = u32::from(ch.to_ascii_uppercase()) - u32::from('A') + 1;
        out = out
            .checked_mul(26)
            .and_then(|v| v.checked_add(digit))
            .filter(|v| *v <= MAX_COLUMN)
            .ok_or_else(|| AddressError::InvalidAddress(letter.to_string()))?;
    }
    Ok(out)
}
/// Converts a 1-based column index back to its name. `0` and anything past
/// `XFD` have no name.
pub fn index_to_column_letter(index: u32) -> Result<String, AddressError> {
    if index == 0 || index > MAX_COLUMN {
        return Err(AddressError::InvalidAddress(index.to_string()));
    }
    Ok(col_to_name(index))
}
pub(crate) fn col_to_name(mut col: u32) -> String {
    let mut rev = Vec::new();
    while col > 0 {
        let rem = (col - 1) % 26;
        rev.push(char::from_u32(u32::from('A') + rem).unwrap_or('A'));
        col = (col - 1) / 26;
    }
    rev.into_iter().rev().collect()
}
pub fn parse_cell_ref(cell_ref: &str) -> Result<(u32, u32), AddressError> {
    let invalid = || AddressError::InvalidAddress(cell_ref.to_string());
    let mut col_s = String::new();
    let mut row_s = String::new();
    for ch in cell_ref.trim().chars() {
        if ch == '$' {
            continue;
        }
        if ch.is_ascii_alphabetic() {
            if !row_s.is_empty() {
                return Err(invalid());
            }
            col_s.push(ch);
        } else if ch.is_ascii_digit() {
            row_s.push(ch);
        } else {
            return Err(invalid());
        }
    }
    if col_s.is_empty() || row_s.is_empty() {
        return Err(invalid());
    }
    let col = column_letter_to_index(&col_s).map_err(|_| invalid())?;
    let row = row_s.parse::<u32>().map_err(|_| invalid())?;
    Ok((col, row))
}
pub fn cell_ref(col: u32, row: u32) -> String {
    format!("{}{row}", col_to_name(col))
}
/// Moves an address down (or up) by `row_delta`, keeping its column.
///
/// Results below row 1 are a caller bug; they saturate at row 0 and are not
/// reported here.
pub fn shift_address(address: &str, row_delta: i64) -> Result<String, AddressError> {
    let (col, row) = parse_cell_ref(address)?;
    let shifted = i64::from(row).saturating_add(row_delta).max(0);
    let row = u32::try_from(shifted).unwrap_or(u32::MAX);
    Ok(cell_ref(col, row))
}
