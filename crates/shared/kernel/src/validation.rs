//! Argument guards shared by the slices.

use crate::error::InventoryError;

/// Rejects empty or whitespace-only values.
///
/// # Errors
/// [`InventoryError::InvalidArgument`] naming `what`.
pub fn not_blank<'a>(value: &'a str, what: &str) -> Result<&'a str, InventoryError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(InventoryError::invalid(format!("{what} can not be empty")));
    }
    Ok(trimmed)
}

/// Class and attribute names: ASCII letters, digits, `_` and `-`.
///
/// # Errors
/// [`InventoryError::InvalidArgument`] for empty names or other characters.
pub fn identifier<'a>(value: &'a str, what: &str) -> Result<&'a str, InventoryError> {
    let value = not_blank(value, what)?;
    if value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        Ok(value)
    } else {
        Err(InventoryError::invalid(format!(
            "{what} '{value}' may only contain letters, digits, '_' and '-'"
        )))
    }
}

/// User names additionally allow `.`.
///
/// # Errors
/// [`InventoryError::InvalidArgument`] for empty names or other characters.
pub fn user_name(value: &str) -> Result<&str, InventoryError> {
    let value = not_blank(value, "User name")?;
    if value.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')) {
        Ok(value)
    } else {
        Err(InventoryError::invalid(format!(
            "User name '{value}' may only contain letters, digits, '.', '_' and '-'"
        )))
    }
}

/// Page bounds from a 1-based page number and a page size. `limit <= 0` means no limit.
///
/// # Errors
/// [`InventoryError::InvalidArgument`] when `page` is below 1 while a limit is set.
pub fn page_bounds(page: i64, limit: i64) -> Result<Option<(usize, usize)>, InventoryError> {
    if limit <= 0 {
        return Ok(None);
    }
    if page < 1 {
        return Err(InventoryError::invalid("Page numbers start at 1"));
    }
    let limit = usize::try_from(limit).map_err(|_| InventoryError::invalid("Limit out of range"))?;
    let skip = usize::try_from(page - 1)
        .ok()
        .and_then(|p| p.checked_mul(limit))
        .ok_or_else(|| InventoryError::invalid("Page out of range"))?;
    Ok(Some((skip, limit)))
}

/// Applies [`page_bounds`] to an iterator.
///
/// # Errors
/// See [`page_bounds`].
pub fn paginate<T>(
    items: impl IntoIterator<Item = T>,
    page: i64,
    limit: i64,
) -> Result<Vec<T>, InventoryError> {
    Ok(match page_bounds(page, limit)? {
        Some((skip, take)) => items.into_iter().skip(skip).take(take).collect(),
        None => items.into_iter().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers() {
        assert_eq!(identifier(" Router ", "Class name").unwrap(), "Router");
        assert!(identifier("Fiber Optic", "Class name").is_err());
        assert!(identifier("", "Class name").is_err());
        assert!(user_name("j.doe-2").is_ok());
        assert!(user_name("j doe").is_err());
    }

    #[test]
    fn pages() {
        assert_eq!(paginate(1..=10, 2, 3).unwrap(), vec![4, 5, 6]);
        assert_eq!(paginate(1..=3, 0, 0).unwrap(), vec![1, 2, 3]);
        assert!(paginate(1..=3, 0, 2).is_err());
    }
}
