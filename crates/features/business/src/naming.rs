//! Name patterns for bulk creation.
//!
//! A pattern is literal text with at most one generator section in square brackets:
//!
//! * `[sequence(a,b)]` expands to every value from `a` to `b`.
//! * `[mirror(a,b)]` expands every value into a `-front` and a `-back` name.
//! * `[multiple-mirror(a,b)]` expands like `sequence`; the first object is later linked to
//!   all the others.
//!
//! Bounds are either both integers (leading zeros set the width) or both single letters of
//! the same case.

use kw_kernel::error::InventoryError;

/// Upper bound of names a single pattern may produce.
pub const MAX_BULK_SIZE: usize = 10_000;

/// How the objects created from a pattern are linked afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorMode {
    None,
    /// Consecutive front/back names form `mirror` pairs.
    Pairs,
    /// The first name is linked with `mirrorMultiple` to each of the others.
    Multiple,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    pub names: Vec<String>,
    pub mirror: MirrorMode,
}

fn invalid(pattern: &str, reason: &str) -> InventoryError {
    InventoryError::invalid(format!("Invalid name pattern '{pattern}': {reason}"))
}

/// # Errors
/// [`InventoryError::InvalidArgument`] for empty or malformed patterns, unknown generators,
/// reversed or mixed bounds and expansions beyond [`MAX_BULK_SIZE`].
pub fn expand(pattern: &str) -> Result<Expansion, InventoryError> {
    let pattern = pattern.trim();
    if pattern.is_empty() {
        return Err(invalid(pattern, "it is empty"));
    }
    let Some(open) = pattern.find('[') else {
        if pattern.contains(']') {
            return Err(invalid(pattern, "unbalanced brackets"));
        }
        return Ok(Expansion { names: vec![pattern.to_owned()], mirror: MirrorMode::None });
    };
    let close = pattern[open..].find(']').map(|i| open + i).ok_or_else(|| invalid(pattern, "unbalanced brackets"))?;
    let (prefix, suffix) = (&pattern[..open], &pattern[close + 1..]);
    if suffix.contains(['[', ']']) || prefix.contains(']') {
        return Err(invalid(pattern, "only one generator section is allowed"));
    }

    let section = &pattern[open + 1..close];
    let (generator, arguments) = section
        .strip_suffix(')')
        .and_then(|s| s.split_once('('))
        .ok_or_else(|| invalid(pattern, "expected generator(start,end)"))?;
    let (start, end) = arguments.split_once(',').ok_or_else(|| invalid(pattern, "expected two bounds"))?;
    let values = range(pattern, start.trim(), end.trim())?;

    let (names, mirror) = match generator.trim() {
        "sequence" => (values.iter().map(|v| format!("{prefix}{v}{suffix}")).collect(), MirrorMode::None),
        "multiple-mirror" => (values.iter().map(|v| format!("{prefix}{v}{suffix}")).collect(), MirrorMode::Multiple),
        "mirror" => {
            if values.len() * 2 > MAX_BULK_SIZE {
                return Err(invalid(pattern, "too many names"));
            }
            let names = values
                .iter()
                .flat_map(|v| [format!("{prefix}{v}-front{suffix}"), format!("{prefix}{v}-back{suffix}")])
                .collect();
            (names, MirrorMode::Pairs)
        },
        other => return Err(invalid(pattern, &format!("unknown generator {other}"))),
    };
    Ok(Expansion { names, mirror })
}

fn range(pattern: &str, start: &str, end: &str) -> Result<Vec<String>, InventoryError> {
    if let (Ok(first), Ok(last)) = (start.parse::<u64>(), end.parse::<u64>()) {
        if first > last {
            return Err(invalid(pattern, "the start is after the end"));
        }
        let count = usize::try_from(last - first + 1).unwrap_or(usize::MAX);
        if count > MAX_BULK_SIZE {
            return Err(invalid(pattern, "too many names"));
        }
        let width = if start.len() > 1 && start.starts_with('0') { start.len() } else { 0 };
        return Ok((first..=last).map(|n| format!("{n:0width$}")).collect());
    }

    let mut letters = start.chars().zip(end.chars());
    match (letters.next(), start.chars().count(), end.chars().count()) {
        (Some((first, last)), 1, 1)
            if first.is_ascii_alphabetic()
                && last.is_ascii_alphabetic()
                && first.is_ascii_lowercase() == last.is_ascii_lowercase() =>
        {
            if first > last {
                return Err(invalid(pattern, "the start is after the end"));
            }
            Ok((first..=last).map(String::from).collect())
        },
        _ => Err(invalid(pattern, "bounds must be two numbers or two letters of the same case")),
    }
}
