use crate::error::{DatabaseError, DatabaseErrorExt};
use crate::tables::Tables;

/// Bumped whenever the table layout changes incompatibly.
pub(crate) const FORMAT_VERSION: u16 = 2;

/// `[format][revision][tables]`, each field postcard encoded.
pub(crate) fn encode(revision: u64, tables: &Tables) -> Result<Vec<u8>, DatabaseError> {
    let mut bytes = postcard::to_allocvec(&FORMAT_VERSION).context("Encoding snapshot header")?;
    bytes.extend(postcard::to_allocvec(&revision).context("Encoding snapshot revision")?);
    bytes.extend(postcard::to_allocvec(tables).context("Encoding inventory tables")?);
    Ok(bytes)
}

pub(crate) fn decode(bytes: &[u8]) -> Result<(u64, Tables), DatabaseError> {
    let (format, rest) =
        postcard::take_from_bytes::<u16>(bytes).context("Decoding snapshot header")?;
    if format != FORMAT_VERSION {
        return Err(DatabaseError::Format {
            message: format!("found format {format}, expected {FORMAT_VERSION}").into(),
            context: None,
        });
    }
    let (revision, rest) =
        postcard::take_from_bytes::<u64>(rest).context("Decoding snapshot revision")?;
    let mut tables: Tables = postcard::from_bytes(rest).context("Decoding inventory tables")?;
    tables.rebuild_indexes();
    Ok((revision, tables))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kw_domain::model::inventory::{BusinessObject, ParentRef};
    use std::collections::BTreeMap;

    #[test]
    fn decoding_restores_indexes() {
        let mut tables = Tables::default();
        tables.objects.insert(BusinessObject {
            id: "r1".to_owned(),
            class_name: "Router".to_owned(),
            name: "core-1".to_owned(),
            parent: ParentRef::Root,
            attributes: BTreeMap::new(),
            creation_date: 1,
        });

        let bytes = encode(7, &tables).unwrap();
        let (revision, restored) = decode(&bytes).unwrap();
        assert_eq!(revision, 7);
        assert_eq!(restored.objects.count_children(&ParentRef::Root), 1);
    }

    #[test]
    fn unknown_format_is_rejected() {
        let mut bytes = postcard::to_allocvec(&(FORMAT_VERSION + 1)).unwrap();
        bytes.extend(postcard::to_allocvec(&0_u64).unwrap());
        assert!(matches!(decode(&bytes), Err(DatabaseError::Format { .. })));
    }
}
