use crate::error::SealError;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contig {
    pub name: String,
    pub length: u64,
    /// Sum of the lengths of every contig declared before this one
    pub offset: u64,
}

/// Immutable, ordered set of contigs with a name index.
///
/// Built once per job and shared read-only between workers.
#[derive(Debug, Clone)]
pub struct ReferenceAnnotation {
    contigs: Vec<Contig>,
    name_to_id: FxHashMap<String, usize>,
    total_length: u64,
}

impl ReferenceAnnotation {
    /// Build the model from `(name, length)` pairs in declaration order.
    ///
    /// Fails on empty names, zero lengths, or names declared twice.
    pub fn from_contigs<I, S>(contigs: I) -> Result<Self, SealError>
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let mut annotation = ReferenceAnnotation {
            contigs: Vec::new(),
            name_to_id: FxHashMap::default(),
            total_length: 0,
        };

        for (name, length) in contigs {
            let name = name.into();
            if name.is_empty() {
                return Err(SealError::InvalidAnnotation(
                    "Contig with an empty name".to_string(),
                ));
            }
            if length == 0 {
                return Err(SealError::InvalidAnnotation(format!(
                    "Contig '{}' has length 0",
                    name
                )));
            }
            if annotation.name_to_id.contains_key(&name) {
                return Err(SealError::InvalidAnnotation(format!(
                    "Contig '{}' is declared more than once",
                    name
                )));
            }

            let offset = annotation.total_length;
            annotation.total_length = offset.checked_add(length).ok_or_else(|| {
                SealError::InvalidAnnotation(format!(
                    "Total reference length overflows at contig '{}' (length {})",
                    name, length
                ))
            })?;
            let id = annotation.contigs.len();
            annotation.name_to_id.insert(name.clone(), id);
            annotation.contigs.push(Contig {
                name,
                length,
                offset,
            });
        }

        Ok(annotation)
    }

    /// Map a contig name and 1-based local position to an absolute coordinate.
    pub fn absolute_coordinate(&self, name: &str, local_pos: u64) -> Result<u64, SealError> {
        let contig = self
            .get(name)
            .ok_or_else(|| SealError::UnknownContig(name.to_string()))?;
        if local_pos == 0 || local_pos > contig.length {
            return Err(SealError::CoordinateOutOfRange {
                contig: contig.name.clone(),
                position: local_pos,
                length: contig.length,
            });
        }
        Ok(contig.offset + local_pos - 1)
    }

    pub fn total_length(&self) -> u64 {
        self.total_length
    }

    pub fn contigs(&self) -> &[Contig] {
        &self.contigs
    }

    pub fn get(&self, name: &str) -> Option<&Contig> {
        self.name_to_id.get(name).map(|&id| &self.contigs[id])
    }

    pub fn len(&self) -> usize {
        self.contigs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contigs.is_empty()
    }
}
