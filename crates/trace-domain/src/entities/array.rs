//! The root `Array` handle: a homogeneous, root-owned result buffer
//! returned by the fetch operations (`spec.md` §6 "`ArrayOut`").
//!
//! The original interface types this by call site (`uint64_t*`,
//! `double*`, fixed-width rows); here a single entity carries whichever
//! primitive tag its producer filled it with and rejects mismatched
//! reads through [`crate::value_objects::data::Data::as_u64`] and its
//! siblings.

use crate::entities::handle::{Handle, HandleId, HandleKind};
use crate::error::Result;
use crate::value_objects::data::Data;
use crate::value_objects::property::Property;

/// A caller-owned, fixed-length result array (`spec.md` §6).
#[derive(Debug, Clone, Default)]
pub struct Array {
    entries: Vec<Data>,
}

impl Array {
    #[must_use]
    pub fn new(entries: Vec<Data>) -> Self {
        Self { entries }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn entries(&self) -> &[Data] {
        &self.entries
    }
}

impl Handle for Array {
    fn kind(&self) -> HandleKind {
        HandleKind::Array
    }

    fn get_u64(&self, property: Property, index: u64) -> Result<u64> {
        match property {
            Property::ArrayCount => Ok(self.entries.len() as u64),
            Property::ArrayEntryIndexed => {
                Self::check_index(index, self.entries.len() as u64)?;
                self.entries[index as usize].as_u64()
            }
            _ => Err(self.reject(property)),
        }
    }

    fn get_f64(&self, property: Property, index: u64) -> Result<f64> {
        match property {
            Property::ArrayEntryIndexed => {
                Self::check_index(index, self.entries.len() as u64)?;
                self.entries[index as usize].as_f64()
            }
            _ => Err(self.reject(property)),
        }
    }

    fn get_string(&self, property: Property, index: u64) -> Result<String> {
        match property {
            Property::ArrayEntryIndexed => {
                Self::check_index(index, self.entries.len() as u64)?;
                self.entries[index as usize].as_str().map(str::to_string)
            }
            _ => Err(self.reject(property)),
        }
    }

    fn get_object(&self, property: Property, index: u64) -> Result<Option<HandleId>> {
        match property {
            Property::ArrayEntryIndexed => {
                Self::check_index(index, self.entries.len() as u64)?;
                self.entries[index as usize].as_object()
            }
            _ => Err(self.reject(property)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_and_indexed_reads_round_trip() {
        let array = Array::new(vec![Data::UInt64(10), Data::UInt64(20)]);
        assert_eq!(array.get_u64(Property::ArrayCount, 0).unwrap(), 2);
        assert_eq!(array.get_u64(Property::ArrayEntryIndexed, 1).unwrap(), 20);
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let array = Array::new(vec![Data::UInt64(10)]);
        assert!(array.get_u64(Property::ArrayEntryIndexed, 5).is_err());
    }

    #[test]
    fn mismatched_tag_read_is_invalid_type() {
        let array = Array::new(vec![Data::String("x".to_string())]);
        assert!(array.get_u64(Property::ArrayEntryIndexed, 0).is_err());
    }
}
