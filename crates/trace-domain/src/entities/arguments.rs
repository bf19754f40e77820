//! The dynamic property bag used to unpack table/summary query parameters
//! (`spec.md` §9 "Dynamic property bag on Arguments"; supplemented from
//! `rocprofvis_controller_arguments.cpp`).

use std::collections::HashMap;

use crate::entities::handle::{Handle, HandleId, HandleKind};
use crate::error::Result;
use crate::value_objects::data::Data;
use crate::value_objects::property::Property;

/// A typed key→value map where keys are [`Property`] and values a list of
/// [`Data`], owned by the caller and read once by a query-builder setup
/// step. A list rather than a single slot since properties such as
/// `ArgumentsGroupColumns`/`ArgumentsStringFilter`/`ArgumentsTrackId` are
/// indexed multi-value properties by construction.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    values: HashMap<u32, Vec<Data>>,
}

impl Arguments {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value at index 0 for `property`, the common single-value case.
    pub fn set(&mut self, property: Property, value: Data) {
        self.set_indexed(property, 0, value);
    }

    /// Set the value at `index` for `property`, growing the backing list
    /// (padding with `Data::UInt64(0)`) so non-contiguous indices still work.
    pub fn set_indexed(&mut self, property: Property, index: u64, value: Data) {
        let list = self.values.entry(property as u32).or_default();
        let index = index as usize;
        if index >= list.len() {
            list.resize(index + 1, Data::UInt64(0));
        }
        list[index] = value;
    }

    #[must_use]
    pub fn get(&self, property: Property) -> Option<&Data> {
        self.values.get(&(property as u32)).and_then(|list| list.first())
    }

    #[must_use]
    pub fn get_indexed(&self, property: Property, index: u64) -> Option<&Data> {
        self.values.get(&(property as u32)).and_then(|list| list.get(index as usize))
    }

    /// Number of values set for `property`, for iterating a multi-value one.
    #[must_use]
    pub fn count(&self, property: Property) -> u64 {
        self.values.get(&(property as u32)).map_or(0, |list| list.len() as u64)
    }
}

impl Handle for Arguments {
    fn kind(&self) -> HandleKind {
        HandleKind::Arguments
    }

    fn get_u64(&self, property: Property, index: u64) -> Result<u64> {
        match self.values.get(&(property as u32)) {
            Some(list) => {
                Self::check_index(index, list.len() as u64)?;
                list[index as usize].as_u64()
            }
            None => Err(self.reject(property)),
        }
    }

    fn get_f64(&self, property: Property, index: u64) -> Result<f64> {
        match self.values.get(&(property as u32)) {
            Some(list) => {
                Self::check_index(index, list.len() as u64)?;
                list[index as usize].as_f64()
            }
            None => Err(self.reject(property)),
        }
    }

    fn get_string(&self, property: Property, index: u64) -> Result<String> {
        match self.values.get(&(property as u32)) {
            Some(list) => {
                Self::check_index(index, list.len() as u64)?;
                list[index as usize].as_str().map(str::to_owned)
            }
            None => Err(self.reject(property)),
        }
    }

    fn get_object(&self, property: Property, index: u64) -> Result<Option<HandleId>> {
        match self.values.get(&(property as u32)) {
            Some(list) => {
                Self::check_index(index, list.len() as u64)?;
                list[index as usize].as_object()
            }
            None => Err(self.reject(property)),
        }
    }

    fn set_u64(&mut self, property: Property, index: u64, value: u64) -> Result<()> {
        self.set_indexed(property, index, Data::UInt64(value));
        Ok(())
    }

    fn set_f64(&mut self, property: Property, index: u64, value: f64) -> Result<()> {
        self.set_indexed(property, index, Data::Double(value));
        Ok(())
    }

    fn set_string(&mut self, property: Property, index: u64, value: String) -> Result<()> {
        self.set_indexed(property, index, Data::String(value));
        Ok(())
    }

    fn set_object(&mut self, property: Property, index: u64, value: Option<HandleId>) -> Result<()> {
        self.set_indexed(property, index, Data::Object(value));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_primitive_tag() {
        let mut args = Arguments::new();
        args.set_u64(Property::ArgumentsTimeStart, 0, 10).unwrap();
        args.set_string(Property::ArgumentsFilter, 0, "name".into()).unwrap();
        assert_eq!(args.get_u64(Property::ArgumentsTimeStart, 0).unwrap(), 10);
        assert_eq!(args.get_string(Property::ArgumentsFilter, 0).unwrap(), "name");
    }

    #[test]
    fn unset_property_is_unhandled() {
        let args = Arguments::new();
        assert!(args.get_u64(Property::ArgumentsTimeStart, 0).is_err());
    }

    #[test]
    fn indexed_values_append_instead_of_overwriting() {
        let mut args = Arguments::new();
        args.set_u64(Property::ArgumentsTrackId, 0, 4).unwrap();
        args.set_u64(Property::ArgumentsTrackId, 1, 7).unwrap();
        assert_eq!(args.count(Property::ArgumentsTrackId), 2);
        assert_eq!(args.get_u64(Property::ArgumentsTrackId, 0).unwrap(), 4);
        assert_eq!(args.get_u64(Property::ArgumentsTrackId, 1).unwrap(), 7);
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let mut args = Arguments::new();
        args.set_u64(Property::ArgumentsTrackId, 0, 4).unwrap();
        assert!(args.get_u64(Property::ArgumentsTrackId, 5).is_err());
    }
}
