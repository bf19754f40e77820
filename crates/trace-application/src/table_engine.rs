//! The table engine: unpacks `Arguments` into a query signature, decides
//! whether a re-issue is needed, and transcribes fetched rows
//! (`spec.md` §4.9).

use trace_domain::entities::arguments::Arguments;
use trace_domain::entities::table::{QuerySignature, SortOrderKey, Table};
use trace_domain::error::Result;
use trace_domain::value_objects::property::Property;

/// Read every indexed string value set for `property`, in index order.
fn read_string_list(args: &Arguments, property: Property) -> Vec<String> {
    (0..args.count(property)).filter_map(|i| args.get_indexed(property, i).and_then(|d| d.as_str().ok()).map(str::to_owned)).collect()
}

/// Read every indexed `u64` value set for `property`, in index order.
fn read_u64_list(args: &Arguments, property: Property) -> Vec<u64> {
    (0..args.count(property)).filter_map(|i| args.get_indexed(property, i).and_then(|d| d.as_u64().ok())).collect()
}

/// Unpack an [`Arguments`] bag into a [`QuerySignature`] (`spec.md` §4.9
/// step 1). Missing keys take their signature-default value.
#[must_use]
pub fn signature_from_arguments(args: &Arguments) -> QuerySignature {
    let filter = args.get(Property::ArgumentsFilter).and_then(|d| d.as_str().ok()).map(str::to_owned);
    let sort_column = args.get(Property::ArgumentsSortColumn).and_then(|d| d.as_str().ok()).map(str::to_owned);
    let sort_order = args.get(Property::ArgumentsSortOrder).and_then(|d| d.as_u64().ok()).map(|v| {
        if v == 0 { SortOrderKey::Ascending } else { SortOrderKey::Descending }
    });
    let summary = args
        .get(Property::ArgumentsSummary)
        .and_then(|d| d.as_u64().ok())
        .map(|v| v != 0)
        .unwrap_or(false);
    let time_start = args.get(Property::ArgumentsTimeStart).and_then(|d| d.as_u64().ok());
    let time_end = args.get(Property::ArgumentsTimeEnd).and_then(|d| d.as_u64().ok());
    let group_by = args.get(Property::ArgumentsGroupBy).and_then(|d| d.as_u64().ok()).map(|v| v != 0).unwrap_or(false);
    let group_columns = read_string_list(args, Property::ArgumentsGroupColumns);
    let string_filter = read_string_list(args, Property::ArgumentsStringFilter);
    let track_ids = read_u64_list(args, Property::ArgumentsTrackId);

    QuerySignature {
        filter,
        group_by,
        group_columns,
        sort_column,
        sort_order,
        string_filter,
        summary,
        time_start,
        time_end,
        track_ids,
    }
}

/// `Table::Setup` (`spec.md` §4.9 steps 2-4): returns `true` when the
/// signature was unchanged and only rows were cleared, `false` when the
/// caller must issue a fresh count/setup query and call
/// [`Table::reset`] with the new columns/row count.
#[must_use]
pub fn setup_is_cache_hit(table: &Table, new_signature: &QuerySignature) -> bool {
    table.signature() == Some(new_signature)
}

/// Apply the cache-hit branch of `Setup`: clear rows, keep columns.
pub fn apply_cache_hit(table: &mut Table) -> Result<()> {
    table.clear_rows();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use trace_domain::entities::table::Column;
    use trace_domain::value_objects::data::Data;

    #[test]
    fn unchanged_signature_is_a_cache_hit() {
        let mut args = Arguments::new();
        args.set(Property::ArgumentsFilter, Data::String("gpu".into()));
        let sig = signature_from_arguments(&args);

        let mut table = Table::new(1);
        table.reset(sig.clone(), vec![Column { name: "a".into(), column_type: trace_domain::entities::table::ColumnType::String }], 10);

        assert!(setup_is_cache_hit(&table, &sig));
        apply_cache_hit(&mut table).unwrap();
        assert!(table.rows().is_empty());
    }

    #[test]
    fn changed_signature_is_a_cache_miss() {
        let mut args = Arguments::new();
        args.set(Property::ArgumentsFilter, Data::String("gpu".into()));
        let old_sig = signature_from_arguments(&args);

        let mut table = Table::new(1);
        table.reset(old_sig, vec![], 0);

        let mut new_args = Arguments::new();
        new_args.set(Property::ArgumentsFilter, Data::String("cpu".into()));
        let new_sig = signature_from_arguments(&new_args);

        assert!(!setup_is_cache_hit(&table, &new_sig));
    }

    #[test]
    fn unpacks_multi_value_track_and_string_filters() {
        let mut args = Arguments::new();
        args.set_u64(Property::ArgumentsTrackId, 0, 1).unwrap();
        args.set_u64(Property::ArgumentsTrackId, 1, 2).unwrap();
        args.set_string(Property::ArgumentsStringFilter, 0, "kernel".into()).unwrap();
        args.set_string(Property::ArgumentsGroupColumns, 0, "name".into()).unwrap();

        let sig = signature_from_arguments(&args);
        assert_eq!(sig.track_ids, vec![1, 2]);
        assert_eq!(sig.string_filter, vec!["kernel".to_string()]);
        assert_eq!(sig.group_columns, vec!["name".to_string()]);
    }
}
