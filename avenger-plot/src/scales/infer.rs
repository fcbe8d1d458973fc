//! Scale type inference from collected channel values

use std::collections::HashSet;

use crate::channel::ScaleName;
use crate::classify::{classify_column, is_date_or_null, is_number_or_null, ColumnType};
use crate::mark::MarkType;
use crate::scales::options::ScaleType;
use crate::value::{GroupKey, RawValue};

/// Mark types whose geometry needs bands along `name`
fn requires_band(name: ScaleName, mark_type: MarkType) -> bool {
    match name {
        ScaleName::X => matches!(mark_type, MarkType::BarY | MarkType::TickY | MarkType::Cell),
        ScaleName::Y => matches!(mark_type, MarkType::BarX | MarkType::TickX | MarkType::Cell),
        _ => false,
    }
}

/// Infer the type of scale `name` from every value that feeds it and the
/// types of the contributing marks
pub fn infer_scale_type(
    name: ScaleName,
    values: &[RawValue],
    mark_types: &HashSet<MarkType>,
) -> ScaleType {
    match name {
        ScaleName::Color => {
            return if values.iter().all(RawValue::is_null) {
                ScaleType::Ordinal
            } else if values
                .iter()
                .all(|v| is_number_or_null(v) || is_date_or_null(v))
            {
                ScaleType::Linear
            } else {
                ScaleType::Categorical
            };
        }
        ScaleName::Symbol => return ScaleType::Ordinal,
        ScaleName::Fx | ScaleName::Fy => return ScaleType::Band,
        _ => {}
    }

    if mark_types.len() == 1 && mark_types.iter().all(|t| requires_band(name, *t)) {
        return ScaleType::Band;
    }

    let distinct: HashSet<GroupKey> = values
        .iter()
        .filter(|v| v.is_defined())
        .map(GroupKey::from)
        .collect();

    let inferred = match classify_column(values) {
        ColumnType::Empty => ScaleType::Linear,
        _ if distinct.len() == 1 => ScaleType::Point,
        ColumnType::Number if name == ScaleName::R => ScaleType::Sqrt,
        ColumnType::Number => ScaleType::Linear,
        ColumnType::Date => ScaleType::Time,
        ColumnType::String | ColumnType::Boolean if mark_types.contains(&MarkType::Arrow) => {
            ScaleType::Point
        }
        ColumnType::String | ColumnType::Boolean => ScaleType::Band,
        ColumnType::Mixed => ScaleType::Linear,
    };

    // Sizes and opacity have no discrete types
    if ScaleType::allowed_for(name).contains(&inferred) {
        inferred
    } else {
        ScaleType::Linear
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    fn values<V: Into<RawValue> + Clone>(vs: &[V]) -> Vec<RawValue> {
        vs.iter().cloned().map(Into::into).collect()
    }

    fn dates() -> Vec<RawValue> {
        vec![
            RawValue::Date(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            RawValue::Date(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()),
        ]
    }

    #[rstest]
    #[case(ScaleName::X, values(&["a", "b", "c"]), ScaleType::Band)]
    #[case(ScaleName::X, values(&[1, 2, 3]), ScaleType::Linear)]
    #[case(ScaleName::R, values(&[1, 2, 3]), ScaleType::Sqrt)]
    #[case(ScaleName::X, dates(), ScaleType::Time)]
    #[case(ScaleName::Y, values(&["1", "2.5"]), ScaleType::Linear)]
    #[case(ScaleName::X, vec![], ScaleType::Linear)]
    #[case(ScaleName::X, vec![RawValue::Null], ScaleType::Linear)]
    #[case(ScaleName::X, values(&[7, 7, 7]), ScaleType::Point)]
    #[case(ScaleName::Y, values(&["only"]), ScaleType::Point)]
    #[case(ScaleName::X, vec![RawValue::from(1), RawValue::from("a")], ScaleType::Linear)]
    #[case(ScaleName::Symbol, values(&[1, 2]), ScaleType::Ordinal)]
    #[case(ScaleName::Symbol, values(&["a"]), ScaleType::Ordinal)]
    #[case(ScaleName::Color, vec![], ScaleType::Ordinal)]
    #[case(ScaleName::Color, values(&[1.5, 2.5]), ScaleType::Linear)]
    #[case(ScaleName::Color, dates(), ScaleType::Linear)]
    #[case(ScaleName::Color, values(&["a", "b"]), ScaleType::Categorical)]
    #[case(ScaleName::Fx, values(&[1, 2]), ScaleType::Band)]
    #[case(ScaleName::Opacity, values(&[4, 4]), ScaleType::Linear)]
    fn test_infer_without_marks(
        #[case] name: ScaleName,
        #[case] values: Vec<RawValue>,
        #[case] expected: ScaleType,
    ) {
        assert_eq!(infer_scale_type(name, &values, &HashSet::new()), expected);
    }

    #[rstest]
    #[case(ScaleName::X, &[MarkType::BarY], ScaleType::Band)]
    #[case(ScaleName::Y, &[MarkType::BarY], ScaleType::Linear)]
    #[case(ScaleName::Y, &[MarkType::TickX], ScaleType::Band)]
    #[case(ScaleName::X, &[MarkType::Cell], ScaleType::Band)]
    #[case(ScaleName::X, &[MarkType::BarY, MarkType::Dot], ScaleType::Linear)]
    fn test_forced_band(
        #[case] name: ScaleName,
        #[case] marks: &[MarkType],
        #[case] expected: ScaleType,
    ) {
        let marks: HashSet<MarkType> = marks.iter().copied().collect();
        let values = values(&[1, 2, 3]);
        assert_eq!(infer_scale_type(name, &values, &marks), expected);
    }

    #[test]
    fn test_arrow_marks_use_points() {
        let marks: HashSet<MarkType> = [MarkType::Arrow].into_iter().collect();
        let values = values(&["a", "b"]);
        assert_eq!(
            infer_scale_type(ScaleName::X, &values, &marks),
            ScaleType::Point
        );
    }
}
