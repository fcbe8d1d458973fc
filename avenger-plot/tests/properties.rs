use std::collections::{HashMap, HashSet};

use avenger_plot::classify::{
    is_boolean_or_null, is_color_or_null, is_date_or_null, is_number_or_null, is_opacity_or_null,
    is_string_or_null, is_symbol_or_null,
};
use avenger_plot::prelude::*;
use avenger_plot::resolve::resolve_channel;
use avenger_plot::scales::infer_scale_type;
use avenger_plot::transforms::{
    Bin, Group, Jitter, JitterKind, Normalize, NormalizeBasis, Sort, Stack, StackOffset,
    StackOrder, Thresholds,
};
use avenger_plot::value::GroupKey;
use chrono::{TimeZone, Utc};
use float_cmp::assert_approx_eq;
use rstest::rstest;
use strum::VariantNames;

fn numbers(ctx: &DataContext, field: &str) -> Vec<f64> {
    ctx.data()
        .iter()
        .map(|d| d.field(field).map(RawValue::to_f64).unwrap_or(f64::NAN))
        .collect()
}

fn literals() -> Vec<RawValue> {
    vec![
        RawValue::Null,
        RawValue::from(3.5),
        RawValue::from("steelblue"),
        RawValue::from(true),
        RawValue::Date(Utc.with_ymd_and_hms(2020, 5, 1, 0, 0, 0).unwrap()),
        RawValue::Symbol("circle".to_string()),
    ]
}

#[test]
fn test_resolver_returns_constants_for_every_channel() -> Result<(), AvengerPlotError> {
    let datum = record!("x" => 1, "fill" => "red");
    for name in Channel::VARIANTS {
        let channel: Channel = name.parse().unwrap();
        for literal in literals() {
            let mut channels = avenger_plot::channel::Channels::new();
            channels.insert(channel, ChannelSpec::constant(literal.clone()));
            assert_eq!(resolve_channel(channel, &datum, &channels)?, literal);
        }
    }
    Ok(())
}

#[test]
fn test_classifiers_accept_null() {
    let predicates: [fn(&RawValue) -> bool; 7] = [
        is_number_or_null,
        is_date_or_null,
        is_string_or_null,
        is_boolean_or_null,
        is_color_or_null,
        is_symbol_or_null,
        is_opacity_or_null,
    ];
    for predicate in predicates {
        assert!(predicate(&RawValue::Null));
        // Total over every value kind
        for value in literals() {
            let _ = predicate(&value);
        }
    }
}

#[test]
fn test_bin_fixture() -> Result<(), AvengerPlotError> {
    let ctx = DataContext::new((1..=5).map(|x| record!("x" => x)).collect())
        .with_channel(Channel::X, "x");
    let out = Bin::x()
        .thresholds(Thresholds::Auto)
        .output(Channel::Y, Reducer::Count)
        .transform(ctx)?;
    assert_eq!(numbers(&out, "__x1"), vec![0.0, 2.0, 4.0]);
    assert_eq!(numbers(&out, "__x2"), vec![2.0, 4.0, 6.0]);
    assert_eq!(numbers(&out, "__y"), vec![1.0, 2.0, 2.0]);
    Ok(())
}

fn series() -> DataContext {
    let rows = [
        (1, "a", 3.0),
        (1, "b", 1.5),
        (1, "c", 4.0),
        (2, "a", 2.0),
        (2, "b", 0.5),
        (3, "c", 7.0),
        (3, "a", 1.0),
    ];
    DataContext::new(
        rows.iter()
            .map(|(x, s, v)| record!("x" => *x, "s" => *s, "v" => *v))
            .collect(),
    )
    .with_channel(Channel::X, "x")
    .with_channel(Channel::Y, "v")
    .with_channel(Channel::Z, "s")
}

fn totals_by_x(ctx: &DataContext, value: impl Fn(&Datum) -> f64) -> HashMap<i64, f64> {
    let mut totals = HashMap::new();
    for d in ctx.data() {
        let x = d.field("x").map(RawValue::to_f64).unwrap_or(f64::NAN) as i64;
        *totals.entry(x).or_insert(0.0) += value(d);
    }
    totals
}

#[test]
fn test_stack_conserves_mass() -> Result<(), AvengerPlotError> {
    let input = series();
    let raw = totals_by_x(&input, |d| d.field("v").map(RawValue::to_f64).unwrap_or(0.0));
    let out = Stack::y().transform(series())?;
    let stacked = totals_by_x(&out, |d| {
        let lo = d.field("__y1").map(RawValue::to_f64).unwrap_or(f64::NAN);
        let hi = d.field("__y2").map(RawValue::to_f64).unwrap_or(f64::NAN);
        hi - lo
    });
    for (x, total) in raw {
        assert_approx_eq!(f64, stacked[&x], total);
    }
    Ok(())
}

#[test]
fn test_stack_normalize_totals_one() -> Result<(), AvengerPlotError> {
    let out = Stack::y()
        .order(StackOrder::None)
        .offset(StackOffset::Normalize)
        .transform(series())?;
    let mut top: HashMap<i64, f64> = HashMap::new();
    for d in out.data() {
        let x = d.field("x").map(RawValue::to_f64).unwrap_or(f64::NAN) as i64;
        let hi = d.field("__y2").map(RawValue::to_f64).unwrap_or(f64::NAN);
        let entry = top.entry(x).or_insert(f64::NEG_INFINITY);
        *entry = entry.max(hi);
    }
    for total in top.values() {
        assert_approx_eq!(f64, *total, 1.0, epsilon = 1e-12);
    }
    Ok(())
}

#[test]
fn test_group_reduction_scenario() -> Result<(), AvengerPlotError> {
    let ctx = DataContext::new(vec![
        record!("year" => 2000, "value" => 10),
        record!("year" => 2000, "value" => 20),
        record!("year" => 2001, "value" => 15),
    ])
    .with_channel(Channel::X, "year")
    .with_channel(Channel::Y1, "value");
    let out = Group::x()
        .reduce(Channel::Y, "count")?
        .reduce(Channel::Y1, "sum")?
        .transform(ctx)?;
    assert_eq!(
        out.data(),
        &[
            record!("__x" => 2000, "__y" => 2, "__y1" => 30),
            record!("__x" => 2001, "__y" => 1, "__y1" => 15),
        ]
    );
    Ok(())
}

#[rstest]
#[case(ScaleName::X, vec![RawValue::from("a"), RawValue::from("b"), RawValue::from("c")], ScaleType::Band)]
#[case(ScaleName::X, vec![RawValue::from(1), RawValue::from(2), RawValue::from(3)], ScaleType::Linear)]
#[case(ScaleName::R, vec![RawValue::from(1), RawValue::from(2), RawValue::from(3)], ScaleType::Sqrt)]
#[case(
    ScaleName::X,
    vec![
        RawValue::Date(Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap()),
        RawValue::Date(Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap()),
    ],
    ScaleType::Time
)]
#[case(ScaleName::Symbol, vec![RawValue::from(1.5), RawValue::from("x")], ScaleType::Ordinal)]
#[case(ScaleName::Y, vec![RawValue::from(42)], ScaleType::Point)]
#[case(ScaleName::X, vec![RawValue::from("solo"), RawValue::from("solo")], ScaleType::Point)]
fn test_inference_table(
    #[case] name: ScaleName,
    #[case] values: Vec<RawValue>,
    #[case] expected: ScaleType,
) {
    assert_eq!(infer_scale_type(name, &values, &HashSet::new()), expected);
}

#[test]
fn test_normalize_first() -> Result<(), AvengerPlotError> {
    let ctx = DataContext::new(vec![
        record!("v" => 5),
        record!("v" => 10),
        record!("v" => 20),
    ])
    .with_channel(Channel::X, "v");
    let out = Normalize::x(NormalizeBasis::First).transform(ctx)?;
    assert_eq!(numbers(&out, "__x"), vec![1.0, 2.0, 4.0]);
    Ok(())
}

#[test]
fn test_jitter_with_fixed_source_is_reproducible() -> Result<(), AvengerPlotError> {
    let ctx = || {
        DataContext::new((0..5).map(|i| record!("v" => i)).collect()).with_channel(Channel::Y, "v")
    };
    let jitter = Jitter::y().kind(JitterKind::Uniform(1.0)).random(|| 0.25);
    let first = jitter.transform(ctx())?;
    let second = jitter.transform(ctx())?;
    assert_eq!(first.data(), second.data());
    assert_eq!(numbers(&first, "__y"), vec![-0.5, 0.5, 1.5, 2.5, 3.5]);
    Ok(())
}

#[test]
fn test_sort_is_stable() -> Result<(), AvengerPlotError> {
    let ctx = DataContext::new(
        (0..40)
            .map(|i| record!("id" => i, "k" => i % 3))
            .collect(),
    )
    .with_channel(Channel::Y, "k");
    let out = Sort::by_channel(Channel::Y).transform(ctx)?;
    let rows: Vec<(i64, i64)> = out
        .data()
        .iter()
        .map(|d| {
            let key = |f: &str| d.field(f).map(RawValue::to_f64).unwrap_or(f64::NAN) as i64;
            (key("k"), key("id"))
        })
        .collect();
    for pair in rows.windows(2) {
        let ((k0, id0), (k1, id1)) = (pair[0], pair[1]);
        assert!(k0 < k1 || (k0 == k1 && id0 < id1));
    }
    Ok(())
}

#[test]
fn test_group_keys_unify_numbers() {
    assert_eq!(
        GroupKey::from(&RawValue::from(2000)),
        GroupKey::from(&RawValue::from(2000.0))
    );
}
