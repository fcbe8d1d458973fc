use avenger_plot::prelude::*;
use avenger_plot::scales::PlotOptionsOverride;
use avenger_plot::transforms::{Bin, Stack};
use avenger_plot::value::data_from_json;
use float_cmp::assert_approx_eq;
use serde_json::json;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

#[test]
fn test_histogram_scales() -> Result<(), AvengerPlotError> {
    init_tracing();
    let data = data_from_json(&json!([
        {"weight": 1}, {"weight": 2}, {"weight": 3}, {"weight": 4}, {"weight": 5}
    ]));
    let mark = Mark::new(MarkType::Rect, data)
        .with_channel(Channel::X, "weight")
        .transform(&Bin::x().output(Channel::Y, Reducer::Count))?;

    let mut plot = Plot::default();
    let id = plot.add_mark(mark);
    let x = plot.scale(ScaleName::X)?.cloned().unwrap();
    assert_eq!(x.scale_type, ScaleType::Linear);
    assert_eq!(x.domain, vec![RawValue::from(0.0), RawValue::from(6.0)]);
    assert_eq!(x.auto_title, None);

    let y = plot.scale(ScaleName::Y)?.cloned().unwrap();
    assert_eq!(y.domain, vec![RawValue::from(0.0), RawValue::from(2.0)]);
    assert_approx_eq!(f64, y.apply(&RawValue::from(2.0)).to_f64(), 20.0);

    let used = plot.used_scales(id)?;
    assert_eq!(used.get(&Channel::X1), Some(&true));
    assert_eq!(used.get(&Channel::Y), Some(&true));
    Ok(())
}

#[test]
fn test_stacked_bars_with_color() -> Result<(), AvengerPlotError> {
    let data = data_from_json(&json!([
        {"fruit": "apple", "store": "north", "sold": 3},
        {"fruit": "apple", "store": "south", "sold": 2},
        {"fruit": "pear", "store": "north", "sold": 5},
        {"fruit": "pear", "store": "south", "sold": 1}
    ]));
    let mark = Mark::new(MarkType::BarY, data)
        .with_channel(Channel::X, "fruit")
        .with_channel(Channel::Y, "sold")
        .with_channel(Channel::Fill, "store")
        .transform(&Stack::y())?;

    let mut plot = Plot::default();
    plot.add_mark(mark);
    let scales = plot.scales()?;

    let x = &scales[&ScaleName::X];
    assert_eq!(x.scale_type, ScaleType::Band);
    assert_eq!(x.domain, vec![RawValue::from("apple"), RawValue::from("pear")]);
    assert_eq!(x.title(), Some("fruit"));

    let y = &scales[&ScaleName::Y];
    assert_eq!(y.domain, vec![RawValue::from(0.0), RawValue::from(6.0)]);

    let color = &scales[&ScaleName::Color];
    assert_eq!(color.scale_type, ScaleType::Categorical);
    assert_eq!(color.domain.len(), 2);
    let north = color.apply(&RawValue::from("north"));
    let south = color.apply(&RawValue::from("south"));
    assert!(north.as_str().is_some());
    assert_ne!(north, south);
    Ok(())
}

#[test]
fn test_invalid_scale_type_surfaces() {
    let mark = Mark::new(MarkType::Dot, vec![record!("s" => "a")]).with_channel(Channel::Symbol, "s");
    let options = PlotOptions::default()
        .with_scale(ScaleName::Symbol, ScaleOptions::of_type(ScaleType::Log));
    let mut plot = Plot::new(options);
    plot.add_mark(mark);
    let err = plot.scales().unwrap_err();
    assert!(matches!(err, AvengerPlotError::InvalidScaleType { .. }));
    assert!(err.to_string().contains("ordinal"));
}

#[test]
fn test_options_from_json_drive_scales() -> Result<(), AvengerPlotError> {
    let mark = Mark::new(
        MarkType::Dot,
        (1..=4).map(|v| record!("v" => v * 10)).collect(),
    )
    .with_channel(Channel::X, "v");
    let mut plot = Plot::default();
    plot.add_mark(mark);

    let partial = PlotOptionsOverride::from_json(&json!({
        "width": 500,
        "margin": 0,
        "x": {"domain": [0, 100], "reverse": true}
    }))
    .unwrap();
    plot.apply_override(&partial);

    let x = plot.scale(ScaleName::X)?.cloned().unwrap();
    assert_approx_eq!(f64, x.apply(&RawValue::from(0)).to_f64(), 500.0);
    assert_approx_eq!(f64, x.apply(&RawValue::from(100)).to_f64(), 0.0);
    Ok(())
}
