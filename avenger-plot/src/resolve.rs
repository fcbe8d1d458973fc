//! Per-row channel resolution.

use crate::channel::{Channel, ChannelAccessor, Channels};
use crate::error::AvengerPlotError;
use crate::value::{Datum, RawValue};

/// Resolve `channel` for one row.
///
/// `z` falls back to `fill`, then `stroke`, when it is not declared. Aliases
/// redirect one level; an alias of an alias is an error. Function accessors
/// receive the original datum of auto-wrapped rows. A field accessor whose
/// field is absent on the row is treated as a literal string value.
pub fn resolve_channel(
    channel: Channel,
    datum: &Datum,
    channels: &Channels,
) -> Result<RawValue, AvengerPlotError> {
    if channel == Channel::Z && !channels.contains_key(&Channel::Z) {
        return match [Channel::Fill, Channel::Stroke]
            .into_iter()
            .find(|c| channels.contains_key(c))
        {
            Some(fallback) => resolve_channel(fallback, datum, channels),
            None => Ok(RawValue::Null),
        };
    }

    let accessor = channels.get(&channel).and_then(|spec| spec.accessor.as_ref());
    match accessor {
        Some(ChannelAccessor::Alias(target)) => {
            let target_accessor = channels
                .get(target)
                .and_then(|spec| spec.accessor.as_ref());
            if let Some(ChannelAccessor::Alias(next)) = target_accessor {
                return Err(AvengerPlotError::MultipleChannelAliases {
                    from: target.to_string(),
                    to: next.to_string(),
                });
            }
            Ok(resolve_accessor(*target, target_accessor, datum))
        }
        other => Ok(resolve_accessor(channel, other, datum)),
    }
}

fn resolve_accessor(channel: Channel, accessor: Option<&ChannelAccessor>, datum: &Datum) -> RawValue {
    match accessor {
        Some(ChannelAccessor::Function(f)) => f(datum.original()),
        Some(ChannelAccessor::Field(name)) => match datum.field(name) {
            Some(v) => v.clone(),
            None => RawValue::String(name.clone()),
        },
        Some(ChannelAccessor::Constant(v)) => v.clone(),
        // resolve_channel redirects aliases before getting here
        Some(ChannelAccessor::Alias(_)) => RawValue::Null,
        None => implicit_value(channel, datum),
    }
}

/// Same-named field, or the positional entry of a bare `[x, y]` tuple
fn implicit_value(channel: Channel, datum: &Datum) -> RawValue {
    if let Some(v) = datum.field(&channel.to_string()) {
        return v.clone();
    }
    let index = match channel {
        Channel::X => 0,
        Channel::Y => 1,
        _ => return RawValue::Null,
    };
    match datum.original() {
        Datum::Tuple(values) => values.get(index).cloned().unwrap_or_default(),
        _ => RawValue::Null,
    }
}

/// Simplified resolution for non-channel accessors such as sort keys:
/// constant, field or function, defaulting to null
pub fn resolve_prop(accessor: Option<&ChannelAccessor>, datum: &Datum) -> RawValue {
    match accessor {
        Some(ChannelAccessor::Constant(v)) => v.clone(),
        Some(ChannelAccessor::Field(name)) => datum.field(name).cloned().unwrap_or_default(),
        Some(ChannelAccessor::Function(f)) => f(datum.original()),
        Some(ChannelAccessor::Alias(_)) | None => RawValue::Null,
    }
}

/// Resolve a channel for every row
pub fn resolve_column(
    channel: Channel,
    data: &[Datum],
    channels: &Channels,
) -> Result<Vec<RawValue>, AvengerPlotError> {
    data.iter()
        .map(|d| resolve_channel(channel, d, channels))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelSpec;
    use crate::record;
    use indexmap::indexmap;

    #[test]
    fn test_field_and_literal_fallback() {
        let datum = record!("a" => 1.0);
        let channels = indexmap! {
            Channel::X => ChannelSpec::field("a"),
            Channel::Fill => ChannelSpec::field("red"),
        };
        assert_eq!(
            resolve_channel(Channel::X, &datum, &channels).unwrap(),
            RawValue::from(1.0)
        );
        assert_eq!(
            resolve_channel(Channel::Fill, &datum, &channels).unwrap(),
            RawValue::from("red")
        );
    }

    #[test]
    fn test_z_falls_back_to_fill_then_stroke() {
        let datum = record!("c" => "a", "s" => "b");
        let channels = indexmap! { Channel::Stroke => ChannelSpec::field("s") };
        assert_eq!(
            resolve_channel(Channel::Z, &datum, &channels).unwrap(),
            RawValue::from("b")
        );
        let channels = indexmap! {
            Channel::Fill => ChannelSpec::field("c"),
            Channel::Stroke => ChannelSpec::field("s"),
        };
        assert_eq!(
            resolve_channel(Channel::Z, &datum, &channels).unwrap(),
            RawValue::from("a")
        );
    }

    #[test]
    fn test_alias() {
        let datum = record!("v" => 3.0);
        let channels = indexmap! {
            Channel::Y => ChannelSpec::field("v"),
            Channel::Y1 => ChannelSpec::alias(Channel::Y),
        };
        assert_eq!(
            resolve_channel(Channel::Y1, &datum, &channels).unwrap(),
            RawValue::from(3.0)
        );

        let channels = indexmap! {
            Channel::Y => ChannelSpec::alias(Channel::X),
            Channel::Y1 => ChannelSpec::alias(Channel::Y),
            Channel::X => ChannelSpec::field("v"),
        };
        assert!(matches!(
            resolve_channel(Channel::Y1, &datum, &channels),
            Err(AvengerPlotError::MultipleChannelAliases { .. })
        ));
    }

    #[test]
    fn test_function_sees_original() {
        let datum = Datum::Value(RawValue::from(4.0)).with_field("__index", 0);
        let channels = indexmap! {
            Channel::X => ChannelSpec::function(|d| match d {
                Datum::Value(v) => RawValue::Number(v.to_f64() * 2.0),
                _ => RawValue::Null,
            }),
        };
        assert_eq!(
            resolve_channel(Channel::X, &datum, &channels).unwrap(),
            RawValue::from(8.0)
        );
    }

    #[test]
    fn test_implicit_and_tuple() {
        let channels = indexmap! {
            Channel::X => ChannelSpec::implicit(),
            Channel::Y => ChannelSpec::implicit(),
        };
        let tuple = Datum::Tuple(vec![RawValue::from(1.0), RawValue::from(2.0)]);
        assert_eq!(
            resolve_channel(Channel::Y, &tuple, &channels).unwrap(),
            RawValue::from(2.0)
        );
        let row = record!("x" => 5.0);
        assert_eq!(
            resolve_channel(Channel::X, &row, &channels).unwrap(),
            RawValue::from(5.0)
        );
        assert_eq!(
            resolve_channel(Channel::Y, &row, &channels).unwrap(),
            RawValue::Null
        );
    }

    #[test]
    fn test_resolve_prop() {
        let datum = record!("k" => 2.0);
        let field = ChannelAccessor::Field("missing".to_string());
        assert_eq!(resolve_prop(Some(&field), &datum), RawValue::Null);
        let field = ChannelAccessor::Field("k".to_string());
        assert_eq!(resolve_prop(Some(&field), &datum), RawValue::from(2.0));
        assert_eq!(resolve_prop(None, &datum), RawValue::Null);
    }
}
