use crate::channel::{Channel, ChannelSpec};
use crate::error::AvengerPlotError;
use crate::resolve::resolve_prop;
use crate::transforms::{DataContext, Transform};

/// Keep rows whose `filter` accessor is truthy, then drop the `filter`
/// channel so later stages don't filter again
#[derive(Debug, Clone, Default)]
pub struct Filter {
    test: Option<ChannelSpec>,
}

impl Filter {
    /// Filter on the context's own `filter` channel
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter on an explicit accessor instead
    pub fn by(test: impl Into<ChannelSpec>) -> Self {
        Self {
            test: Some(test.into()),
        }
    }
}

impl Transform for Filter {
    fn transform(&self, ctx: DataContext) -> Result<DataContext, AvengerPlotError> {
        let Some(spec) = self.test.as_ref().or(ctx.channel(Channel::Filter)).cloned() else {
            return Ok(ctx);
        };
        let data = ctx
            .data()
            .iter()
            .filter(|d| resolve_prop(spec.accessor.as_ref(), d).truthy())
            .cloned()
            .collect();
        Ok(ctx.with_data(data).without_channel(Channel::Filter))
    }

    fn output_channels(&self) -> Vec<Channel> {
        vec![]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;
    use crate::value::{Datum, RawValue};

    #[test]
    fn test_filter_channel() {
        let ctx = DataContext::new(vec![
            record!("v" => 1.0, "keep" => true),
            record!("v" => 2.0, "keep" => false),
            record!("v" => 3.0),
        ])
        .with_channel(Channel::Filter, "keep");
        let out = Filter::new().transform(ctx).unwrap();
        assert_eq!(out.data().len(), 1);
        assert!(!out.has_channel(Channel::Filter));
    }

    #[test]
    fn test_filter_function() {
        let ctx = DataContext::new((0..6).map(|i| record!("v" => i)).collect());
        let even = Filter::by(ChannelSpec::function(|d: &Datum| {
            RawValue::from(d.field("v").map(|v| v.to_f64() % 2.0 == 0.0).unwrap_or(false))
        }));
        assert_eq!(even.transform(ctx).unwrap().data().len(), 3);
    }
}
