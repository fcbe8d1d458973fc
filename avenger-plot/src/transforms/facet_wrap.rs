use indexmap::IndexMap;

use crate::channel::Channel;
use crate::error::AvengerPlotError;
use crate::transforms::{with_synthetic_column, DataContext, Transform};
use crate::value::{compare_defined, GroupKey, RawValue};

/// Wrap the distinct values of `fz` into a grid of `fx` columns and `fy`
/// rows, in ascending order
#[derive(Debug, Clone, Copy, Default)]
pub struct FacetWrap {
    columns: Option<usize>,
}

impl FacetWrap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Columns per row; defaults to `ceil(sqrt(n))`
    pub fn columns(mut self, columns: usize) -> Self {
        self.columns = Some(columns.max(1));
        self
    }
}

impl Transform for FacetWrap {
    fn transform(&self, ctx: DataContext) -> Result<DataContext, AvengerPlotError> {
        if !ctx.has_channel(Channel::Fz) {
            return Ok(ctx);
        }
        let values = ctx.column(Channel::Fz)?;
        let mut distinct: Vec<RawValue> = values
            .iter()
            .map(|v| (GroupKey::from(v), v.clone()))
            .collect::<IndexMap<_, _>>()
            .into_values()
            .collect();
        distinct.sort_by(compare_defined);
        let columns = self
            .columns
            .unwrap_or_else(|| (distinct.len() as f64).sqrt().ceil().max(1.0) as usize);
        let slots: IndexMap<GroupKey, usize> = distinct
            .iter()
            .enumerate()
            .map(|(k, v)| (GroupKey::from(v), k))
            .collect();

        let (fx, fy): (Vec<RawValue>, Vec<RawValue>) = values
            .iter()
            .map(|v| {
                let k = slots.get(&GroupKey::from(v)).copied().unwrap_or_default();
                (RawValue::from(k % columns), RawValue::from(k / columns))
            })
            .unzip();

        let (data, channels, insets) = ctx.into_parts();
        let data = with_synthetic_column(data, "fx", fx);
        let data = with_synthetic_column(data, "fy", fy);
        Ok(DataContext::new(data)
            .with_channels(channels)
            .with_insets(insets)
            .without_channel(Channel::Fz)
            .with_synthetic_channel(Channel::Fx, "fx")
            .with_synthetic_channel(Channel::Fy, "fy"))
    }

    fn output_channels(&self) -> Vec<Channel> {
        vec![Channel::Fx, Channel::Fy]
    }
}
