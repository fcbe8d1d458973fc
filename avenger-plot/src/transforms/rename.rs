use indexmap::IndexMap;

use crate::channel::Channel;
use crate::error::AvengerPlotError;
use crate::transforms::{DataContext, Transform};

/// Move channel accessors to new channel names
#[derive(Debug, Clone, Default)]
pub struct RenameChannels {
    renames: IndexMap<Channel, Channel>,
}

impl RenameChannels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rename(mut self, from: Channel, to: Channel) -> Self {
        self.renames.insert(from, to);
        self
    }
}

impl Transform for RenameChannels {
    fn transform(&self, ctx: DataContext) -> Result<DataContext, AvengerPlotError> {
        let (data, mut channels, insets) = ctx.into_parts();
        let moved: Vec<_> = self
            .renames
            .iter()
            .filter_map(|(from, to)| channels.shift_remove(from).map(|spec| (*to, spec)))
            .collect();
        channels.extend(moved);
        Ok(DataContext::new(data)
            .with_channels(channels)
            .with_insets(insets))
    }

    fn output_channels(&self) -> Vec<Channel> {
        self.renames.values().copied().collect()
    }
}

/// Copy one channel's accessor onto several channels, removing the source
#[derive(Debug, Clone, Default)]
pub struct ReplaceChannels {
    replacements: IndexMap<Channel, Vec<Channel>>,
}

impl ReplaceChannels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(mut self, from: Channel, to: &[Channel]) -> Self {
        self.replacements.insert(from, to.to_vec());
        self
    }
}

impl Transform for ReplaceChannels {
    fn transform(&self, ctx: DataContext) -> Result<DataContext, AvengerPlotError> {
        let (data, mut channels, insets) = ctx.into_parts();
        for (from, targets) in &self.replacements {
            if let Some(spec) = channels.shift_remove(from) {
                for target in targets {
                    channels.insert(*target, spec.clone());
                }
            }
        }
        Ok(DataContext::new(data)
            .with_channels(channels)
            .with_insets(insets))
    }

    fn output_channels(&self) -> Vec<Channel> {
        self.replacements.values().flatten().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelSpec;
    use crate::record;

    fn ctx() -> DataContext {
        DataContext::new(vec![record!("a" => 1)])
            .with_channel(Channel::X, "a")
            .with_channel(Channel::Fill, ChannelSpec::constant("red"))
    }

    #[test]
    fn test_rename() {
        let out = RenameChannels::new()
            .rename(Channel::X, Channel::Y)
            .transform(ctx())
            .unwrap();
        assert!(!out.has_channel(Channel::X));
        assert_eq!(out.channel(Channel::Y).unwrap().as_field(), Some("a"));
        assert_eq!(out.data(), ctx().data());
    }

    #[test]
    fn test_replace() {
        let out = ReplaceChannels::new()
            .replace(Channel::X, &[Channel::X1, Channel::X2])
            .transform(ctx())
            .unwrap();
        assert!(!out.has_channel(Channel::X));
        assert_eq!(out.channel(Channel::X1).unwrap().as_field(), Some("a"));
        assert_eq!(out.channel(Channel::X2).unwrap().as_field(), Some("a"));
        assert!(out.has_channel(Channel::Fill));
    }
}
