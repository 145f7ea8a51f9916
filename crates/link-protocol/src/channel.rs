//! Radio channel identity and message targets

use std::fmt;

/// One of the two radio links served by the bridge
///
/// Channel identity is fixed: the bridge drives exactly two radios. Adding a
/// third means extending this enum and [`Target::channels`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Channel {
    /// First radio link
    ChannelA,
    /// Second radio link
    ChannelB,
}

impl Channel {
    /// Both channels, in resolution order
    pub const ALL: [Channel; 2] = [Channel::ChannelA, Channel::ChannelB];

    /// Index of this channel into per-channel arrays
    pub const fn index(self) -> usize {
        match self {
            Channel::ChannelA => 0,
            Channel::ChannelB => 1,
        }
    }

    /// The other channel
    pub const fn other(self) -> Channel {
        match self {
            Channel::ChannelA => Channel::ChannelB,
            Channel::ChannelB => Channel::ChannelA,
        }
    }

    /// Returns a human-readable name for the channel
    pub fn name(&self) -> &'static str {
        match self {
            Channel::ChannelA => "Radio A",
            Channel::ChannelB => "Radio B",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a console message is delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Target {
    /// Deliver only on radio A
    ChannelA,
    /// Deliver only on radio B
    ChannelB,
    /// Explicitly addressed to every radio
    Broadcast,
    /// No radio has announced the team (or the line had no team); delivered
    /// on every radio so it is never silently lost
    Unresolved,
}

impl Target {
    /// Channels a message with this target is sent on
    pub fn channels(&self) -> &'static [Channel] {
        match self {
            Target::ChannelA => &[Channel::ChannelA],
            Target::ChannelB => &[Channel::ChannelB],
            Target::Broadcast | Target::Unresolved => &Channel::ALL,
        }
    }

    /// The single channel this target names, if any
    pub fn channel(&self) -> Option<Channel> {
        match self {
            Target::ChannelA => Some(Channel::ChannelA),
            Target::ChannelB => Some(Channel::ChannelB),
            Target::Broadcast | Target::Unresolved => None,
        }
    }
}

impl From<Channel> for Target {
    fn from(channel: Channel) -> Self {
        match channel {
            Channel::ChannelA => Target::ChannelA,
            Channel::ChannelB => Target::ChannelB,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::ChannelA => f.write_str(Channel::ChannelA.name()),
            Target::ChannelB => f.write_str(Channel::ChannelB.name()),
            Target::Broadcast => f.write_str("broadcast"),
            Target::Unresolved => f.write_str("unresolved"),
        }
    }
}
