//! Team-to-radio bindings learned from announcements
//!
//! Each radio announces the team it serves. The registry holds at most one
//! team name per channel; a new announcement replaces the old one
//! wholesale. Both bindings sit behind one [`RwLock`] so a reader never sees
//! a half-written binding.
//!
//! # Duplicate names
//!
//! Nothing stops both radios announcing the same team. Lookups check
//! radio A before radio B, so radio A wins; [`TeamRegistry::lookup`]
//! reports the shadowed channel so the router can flag it.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use link_protocol::{normalize_team_name, Channel, ProtocolError};
use serde::Serialize;

/// Snapshot of both channel bindings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TeamBindings {
    teams: [Option<String>; 2],
}

impl TeamBindings {
    /// Team bound to a channel
    pub fn get(&self, channel: Channel) -> Option<&str> {
        self.teams[channel.index()].as_deref()
    }

    /// Format a binding for display
    pub fn display(&self, channel: Channel) -> String {
        self.get(channel).unwrap_or("NOT SET").to_string()
    }
}

/// Outcome of a team name lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// No radio has announced this team
    Unbound,
    /// Exactly one radio serves this team
    Bound(Channel),
    /// Both radios announced this team; `chosen` wins
    Ambiguous {
        /// Channel the message is routed to
        chosen: Channel,
        /// Channel that also claims the team
        shadowed: Channel,
    },
}

impl Resolution {
    /// Channel a message for this team goes to
    pub fn channel(&self) -> Option<Channel> {
        match self {
            Resolution::Unbound => None,
            Resolution::Bound(channel) => Some(*channel),
            Resolution::Ambiguous { chosen, .. } => Some(*chosen),
        }
    }
}

/// Mapping from team name to radio channel
#[derive(Debug, Default)]
pub struct TeamRegistry {
    bindings: RwLock<TeamBindings>,
}

impl TeamRegistry {
    /// Create a registry with both channels unbound
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, TeamBindings> {
        self.bindings.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, TeamBindings> {
        self.bindings.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up a team name, reporting duplicate bindings
    ///
    /// Matching is exact and case-sensitive after trailing whitespace is
    /// stripped.
    pub fn lookup(&self, team_name: &str) -> Resolution {
        let name = normalize_team_name(team_name);
        if name.is_empty() {
            return Resolution::Unbound;
        }

        let bindings = self.read();
        let Some(chosen) = Channel::ALL
            .into_iter()
            .find(|&c| bindings.get(c) == Some(name))
        else {
            return Resolution::Unbound;
        };

        let shadowed = chosen.other();
        if bindings.get(shadowed) == Some(name) {
            Resolution::Ambiguous { chosen, shadowed }
        } else {
            Resolution::Bound(chosen)
        }
    }

    /// Channel currently bound to a team name
    pub fn resolve(&self, team_name: &str) -> Option<Channel> {
        self.lookup(team_name).channel()
    }

    /// Bind a channel to a team, replacing its previous binding
    ///
    /// Returns the team the channel was previously bound to. A name that
    /// trims to nothing is refused and the binding is left unchanged.
    pub fn bind(&self, channel: Channel, team_name: &str) -> Result<Option<String>, ProtocolError> {
        let name = normalize_team_name(team_name);
        if name.is_empty() {
            return Err(ProtocolError::EmptyAnnouncement);
        }

        let mut bindings = self.write();
        Ok(bindings.teams[channel.index()].replace(name.to_string()))
    }

    /// Copy of both bindings
    pub fn snapshot(&self) -> TeamBindings {
        self.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbound_by_default() {
        let registry = TeamRegistry::new();
        assert_eq!(registry.resolve("Alpha"), None);
        assert_eq!(registry.snapshot().display(Channel::ChannelA), "NOT SET");
    }

    #[test]
    fn test_bind_then_resolve() {
        let registry = TeamRegistry::new();
        registry.bind(Channel::ChannelB, "Alpha").unwrap();

        assert_eq!(registry.resolve("Alpha"), Some(Channel::ChannelB));
        assert_eq!(registry.snapshot().get(Channel::ChannelB), Some("Alpha"));
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let registry = TeamRegistry::new();
        registry.bind(Channel::ChannelA, "Alpha").unwrap();

        assert_eq!(registry.resolve("ALPHA"), None);
        assert_eq!(registry.resolve("alpha"), None);
    }

    #[test]
    fn test_trailing_whitespace_ignored() {
        let registry = TeamRegistry::new();
        registry.bind(Channel::ChannelA, "Alpha\r\n").unwrap();

        assert_eq!(registry.snapshot().get(Channel::ChannelA), Some("Alpha"));
        assert_eq!(registry.resolve("Alpha "), Some(Channel::ChannelA));
    }

    #[test]
    fn test_rebind_replaces_old_name() {
        let registry = TeamRegistry::new();
        registry.bind(Channel::ChannelA, "Alpha").unwrap();
        let previous = registry.bind(Channel::ChannelA, "Bravo").unwrap();

        assert_eq!(previous.as_deref(), Some("Alpha"));
        assert_eq!(registry.resolve("Alpha"), None);
        assert_eq!(registry.resolve("Bravo"), Some(Channel::ChannelA));
    }

    #[test]
    fn test_empty_bind_is_refused() {
        let registry = TeamRegistry::new();
        registry.bind(Channel::ChannelA, "Alpha").unwrap();

        assert_eq!(
            registry.bind(Channel::ChannelA, " \n"),
            Err(ProtocolError::EmptyAnnouncement)
        );
        assert_eq!(registry.resolve("Alpha"), Some(Channel::ChannelA));
    }

    #[test]
    fn test_empty_name_never_resolves() {
        let registry = TeamRegistry::new();
        assert_eq!(registry.lookup(""), Resolution::Unbound);
    }

    #[test]
    fn test_duplicate_binding_prefers_channel_a() {
        let registry = TeamRegistry::new();
        registry.bind(Channel::ChannelB, "Alpha").unwrap();
        registry.bind(Channel::ChannelA, "Alpha").unwrap();

        assert_eq!(
            registry.lookup("Alpha"),
            Resolution::Ambiguous {
                chosen: Channel::ChannelA,
                shadowed: Channel::ChannelB,
            }
        );
        assert_eq!(registry.resolve("Alpha"), Some(Channel::ChannelA));
    }

    #[test]
    fn test_rebind_keeps_other_channel_binding() {
        let registry = TeamRegistry::new();
        registry.bind(Channel::ChannelA, "Alpha").unwrap();
        registry.bind(Channel::ChannelB, "Alpha").unwrap();
        registry.bind(Channel::ChannelA, "Bravo").unwrap();

        assert_eq!(registry.resolve("Alpha"), Some(Channel::ChannelB));
    }
}
