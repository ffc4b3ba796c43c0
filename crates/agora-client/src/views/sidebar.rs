use crate::refresh::RefreshSignal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FriendSuggestion {
    pub name: &'static str,
    pub handle: &'static str,
    pub avatar_url: &'static str,
}

pub const FRIEND_SUGGESTIONS: [FriendSuggestion; 5] = [
    FriendSuggestion {
        name: "Julia Smith",
        handle: "@juliasmith",
        avatar_url: "https://randomuser.me/api/portraits/women/10.jpg",
    },
    FriendSuggestion {
        name: "Vermillion D. Gray",
        handle: "@vermilliongray",
        avatar_url: "https://randomuser.me/api/portraits/men/11.jpg",
    },
    FriendSuggestion {
        name: "Mai Senpai",
        handle: "@maisenpai",
        avatar_url: "https://randomuser.me/api/portraits/women/12.jpg",
    },
    FriendSuggestion {
        name: "Azunyan U. Wu",
        handle: "@azunyandesu",
        avatar_url: "https://randomuser.me/api/portraits/women/13.jpg",
    },
    FriendSuggestion {
        name: "Oarack Babama",
        handle: "@obama21",
        avatar_url: "https://randomuser.me/api/portraits/men/14.jpg",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavItem {
    Feed,
    Stories,
    Friends,
    Apis,
    Subscription,
    Settings,
    Help,
}

pub const NAV_ITEMS: [NavItem; 7] = [
    NavItem::Feed,
    NavItem::Stories,
    NavItem::Friends,
    NavItem::Apis,
    NavItem::Subscription,
    NavItem::Settings,
    NavItem::Help,
];

impl NavItem {
    pub fn label(self) -> &'static str {
        match self {
            Self::Feed => "Feed",
            Self::Stories => "Stories",
            Self::Friends => "Friends",
            Self::Apis => "APIs",
            Self::Subscription => "Subscription",
            Self::Settings => "Settings",
            Self::Help => "Help & Support",
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Self::Feed => "/",
            Self::Stories => "/stories",
            Self::Friends => "/friends",
            Self::Apis => "/apis",
            Self::Subscription => "/subscription",
            Self::Settings => "/settings",
            Self::Help => "/help",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Already on the feed; it was asked to refresh in place.
    Refreshed,
    Navigate(&'static str),
}

/// Activate a navigation entry from `current_path`.
///
/// Feed while already on the feed refreshes it instead of navigating.
pub fn activate(item: NavItem, current_path: &str, signal: &RefreshSignal) -> Navigation {
    if item == NavItem::Feed && current_path == NavItem::Feed.path() {
        signal.trigger();
        Navigation::Refreshed
    } else {
        Navigation::Navigate(item.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_on_home_refreshes() {
        let signal = RefreshSignal::new();
        assert_eq!(activate(NavItem::Feed, "/", &signal), Navigation::Refreshed);
        assert_eq!(signal.generation(), 1);
    }

    #[test]
    fn elsewhere_navigates() {
        let signal = RefreshSignal::new();
        assert_eq!(activate(NavItem::Feed, "/settings", &signal), Navigation::Navigate("/"));
        assert_eq!(activate(NavItem::Help, "/", &signal), Navigation::Navigate("/help"));
        assert_eq!(signal.generation(), 0);
    }

    #[test]
    fn fixed_lists() {
        assert_eq!(NAV_ITEMS[0].label(), "Feed");
        assert_eq!(NAV_ITEMS[6].label(), "Help & Support");
        assert!(FRIEND_SUGGESTIONS.iter().all(|f| f.handle.starts_with('@')));
    }
}
