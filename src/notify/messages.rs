//! Notification contents.
//!
//! Texts are Telegram HTML. Names coming from users are escaped; everything
//! else is controlled by the configuration.

use crate::config::{CHECK_COUNT_PAYLOAD, ReferralSettings};
use crate::referral::ProgressSnapshot;

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// A user joined on their own.
    Welcome,
    /// A user completed a reward cycle and can claim.
    RewardReady,
    /// A user is part way through a cycle.
    Progress,
    /// A user has not added anyone.
    NoMembersYet,
    /// Reply to `/add`.
    AddMembers,
}

/// An interactive control attached under a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    /// Button that sends `payload` back to the bot.
    Callback { label: String, payload: String },
    /// Button that opens a link.
    Url { label: String, url: String },
}

/// An outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    /// HTML-formatted body.
    pub html: String,
    pub control: Option<Control>,
}

/// Builds every text the bot sends.
#[derive(Debug, Clone)]
pub struct Templates {
    members_per_reward: u64,
    reward_name: String,
    reward_url: String,
}

impl Templates {
    #[must_use]
    pub fn new(settings: &ReferralSettings) -> Self {
        Self {
            members_per_reward: settings.members_per_reward.get(),
            reward_name: settings.reward_name.clone(),
            reward_url: settings.reward_url.clone(),
        }
    }

    fn check_button() -> Control {
        Control::Callback {
            label: "How many members have I added?".to_owned(),
            payload: CHECK_COUNT_PAYLOAD.to_owned(),
        }
    }

    /// Greeting for a self-join, with the progress button.
    #[must_use]
    pub fn welcome(&self, name: &str) -> Notification {
        Notification {
            kind: NotificationKind::Welcome,
            html: format!(
                "<b>🔰WELCOME🔰</b>\n\n\
                 Hello @{}, welcome to the group! 🎉\n\
                 Here, every time you add {} members to this group, you will receive a {}. \
                 So, what are you waiting for? Start now!\n\n\
                 <b>✅NOTE:</b> To check how many members you have added, press the button below \
                 or type /count command in the group.",
                escape_html(name),
                self.members_per_reward,
                escape_html(&self.reward_name),
            ),
            control: Some(Self::check_button()),
        }
    }

    /// Cycle completed: point the user to the claim link.
    #[must_use]
    pub fn reward_ready(&self, name: &str) -> Notification {
        Notification {
            kind: NotificationKind::RewardReady,
            html: format!(
                "<b>🔰Added Successfully🔰</b>\n\n\
                 Congratulations @{}! 🎉 You have added {} members.\n\
                 Now, you can claim your {} using the button below.",
                escape_html(name),
                self.members_per_reward,
                escape_html(&self.reward_name),
            ),
            control: Some(Control::Url {
                label: "Claim your reward here".to_owned(),
                url: self.reward_url.clone(),
            }),
        }
    }

    #[must_use]
    pub fn progress(&self, name: &str, snapshot: ProgressSnapshot) -> Notification {
        Notification {
            kind: NotificationKind::Progress,
            html: format!(
                "<b>🔰ADD MORE🔰</b>\n\n\
                 Hi @{}, you have added {} members.\n\
                 You need to add {} more members for a {}!",
                escape_html(name),
                snapshot.cycle_progress,
                snapshot.remaining,
                escape_html(&self.reward_name),
            ),
            control: None,
        }
    }

    #[must_use]
    pub fn no_members_yet(&self, name: &str) -> Notification {
        Notification {
            kind: NotificationKind::NoMembersYet,
            html: format!(
                "<b>🔰ADD MEMBERS🔰</b>\n\n\
                 Hi @{}, you haven't added any members yet!",
                escape_html(name),
            ),
            control: None,
        }
    }

    /// Reply to `/add`, with the progress button.
    #[must_use]
    pub fn add_members(&self, name: &str) -> Notification {
        Notification {
            kind: NotificationKind::AddMembers,
            html: format!(
                "<b>🔰ADD MEMBERS🔰</b>\n\n\
                 Hello @{}! 🎉\n\
                 Please add {} members to this group to get the {}.",
                escape_html(name),
                self.members_per_reward,
                escape_html(&self.reward_name),
            ),
            control: Some(Self::check_button()),
        }
    }

    /// Pop-up text for a button press. Plain text, no markup.
    #[must_use]
    pub fn popup_progress(&self, snapshot: ProgressSnapshot) -> String {
        clip_popup(format!(
            "You have added {} members.\nYou need to add {} more members for a {}!",
            snapshot.cycle_progress, snapshot.remaining, self.reward_name
        ))
    }

    /// Pop-up pointing to the claim link.
    ///
    /// Long reward names are dropped first so the link survives; a link that
    /// alone exceeds the limit is clipped.
    #[must_use]
    pub fn popup_reward_ready(&self) -> String {
        let shortest = format!("Claim here: {}", self.reward_url);
        [
            format!(
                "You have added {} members! Claim your {} here: {}",
                self.members_per_reward, self.reward_name, self.reward_url
            ),
            format!(
                "You have added {} members! Claim here: {}",
                self.members_per_reward, self.reward_url
            ),
        ]
        .into_iter()
        .find(|text| text.chars().count() <= POPUP_LIMIT)
        .unwrap_or_else(|| clip_popup(shortest))
    }

    #[must_use]
    pub fn popup_no_members_yet(&self) -> String {
        "You haven't added any members yet.".to_owned()
    }
}

/// Longest text Telegram accepts in a callback answer.
const POPUP_LIMIT: usize = 200;

/// Cuts `text` to [`POPUP_LIMIT`] characters, marking the cut with `…`.
fn clip_popup(text: String) -> String {
    if text.chars().count() <= POPUP_LIMIT {
        return text;
    }
    let mut clipped: String = text.chars().take(POPUP_LIMIT - 1).collect();
    clipped.push('…');
    clipped
}

/// Escapes the characters Telegram HTML treats specially.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU64;

    use super::*;
    use crate::referral::evaluate;
    use crate::types::ChatId;

    fn templates() -> Templates {
        Templates::new(&ReferralSettings {
            allowed_group_id: ChatId(-100),
            members_per_reward: NonZeroU64::new(5).unwrap(),
            message_lifetime_secs: 10,
            reward_url: "https://t.me/example_bot".to_owned(),
            reward_name: "free report".to_owned(),
        })
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
        assert_eq!(escape_html("Привет 👋"), "Привет 👋");
    }

    #[test]
    fn test_welcome_has_check_button() {
        let n = templates().welcome("alice");
        assert_eq!(n.kind, NotificationKind::Welcome);
        assert!(n.html.contains("@alice"));
        assert!(n.html.contains("add 5 members"));
        assert_eq!(
            n.control,
            Some(Control::Callback {
                label: "How many members have I added?".to_owned(),
                payload: "check_count".to_owned(),
            })
        );
    }

    #[test]
    fn test_reward_ready_links_to_claim_url() {
        let n = templates().reward_ready("bob");
        assert_eq!(n.kind, NotificationKind::RewardReady);
        assert!(matches!(
            n.control,
            Some(Control::Url { ref url, .. }) if url == "https://t.me/example_bot"
        ));
    }

    #[test]
    fn test_progress_text() {
        let n = templates().progress("bob", evaluate(2, NonZeroU64::new(5).unwrap()));
        assert!(n.html.contains("you have added 2 members"));
        assert!(n.html.contains("add 3 more members"));
        assert!(n.control.is_none());
    }

    #[test]
    fn test_names_are_escaped() {
        let n = templates().no_members_yet("<script>");
        assert!(n.html.contains("@&lt;script&gt;"));
        assert!(!n.html.contains("<script>"));
    }

    fn templates_with(reward_url: &str, reward_name: &str) -> Templates {
        Templates::new(&ReferralSettings {
            allowed_group_id: ChatId(-100),
            members_per_reward: NonZeroU64::new(5).unwrap(),
            message_lifetime_secs: 10,
            reward_url: reward_url.to_owned(),
            reward_name: reward_name.to_owned(),
        })
    }

    #[test]
    fn test_popup_texts_fit_telegram_limit() {
        let t = templates();
        let snapshot = evaluate(4, NonZeroU64::new(5).unwrap());
        for text in [t.popup_progress(snapshot), t.popup_reward_ready(), t.popup_no_members_yet()] {
            assert!(text.chars().count() <= POPUP_LIMIT, "{text}");
        }
    }

    #[test]
    fn test_default_reward_popup_is_unchanged() {
        assert_eq!(
            templates().popup_reward_ready(),
            "You have added 5 members! Claim your free report here: https://t.me/example_bot"
        );
    }

    #[test]
    fn test_long_url_popup_keeps_link() {
        let url = format!("https://t.me/{}", "x".repeat(150));
        let text = templates_with(&url, "free plagiarism report").popup_reward_ready();

        assert!(text.chars().count() <= POPUP_LIMIT, "{text}");
        assert!(text.ends_with(&url));
    }

    #[test]
    fn test_long_reward_name_is_dropped_before_link() {
        let name = "very ".repeat(40);
        let text = templates_with("https://t.me/example_bot", &name).popup_reward_ready();

        assert_eq!(text, "You have added 5 members! Claim here: https://t.me/example_bot");
    }

    #[test]
    fn test_oversized_url_popup_is_clipped() {
        let url = format!("https://t.me/{}", "y".repeat(300));
        let text = templates_with(&url, "report").popup_reward_ready();

        assert_eq!(text.chars().count(), POPUP_LIMIT);
        assert!(text.starts_with("Claim here: https://t.me/yyy"));
        assert!(text.ends_with('…'));
    }

    #[test]
    fn test_long_reward_name_progress_popup_is_clipped() {
        let text = templates_with("https://t.me/example_bot", &"ü".repeat(250))
            .popup_progress(evaluate(2, NonZeroU64::new(5).unwrap()));

        assert_eq!(text.chars().count(), POPUP_LIMIT);
        assert!(text.starts_with("You have added 2 members."));
    }
}
