//! Action-key protocol: translates a single keypress plus the current UI
//! context into one of a fixed set of actions.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionContext {
    Summary,
    Detail,
    Diff,
    Compare,
}

#[derive(Debug, Clone)]
pub struct ActionBarConfig {
    pub context: ActionContext,
    pub winner_id: Option<String>,
    pub current_iteration_id: Option<String>,
    pub can_go_prev_file: bool,
    pub can_go_next_file: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Accept { target: Option<String> },
    Reject { target: Option<String> },
    RejectAll,
    RequestChanges,
    ViewDetails { winner_id: Option<String> },
    ViewDiff { target: Option<String> },
    Compare,
    NextFile,
    PrevFile,
    BackToSummary,
    ManualReview,
}

/// Map a single keypress plus the current context to an [`Action`], per the
/// keybinding table. Case-insensitive; unknown keys return `None`.
#[must_use]
pub fn parse_action(key: char, config: &ActionBarConfig) -> Option<Action> {
    match key.to_ascii_lowercase() {
        'a' => {
            let target = config.current_iteration_id.clone().or_else(|| config.winner_id.clone());
            Some(Action::Accept { target })
        }
        'x' => {
            if config.context == ActionContext::Summary {
                Some(Action::RejectAll)
            } else {
                Some(Action::Reject { target: config.current_iteration_id.clone() })
            }
        }
        'v' => Some(Action::ViewDetails { winner_id: config.winner_id.clone() }),
        'd' => {
            let target = config.current_iteration_id.clone().or_else(|| config.winner_id.clone());
            Some(Action::ViewDiff { target })
        }
        'c' => Some(Action::Compare),
        'r' => Some(Action::RequestChanges),
        'b' | 'q' => Some(Action::BackToSummary),
        'n' => Some(Action::NextFile),
        'p' => Some(Action::PrevFile),
        'm' => Some(Action::ManualReview),
        _ => None,
    }
}
