//! Kind-specific transition rules.
//!
//! Consolidates which interactions each objective kind accepts, so the
//! state machine never branches on map identity.

use warfront_core::enums::ObjectiveKind;

/// What an assault window does when it runs out undefended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutRule {
    /// The assaulting team takes control.
    Control,
    /// The structure burns.
    Destroy,
}

/// Transition rules for one objective kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindRules {
    /// Accepts assault/defend clicks.
    pub assaultable: bool,
    pub on_timeout: TimeoutRule,
    /// Can be destroyed by damage.
    pub destructible: bool,
    /// Can be captured outright by a scripted event.
    pub scripted_capture: bool,
    /// Provides a resurrection point to its controller.
    pub graveyard: bool,
    /// Picked up and carried (flags).
    pub carried: bool,
}

/// Get the rules for a given objective kind.
pub fn rules_for(kind: ObjectiveKind) -> KindRules {
    match kind {
        ObjectiveKind::Grave => KindRules {
            assaultable: true,
            on_timeout: TimeoutRule::Control,
            destructible: false,
            scripted_capture: true,
            graveyard: true,
            carried: false,
        },
        ObjectiveKind::Tower => KindRules {
            assaultable: true,
            on_timeout: TimeoutRule::Destroy,
            destructible: true,
            scripted_capture: false,
            graveyard: false,
            carried: false,
        },
        ObjectiveKind::Flag => KindRules {
            assaultable: false,
            on_timeout: TimeoutRule::Control,
            destructible: false,
            scripted_capture: false,
            graveyard: false,
            carried: true,
        },
        ObjectiveKind::Mine => KindRules {
            assaultable: false,
            on_timeout: TimeoutRule::Control,
            destructible: false,
            scripted_capture: true,
            graveyard: false,
            carried: false,
        },
        ObjectiveKind::Gate => KindRules {
            assaultable: false,
            on_timeout: TimeoutRule::Control,
            destructible: true,
            scripted_capture: false,
            graveyard: false,
            carried: false,
        },
        ObjectiveKind::RelicPoint => KindRules {
            assaultable: false,
            on_timeout: TimeoutRule::Control,
            destructible: false,
            scripted_capture: true,
            graveyard: false,
            carried: false,
        },
    }
}
