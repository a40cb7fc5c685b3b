use estate_login::Role;

/// Session lifecycle notifications broadcast by [`crate::Client`].
///
/// The access layer never navigates or prompts on its own; a front-end
/// subscribes and decides what `SessionExpired` means for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    LoggedIn { role: Option<Role> },
    Renewed,
    /// Renewal failed and the local session was cleared.
    SessionExpired,
    LoggedOut,
}
