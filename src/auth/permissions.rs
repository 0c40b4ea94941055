use crate::error::ApiError;
use crate::user::repo::User;

/// The actions a resource endpoint can dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    List,
    Retrieve,
    Create,
    Update,
    PartialUpdate,
    Destroy,
}

impl Action {
    pub fn is_mutation(self) -> bool {
        matches!(
            self,
            Action::Create | Action::Update | Action::PartialUpdate | Action::Destroy
        )
    }
}

/// Shared gate for recipe, food and activity endpoints: mutations are
/// reserved for staff accounts, reads for any authenticated user. There is
/// deliberately no per-owner check here; see DESIGN.md.
pub fn check_resource_permission(action: Action, user: &User) -> Result<(), ApiError> {
    if action.is_mutation() && !user.is_staff {
        return Err(ApiError::PermissionDenied);
    }
    Ok(())
}
