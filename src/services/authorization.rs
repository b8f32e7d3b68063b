use crate::models::Identity;

/// Why a caller may not mutate a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deny {
    /// No resolvable caller identity
    NoIdentity,
    /// Caller is known but does not own the resource
    NotOwner,
}

/// Owner-only access check for update and delete
pub fn authorize(caller: Option<&Identity>, owner: &Identity) -> Result<(), Deny> {
    match caller {
        None => Err(Deny::NoIdentity),
        Some(caller) if caller == owner => Ok(()),
        Some(_) => Err(Deny::NotOwner),
    }
}
