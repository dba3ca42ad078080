use crate::model::db::user::Role;

/// Something an authenticated user may be allowed to do, determined by their role.
pub trait Capability {
    /// Human-readable name, used in error messages.
    const NAME: &'static str;

    /// Does a user with this role hold the capability?
    fn permits(role: Role) -> bool;
}

/// Students: voting and standing as a candidate.
pub struct Student;

/// Administrators: managing clubs, elections and candidacies, and viewing results.
pub struct Admin;

/// Any logged-in user.
pub struct Authenticated;

impl Capability for Student {
    const NAME: &'static str = "student";

    fn permits(role: Role) -> bool {
        role == Role::Student
    }
}

impl Capability for Admin {
    const NAME: &'static str = "admin";

    fn permits(role: Role) -> bool {
        role == Role::Admin
    }
}

impl Capability for Authenticated {
    const NAME: &'static str = "authenticated";

    fn permits(_role: Role) -> bool {
        true
    }
}
