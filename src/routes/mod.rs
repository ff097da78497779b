/// Router Module Index
///
/// Page routes grouped by who may see them. Each group applies its guard at the module
/// level, so a page cannot be registered without one by accident.

/// Open pages, plus guest-only pages behind the public-route guard.
pub mod public;

/// Pages behind the protected-route guard: any signed-in user, or HR staff.
pub mod authenticated;

/// Pages restricted to the `admin` role, nested under `/admin`.
pub mod admin;
