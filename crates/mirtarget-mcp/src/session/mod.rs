//! Per-connection session state: the lookup engine and the breadcrumb log.

pub mod breadcrumbs;
pub mod manager;

pub use breadcrumbs::{Breadcrumb, BreadcrumbStore};
pub use manager::LookupSessionManager;
