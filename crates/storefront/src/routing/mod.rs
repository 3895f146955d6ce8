//! Route table and route authorization gate.

mod gate;
mod table;

pub use gate::{GateDecision, RouteGate, decide};
pub use table::{
    Layout, ROUTES, RouteConfig, RouteMeta, breadcrumbs_for, matches_pattern, navigation_routes,
    paths, protected_routes, public_routes, route_by_path,
};
