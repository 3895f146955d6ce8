//! Route gate commands.

use driphub_storefront::routing::{GateDecision, ROUTES, breadcrumbs_for};
use driphub_storefront::state::AppState;

pub async fn check(state: &AppState, path: &str) {
    state.start().await;

    match state.gate().check_path(path) {
        GateDecision::Allow => {
            println!("allow");
            println!("title: {}", state.gate().document().title());
            println!("breadcrumb: {}", breadcrumbs_for(path).join(" > "));
        }
        GateDecision::Loading => println!("loading"),
        GateDecision::Redirect(target) => println!("redirect {target}"),
    }
}

pub fn list() {
    for route in ROUTES {
        let access = match (route.meta.requires_auth, route.meta.required_role) {
            (_, Some(role)) => format!("role:{role}"),
            (true, None) => "signed-in".to_string(),
            (false, None) if route.meta.redirect_if_auth.is_some() => "guest".to_string(),
            (false, None) => "public".to_string(),
        };
        println!("{:<24} {:<18} {access}", route.path, route.name);
    }
}
