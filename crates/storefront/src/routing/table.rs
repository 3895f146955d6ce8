//! Storefront route table.
//!
//! Each route declares its page metadata and its access rules. The table is
//! static; lookups strip any query string or fragment and accept `:param`
//! segments in route patterns.

/// Well-known route paths.
pub mod paths {
    pub const HOME: &str = "/";
    pub const PRODUCTS: &str = "/products";
    pub const PRODUCT_DETAILS: &str = "/product/:id";
    pub const DEALS: &str = "/deals";
    pub const SEARCH: &str = "/search";

    pub const LOGIN: &str = "/login";
    pub const REGISTER: &str = "/signup";
    pub const FORGOT_PASSWORD: &str = "/forgot-password";
    pub const RESET_PASSWORD: &str = "/reset-password";

    pub const ACCOUNT: &str = "/account";
    pub const PROFILE: &str = "/account/profile";
    pub const ORDERS: &str = "/account/orders";

    pub const CART: &str = "/cart";
    pub const CHECKOUT: &str = "/checkout";
    pub const WISHLIST: &str = "/wishlist";

    pub const ADMIN: &str = "/admin";

    pub const NOT_FOUND: &str = "/404";
    pub const UNAUTHORIZED: &str = "/401";
}

/// Page shell a route renders inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Main,
    Auth,
    Account,
    Checkout,
    Admin,
    Error,
}

/// Page metadata and access rules for a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteMeta {
    pub title: &'static str,
    pub description: &'static str,
    /// Only a signed-in user may view the route
    pub requires_auth: bool,
    /// Where signed-out users are sent; the login page when unset
    pub redirect_unauth: Option<&'static str>,
    /// Where signed-in users are sent instead (login and signup pages)
    pub redirect_if_auth: Option<&'static str>,
    pub required_role: Option<&'static str>,
    pub show_in_nav: bool,
    pub breadcrumb: &'static [&'static str],
}

impl RouteMeta {
    /// Metadata for a public page with no access rules.
    #[must_use]
    pub const fn public(title: &'static str, description: &'static str) -> Self {
        Self {
            title,
            description,
            requires_auth: false,
            redirect_unauth: None,
            redirect_if_auth: None,
            required_role: None,
            show_in_nav: false,
            breadcrumb: &["Home"],
        }
    }
}

/// A route pattern with its metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteConfig {
    pub path: &'static str,
    pub name: &'static str,
    pub layout: Layout,
    pub meta: RouteMeta,
}

const fn route(
    path: &'static str,
    name: &'static str,
    layout: Layout,
    meta: RouteMeta,
) -> RouteConfig {
    RouteConfig {
        path,
        name,
        layout,
        meta,
    }
}

const fn nav(mut meta: RouteMeta, breadcrumb: &'static [&'static str]) -> RouteMeta {
    meta.show_in_nav = true;
    meta.breadcrumb = breadcrumb;
    meta
}

const fn crumbs(mut meta: RouteMeta, breadcrumb: &'static [&'static str]) -> RouteMeta {
    meta.breadcrumb = breadcrumb;
    meta
}

const fn guest_only(mut meta: RouteMeta, breadcrumb: &'static [&'static str]) -> RouteMeta {
    meta.redirect_if_auth = Some(paths::HOME);
    meta.breadcrumb = breadcrumb;
    meta
}

const fn signed_in(mut meta: RouteMeta, breadcrumb: &'static [&'static str]) -> RouteMeta {
    meta.requires_auth = true;
    meta.redirect_unauth = Some(paths::LOGIN);
    meta.breadcrumb = breadcrumb;
    meta
}

/// Every storefront route.
pub static ROUTES: &[RouteConfig] = &[
    route(
        paths::HOME,
        "Home",
        Layout::Main,
        nav(
            RouteMeta::public(
                "DripHub - Your Online Store",
                "Discover amazing products at unbeatable prices",
            ),
            &["Home"],
        ),
    ),
    route(
        paths::PRODUCTS,
        "Products",
        Layout::Main,
        nav(
            RouteMeta::public(
                "All Products - DripHub",
                "Browse our complete product catalog",
            ),
            &["Home", "Products"],
        ),
    ),
    route(
        paths::PRODUCT_DETAILS,
        "ProductDetails",
        Layout::Main,
        crumbs(
            RouteMeta::public(
                "Product Details - DripHub",
                "View detailed product information",
            ),
            &["Home", "Products", "Product Details"],
        ),
    ),
    route(
        paths::DEALS,
        "Deals",
        Layout::Main,
        nav(
            RouteMeta::public("Today's Deals - DripHub", "Special offers and discounts"),
            &["Home", "Deals"],
        ),
    ),
    route(
        paths::SEARCH,
        "Search",
        Layout::Main,
        crumbs(
            RouteMeta::public("Search Results - DripHub", "Search results for your query"),
            &["Home", "Search"],
        ),
    ),
    route(
        paths::LOGIN,
        "Login",
        Layout::Auth,
        guest_only(
            RouteMeta::public("Login - DripHub", "Sign in to your account"),
            &["Home", "Login"],
        ),
    ),
    route(
        paths::REGISTER,
        "SignUp",
        Layout::Auth,
        guest_only(
            RouteMeta::public("Sign Up - DripHub", "Create a new account"),
            &["Home", "Sign Up"],
        ),
    ),
    route(
        paths::FORGOT_PASSWORD,
        "ForgotPassword",
        Layout::Auth,
        guest_only(
            RouteMeta::public("Forgot Password - DripHub", "Reset your password"),
            &["Home", "Forgot Password"],
        ),
    ),
    route(
        paths::RESET_PASSWORD,
        "ResetPassword",
        Layout::Auth,
        guest_only(
            RouteMeta::public("Reset Password - DripHub", "Choose a new password"),
            &["Home", "Reset Password"],
        ),
    ),
    route(
        paths::CART,
        "Cart",
        Layout::Main,
        crumbs(
            RouteMeta::public("Shopping Cart - DripHub", "Review your cart items"),
            &["Home", "Cart"],
        ),
    ),
    route(
        paths::CHECKOUT,
        "Checkout",
        Layout::Checkout,
        signed_in(
            RouteMeta::public("Checkout - DripHub", "Complete your purchase"),
            &["Home", "Cart", "Checkout"],
        ),
    ),
    route(
        paths::WISHLIST,
        "Wishlist",
        Layout::Main,
        signed_in(
            RouteMeta::public("Wishlist - DripHub", "Your saved items"),
            &["Home", "Wishlist"],
        ),
    ),
    route(
        paths::ACCOUNT,
        "Account",
        Layout::Account,
        signed_in(
            RouteMeta::public("My Account - DripHub", "Manage your account"),
            &["Home", "Account"],
        ),
    ),
    route(
        paths::PROFILE,
        "Profile",
        Layout::Account,
        signed_in(
            RouteMeta::public("Profile - DripHub", "Edit your profile information"),
            &["Home", "Account", "Profile"],
        ),
    ),
    route(
        paths::ORDERS,
        "Orders",
        Layout::Account,
        signed_in(
            RouteMeta::public("My Orders - DripHub", "View your order history"),
            &["Home", "Account", "Orders"],
        ),
    ),
    route(
        paths::ADMIN,
        "Admin",
        Layout::Admin,
        RouteMeta {
            required_role: Some("admin"),
            ..signed_in(
                RouteMeta::public("Admin - DripHub", "Store administration"),
                &["Home", "Admin"],
            )
        },
    ),
    route(
        paths::NOT_FOUND,
        "NotFound",
        Layout::Error,
        crumbs(
            RouteMeta::public(
                "Page Not Found - DripHub",
                "The page you're looking for doesn't exist",
            ),
            &["Home", "404"],
        ),
    ),
    route(
        paths::UNAUTHORIZED,
        "Unauthorized",
        Layout::Error,
        crumbs(
            RouteMeta::public(
                "Access Denied - DripHub",
                "You don't have permission to view this page",
            ),
            &["Home", "401"],
        ),
    ),
];

const HOME_ONLY: &[&str] = &["Home"];

/// Strip the query string, fragment and any trailing slash.
fn normalize(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let path = path.get(..end).unwrap_or(path);
    if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    }
}

/// Whether `path` matches `pattern`, where `:name` segments match any
/// single non-empty segment.
#[must_use]
pub fn matches_pattern(pattern: &str, path: &str) -> bool {
    let path = normalize(path);
    let mut pattern_segments = pattern.split('/');
    let mut path_segments = path.split('/');
    loop {
        match (pattern_segments.next(), path_segments.next()) {
            (None, None) => return true,
            (Some(p), Some(s)) if p.starts_with(':') => {
                if s.is_empty() {
                    return false;
                }
            }
            (Some(p), Some(s)) if p == s => {}
            _ => return false,
        }
    }
}

/// Find the route for `path`. Exact matches win over `:param` patterns.
#[must_use]
pub fn route_by_path(path: &str) -> Option<&'static RouteConfig> {
    let normalized = normalize(path);
    ROUTES
        .iter()
        .find(|r| r.path == normalized)
        .or_else(|| ROUTES.iter().find(|r| matches_pattern(r.path, normalized)))
}

/// Routes anyone may view.
pub fn public_routes() -> impl Iterator<Item = &'static RouteConfig> {
    ROUTES.iter().filter(|r| !r.meta.requires_auth)
}

/// Routes that need a signed-in user.
pub fn protected_routes() -> impl Iterator<Item = &'static RouteConfig> {
    ROUTES.iter().filter(|r| r.meta.requires_auth)
}

/// Routes shown in the main navigation, in table order.
pub fn navigation_routes() -> impl Iterator<Item = &'static RouteConfig> {
    ROUTES.iter().filter(|r| r.meta.show_in_nav)
}

/// Breadcrumb trail for `path`; just `Home` for unknown paths.
#[must_use]
pub fn breadcrumbs_for(path: &str) -> &'static [&'static str] {
    route_by_path(path).map_or(HOME_ONLY, |r| r.meta.breadcrumb)
}
