//! Process-wide document head (page title and meta description).

use std::sync::{PoisonError, RwLock};

use crate::routing::RouteMeta;

const DEFAULT_TITLE: &str = "DripHub - Your Online Store";
const DEFAULT_DESCRIPTION: &str = "Discover amazing products at unbeatable prices";

#[derive(Debug, Clone, PartialEq, Eq)]
struct Head {
    title: String,
    description: String,
}

/// Title and description of the page currently shown.
///
/// Updated by the route gate each time it allows a route.
#[derive(Debug)]
pub struct DocumentHead {
    head: RwLock<Head>,
}

impl Default for DocumentHead {
    fn default() -> Self {
        Self {
            head: RwLock::new(Head {
                title: DEFAULT_TITLE.to_string(),
                description: DEFAULT_DESCRIPTION.to_string(),
            }),
        }
    }
}

impl DocumentHead {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `meta`'s title and description.
    pub fn apply(&self, meta: &RouteMeta) {
        let mut head = self.head.write().unwrap_or_else(PoisonError::into_inner);
        meta.title.clone_into(&mut head.title);
        meta.description.clone_into(&mut head.description);
    }

    #[must_use]
    pub fn title(&self) -> String {
        self.head
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .title
            .clone()
    }

    #[must_use]
    pub fn description(&self) -> String {
        self.head
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .description
            .clone()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::routing::route_by_path;

    #[test]
    fn test_apply_route_meta() {
        let head = DocumentHead::new();
        assert_eq!(head.title(), "DripHub - Your Online Store");

        head.apply(&route_by_path("/cart").unwrap().meta);
        assert_eq!(head.title(), "Shopping Cart - DripHub");
        assert_eq!(head.description(), "Review your cart items");
    }
}
