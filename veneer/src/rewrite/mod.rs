//! Query-tree rewriting
//!
//! The portal still sends query payloads written against a much older
//! index mapping. Each rewrite is a pure function on the JSON tree: it
//! receives the full request body, returns a new one, and passes anything
//! it does not understand through untouched. Rewrites are composed per
//! endpoint into a [`RewriteChain`] and run in order before dispatch.

pub mod broaden;
pub mod fields;
pub mod gate;

pub use broaden::MatchBroadener;
pub use fields::TermFieldRewrite;
pub use gate::ShortQueryGate;

use serde_json::Value;

/// A single transformation applied to a request body before dispatch
pub trait Rewrite: Send + Sync {
    /// Short name used in pipeline trace logging
    fn name(&self) -> &str;

    /// Transform the request body. Must be total: malformed input is
    /// passed through, never an error.
    fn apply(&self, body: Value) -> Value;
}

/// Ordered composition of rewrites
#[derive(Default)]
pub struct RewriteChain {
    rewrites: Vec<Box<dyn Rewrite>>,
}

impl RewriteChain {
    pub fn new() -> Self {
        Self { rewrites: Vec::new() }
    }

    /// Append a rewrite to run after the ones already registered
    pub fn then(mut self, rewrite: impl Rewrite + 'static) -> Self {
        self.rewrites.push(Box::new(rewrite));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rewrites.is_empty()
    }

    pub fn apply(&self, body: Value) -> Value {
        let mut body = body;
        for rewrite in &self.rewrites {
            tracing::trace!(rewrite = rewrite.name(), "applying query rewrite");
            body = rewrite.apply(body);
        }
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Tag(&'static str);

    impl Rewrite for Tag {
        fn name(&self) -> &str {
            self.0
        }

        fn apply(&self, body: Value) -> Value {
            let mut trail = body["trail"].as_str().unwrap_or("").to_string();
            trail.push_str(self.0);
            json!({"trail": trail})
        }
    }

    #[test]
    fn chain_applies_in_registration_order() {
        let chain = RewriteChain::new().then(Tag("a")).then(Tag("b")).then(Tag("c"));
        assert_eq!(chain.apply(json!({"trail": ""})), json!({"trail": "abc"}));
    }

    #[test]
    fn empty_chain_is_identity() {
        let body = json!({"query": {"term": {"sex": "female"}}, "size": 3});
        assert!(RewriteChain::new().is_empty());
        assert_eq!(RewriteChain::new().apply(body.clone()), body);
    }
}
