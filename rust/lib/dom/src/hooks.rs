use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::element::{Element, ElementId, Node};
use crate::renderer::Renderer;

/// A boxed, `Send`-able future returned by hooks and deferred elements.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Type-erased lifecycle callback.
pub type Hook = Arc<dyn Fn(HookContext) -> BoxFuture<anyhow::Result<()>> + Send + Sync>;

/// What a hook receives: the id of the element it belongs to and the
/// renderer mounting it.
///
/// During `before_render` the element is not in the document yet.
#[derive(Clone)]
pub struct HookContext {
    pub element: ElementId,
    pub renderer: Renderer,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    BeforeRender,
    AfterRender,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::BeforeRender => f.write_str("before_render"),
            Phase::AfterRender => f.write_str("after_render"),
        }
    }
}

fn noop() -> Hook {
    Arc::new(|_: HookContext| -> BoxFuture<anyhow::Result<()>> {
        Box::pin(async { Ok(()) })
    })
}

/// The before/after pair. Missing hooks are no-ops.
#[derive(Clone)]
pub struct LifecycleHooks {
    before_render: Hook,
    after_render: Hook,
}

impl Default for LifecycleHooks {
    fn default() -> Self {
        Self {
            before_render: noop(),
            after_render: noop(),
        }
    }
}

impl LifecycleHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn before_render<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(HookContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.before_render = Arc::new(move |ctx: HookContext| -> BoxFuture<anyhow::Result<()>> {
            Box::pin(f(ctx))
        });
        self
    }

    pub fn after_render<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(HookContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.after_render = Arc::new(move |ctx: HookContext| -> BoxFuture<anyhow::Result<()>> {
            Box::pin(f(ctx))
        });
        self
    }

    pub fn invoke(&self, phase: Phase, ctx: HookContext) -> BoxFuture<anyhow::Result<()>> {
        match phase {
            Phase::BeforeRender => (self.before_render)(ctx),
            Phase::AfterRender => (self.after_render)(ctx),
        }
    }
}

/// A lifecycle-bearing element found in a subtree.
#[derive(Clone)]
pub struct CollectedHooks {
    pub element: ElementId,
    pub hooks: LifecycleHooks,
}

/// Find every lifecycle-bearing element in `root`'s subtree.
///
/// `root` comes first if it bears hooks, then descendants in document
/// order. Bearers without an id get a generated one so their hooks can be
/// addressed once the subtree is attached.
pub fn collect_lifecycle_hooks(root: &mut Element) -> Vec<CollectedHooks> {
    let mut out = Vec::new();
    collect_into(root, &mut out);
    out
}

fn collect_into(element: &mut Element, out: &mut Vec<CollectedHooks>) {
    if let Some(hooks) = element.hooks().cloned() {
        let id = match element.id() {
            Some(id) => id.clone(),
            None => {
                let id = ElementId::generate();
                element.set_id(id.clone());
                id
            }
        };
        out.push(CollectedHooks { element: id, hooks });
    }
    for node in element.children_mut() {
        if let Node::Element(child) = node {
            collect_into(child, out);
        }
    }
}
