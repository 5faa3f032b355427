use std::future::Future;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::element::{Element, ElementId, Node};
use crate::hooks::{BoxFuture, HookContext, LifecycleHooks};
use crate::renderer::Renderable;

/// Class carried by every reactive component wrapper.
pub const REACTIVE_COMPONENT_CLASS: &str = "reactive-component";

/// Builder for a lifecycle-bearing `<div class="reactive-component">`.
#[derive(Default)]
pub struct ReactiveComponent {
    id: Option<ElementId>,
    hooks: LifecycleHooks,
    children: Vec<Node>,
}

impl ReactiveComponent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<ElementId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn before_render<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(HookContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.hooks = self.hooks.before_render(f);
        self
    }

    pub fn after_render<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(HookContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.hooks = self.hooks.after_render(f);
        self
    }

    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn build(self) -> Element {
        let mut element = Element::new("div")
            .with_attr("class", REACTIVE_COMPONENT_CLASS)
            .with_children(self.children)
            .with_hooks(self.hooks);
        if let Some(id) = self.id {
            element.set_id(id);
        }
        element
    }
}

impl From<ReactiveComponent> for Element {
    fn from(c: ReactiveComponent) -> Self {
        c.build()
    }
}

impl From<ReactiveComponent> for Renderable {
    fn from(c: ReactiveComponent) -> Self {
        Renderable::Ready(c.build())
    }
}

type Generator = Box<dyn FnOnce() -> BoxFuture<anyhow::Result<Element>> + Send>;

enum Pending {
    Spawned(JoinHandle<anyhow::Result<Element>>),
    Waiting(Generator),
}

/// A reactive component whose content is produced asynchronously.
///
/// It renders a placeholder `<div>` first. Once the component is in the
/// document, its `after_render` hook swaps the placeholder for the generated
/// element via [`Renderer::replace_element`](crate::Renderer::replace_element).
///
/// By default the generator starts as soon as the component is built. With
/// `wait_until_after_parent_is_rendered` it starts from the hook instead.
/// Either way it runs at most once.
pub struct DelayedComponent<F> {
    generate: F,
    wait_until_after_parent_is_rendered: bool,
}

impl<F, Fut> DelayedComponent<F>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = anyhow::Result<Element>> + Send + 'static,
{
    pub fn new(generate: F) -> Self {
        Self {
            generate,
            wait_until_after_parent_is_rendered: false,
        }
    }

    pub fn wait_until_after_parent_is_rendered(mut self, wait: bool) -> Self {
        self.wait_until_after_parent_is_rendered = wait;
        self
    }

    pub fn build(self) -> Element {
        let placeholder = ElementId::generate();
        let generate = self.generate;

        // Spawning needs a runtime; without one the generator waits for the hook.
        let pending = match tokio::runtime::Handle::try_current() {
            Ok(handle) if !self.wait_until_after_parent_is_rendered => {
                Pending::Spawned(handle.spawn(generate()))
            }
            _ => Pending::Waiting(Box::new(
                move || -> BoxFuture<anyhow::Result<Element>> { Box::pin(generate()) },
            )),
        };
        let slot = Arc::new(Mutex::new(Some(pending)));

        let target = placeholder.clone();
        ReactiveComponent::new()
            .after_render(move |ctx: HookContext| {
                let slot = slot.clone();
                let target = target.clone();
                async move {
                    let pending = slot.lock().unwrap().take();
                    let Some(pending) = pending else {
                        return Ok(());
                    };
                    let children = match pending {
                        Pending::Spawned(task) => task.await.context("delayed component task")??,
                        Pending::Waiting(generate) => generate().await?,
                    };
                    let existing = ctx
                        .renderer
                        .document()
                        .get_element_by_id(&target)
                        .with_context(|| format!("placeholder '{target}' is not in the document"))?;
                    debug!(placeholder = %target, "Replacing delayed component placeholder");
                    ctx.renderer.replace_element(&existing, children).await?;
                    Ok(())
                }
            })
            .child(Element::new("div").with_id(placeholder))
            .build()
    }
}

impl<F, Fut> From<DelayedComponent<F>> for Element
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = anyhow::Result<Element>> + Send + 'static,
{
    fn from(c: DelayedComponent<F>) -> Self {
        c.build()
    }
}

impl<F, Fut> From<DelayedComponent<F>> for Renderable
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = anyhow::Result<Element>> + Send + 'static,
{
    fn from(c: DelayedComponent<F>) -> Self {
        Renderable::Ready(c.build())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::document::{Document, ROOT_ID};
    use crate::renderer::Renderer;

    // ========================================================================
    // ReactiveComponent
    // ========================================================================

    #[test]
    fn reactive_component_shape() {
        let el = ReactiveComponent::new().child("hello").build();
        assert_eq!(el.tag(), "div");
        assert_eq!(el.attribute("class"), Some(REACTIVE_COMPONENT_CLASS));
        assert!(el.is_reactive());
        assert_eq!(el.text_content(), "hello");
    }

    #[tokio::test]
    async fn reactive_component_hooks_fire() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (b, a) = (calls.clone(), calls.clone());
        let renderer = Renderer::new(Document::new());
        renderer
            .render_element_as_append(
                ReactiveComponent::new()
                    .before_render(move |_| {
                        let b = b.clone();
                        async move {
                            b.fetch_add(1, Ordering::SeqCst);
                            Ok(())
                        }
                    })
                    .after_render(move |_| {
                        let a = a.clone();
                        async move {
                            a.fetch_add(10, Ordering::SeqCst);
                            Ok(())
                        }
                    }),
                &ROOT_ID.into(),
            )
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 11);
    }

    // ========================================================================
    // DelayedComponent
    // ========================================================================

    #[tokio::test]
    async fn delayed_component_replaces_placeholder() {
        let renderer = Renderer::new(Document::new());
        let handle = renderer
            .render_element_as_append(
                DelayedComponent::new(|| async { Ok(Element::new("p").with_child("loaded")) }),
                &ROOT_ID.into(),
            )
            .await
            .unwrap();

        let component = handle.snapshot().unwrap();
        let child = component.child_elements().next().unwrap();
        assert_eq!(child.tag(), "p");
        assert_eq!(component.text_content(), "loaded");
    }

    #[tokio::test]
    async fn waiting_generator_runs_only_from_hook() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let component = DelayedComponent::new(move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Element::new("span"))
        })
        .wait_until_after_parent_is_rendered(true)
        .build();

        tokio::task::yield_now().await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        let renderer = Renderer::new(Document::new());
        renderer
            .render_element_as_append(component, &ROOT_ID.into())
            .await
            .unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn generator_runs_once_across_remounts() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let component = DelayedComponent::new(move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Element::new("span"))
        })
        .build();

        let renderer = Renderer::new(Document::new());
        let first = renderer
            .render_element_as_append(component.clone(), &ROOT_ID.into())
            .await
            .unwrap();
        renderer.replace_element(&first, component).await.unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn generator_failure_surfaces_as_hook_failure() {
        let renderer = Renderer::new(Document::new());
        let err = renderer
            .render_element_as_append(
                DelayedComponent::new(|| async { Err::<Element, _>(anyhow::anyhow!("fetch failed")) }),
                &ROOT_ID.into(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::RenderError::Hook {
                phase: crate::Phase::AfterRender,
                ..
            }
        ));
    }
}
