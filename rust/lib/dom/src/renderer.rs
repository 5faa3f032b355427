use std::future::Future;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::document::{Document, DocumentTree, ElementHandle};
use crate::element::{Element, ElementId};
use crate::error::{RenderError, Result};
use crate::hooks::{collect_lifecycle_hooks, BoxFuture, CollectedHooks, HookContext, Phase};

/// An element that is either ready or still being produced.
pub enum Renderable {
    Ready(Element),
    Deferred(BoxFuture<anyhow::Result<Element>>),
}

impl Renderable {
    pub fn deferred<F>(fut: F) -> Self
    where
        F: Future<Output = anyhow::Result<Element>> + Send + 'static,
    {
        Renderable::Deferred(Box::pin(fut))
    }

    pub async fn resolve(self) -> Result<Element> {
        match self {
            Renderable::Ready(element) => Ok(element),
            Renderable::Deferred(fut) => fut.await.map_err(|e| RenderError::Deferred(e.into())),
        }
    }
}

impl From<Element> for Renderable {
    fn from(element: Element) -> Self {
        Renderable::Ready(element)
    }
}

/// Places a fully built element into the document.
///
/// Called exactly once per mount, between the before and after phases.
/// Closures `FnOnce(&mut DocumentTree, Element) -> Result<()>` implement it.
pub trait AttachStrategy: Send {
    fn attach(self, tree: &mut DocumentTree, element: Element) -> Result<()>;
}

impl<F> AttachStrategy for F
where
    F: FnOnce(&mut DocumentTree, Element) -> Result<()> + Send,
{
    fn attach(self, tree: &mut DocumentTree, element: Element) -> Result<()> {
        self(tree, element)
    }
}

/// Append as the last child of a container.
pub struct AppendTo(pub ElementId);

impl AttachStrategy for AppendTo {
    fn attach(self, tree: &mut DocumentTree, element: Element) -> Result<()> {
        tree.append_child(&self.0, element)
    }
}

/// Swap into the position of an existing element.
pub struct ReplaceWith(pub ElementId);

impl AttachStrategy for ReplaceWith {
    fn attach(self, tree: &mut DocumentTree, element: Element) -> Result<()> {
        tree.replace_with(&self.0, element)
    }
}

/// Mount/replace engine bound to one document.
///
/// Every mount runs the same pipeline:
///
/// 1. resolve a deferred element
/// 2. assign an id if the element has none
/// 3. collect lifecycle hooks from the element and its descendants
/// 4. run all `before_render` hooks concurrently and wait for them
/// 5. attach (the only document mutation)
/// 6. run all `after_render` hooks concurrently and wait for them
/// 7. return a handle located by the assigned id
///
/// A failed before phase aborts the mount without attaching. Within a
/// phase, every hook settles before the first failure is returned.
#[derive(Clone)]
pub struct Renderer {
    document: Document,
}

impl Renderer {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub async fn render_element<A>(
        &self,
        element: impl Into<Renderable>,
        attach: A,
    ) -> Result<ElementHandle>
    where
        A: AttachStrategy,
    {
        let element = element.into().resolve().await?;
        self.mount(element, None, attach).await
    }

    pub async fn render_element_as_append(
        &self,
        element: impl Into<Renderable>,
        container: &ElementId,
    ) -> Result<ElementHandle> {
        self.render_element(element, AppendTo(container.clone())).await
    }

    /// Swap `replacement` into the place of `existing`, keeping its id.
    pub async fn replace_element(
        &self,
        existing: &ElementHandle,
        replacement: impl Into<Renderable>,
    ) -> Result<ElementHandle> {
        let replacement = replacement.into().resolve().await?;
        let target = existing.id().clone();
        if !self.document.contains(&target) {
            return Err(RenderError::ElementNotFound(target));
        }
        self.mount(replacement, Some(target.clone()), ReplaceWith(target))
            .await
    }

    async fn mount<A>(
        &self,
        mut element: Element,
        forced_id: Option<ElementId>,
        attach: A,
    ) -> Result<ElementHandle>
    where
        A: AttachStrategy,
    {
        let id = match forced_id {
            Some(id) => id,
            None => element.id().cloned().unwrap_or_else(ElementId::generate),
        };
        element.set_id(id.clone());

        let hooks = collect_lifecycle_hooks(&mut element);
        debug!(element = %id, hooks = hooks.len(), "Mounting element");

        self.run_phase(Phase::BeforeRender, &hooks).await?;
        {
            let mut tree = self.document.write();
            attach.attach(&mut tree, element)?;
        }
        self.run_phase(Phase::AfterRender, &hooks).await?;

        self.document
            .get_element_by_id(&id)
            .ok_or(RenderError::NotAttached(id))
    }

    async fn run_phase(&self, phase: Phase, hooks: &[CollectedHooks]) -> Result<()> {
        if hooks.is_empty() {
            return Ok(());
        }
        let results = join_all(hooks.iter().map(|c| {
            c.hooks.invoke(
                phase,
                HookContext {
                    element: c.element.clone(),
                    renderer: self.clone(),
                },
            )
        }))
        .await;

        let total = results.len();
        let mut first = None;
        let mut failed = 0;
        for (collected, result) in hooks.iter().zip(results) {
            if let Err(e) = result {
                warn!(element = %collected.element, %phase, "Lifecycle hook failed: {e:#}");
                failed += 1;
                if first.is_none() {
                    first = Some((collected.element.clone(), e));
                }
            }
        }

        match first {
            None => Ok(()),
            Some((element, source)) => Err(RenderError::Hook {
                phase,
                element,
                failed,
                total,
                source: source.into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::*;
    use crate::document::ROOT_ID;
    use crate::hooks::LifecycleHooks;

    type Log = Arc<Mutex<Vec<String>>>;

    fn recording_hooks(log: &Log, name: &'static str) -> LifecycleHooks {
        let before = log.clone();
        let after = log.clone();
        LifecycleHooks::new()
            .before_render(move |ctx: HookContext| {
                let log = before.clone();
                async move {
                    let attached = ctx.renderer.document().contains(&ctx.element);
                    log.lock()
                        .unwrap()
                        .push(format!("before:{name}:attached={attached}"));
                    Ok(())
                }
            })
            .after_render(move |ctx: HookContext| {
                let log = after.clone();
                async move {
                    let attached = ctx.renderer.document().contains(&ctx.element);
                    log.lock()
                        .unwrap()
                        .push(format!("after:{name}:attached={attached}"));
                    Ok(())
                }
            })
    }

    fn root() -> ElementId {
        ROOT_ID.into()
    }

    // ========================================================================
    // Mount order
    // ========================================================================

    #[tokio::test]
    async fn before_attach_after_order() {
        let log: Log = Arc::default();
        let renderer = Renderer::new(Document::new());
        let el = Element::new("div").with_hooks(recording_hooks(&log, "a"));

        let attach_log = log.clone();
        let handle = renderer
            .render_element(el, move |tree: &mut DocumentTree, el: Element| {
                attach_log.lock().unwrap().push("attach".into());
                tree.append_child(&ROOT_ID.into(), el)
            })
            .await
            .unwrap();

        assert!(handle.is_attached());
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "before:a:attached=false",
                "attach",
                "after:a:attached=true",
            ]
        );
    }

    #[tokio::test]
    async fn descendant_hooks_run_in_both_phases() {
        let log: Log = Arc::default();
        let renderer = Renderer::new(Document::new());
        let el = Element::new("div")
            .with_hooks(recording_hooks(&log, "parent"))
            .with_child(Element::new("div").with_hooks(recording_hooks(&log, "child")));

        renderer
            .render_element_as_append(el, &root())
            .await
            .unwrap();

        let entries = log.lock().unwrap().clone();
        assert_eq!(entries.len(), 4);
        assert!(entries[..2].iter().all(|e| e.starts_with("before:")));
        assert!(entries[2..].iter().all(|e| e.ends_with("attached=true")));
    }

    #[tokio::test]
    async fn plain_element_mounts_with_generated_id() {
        let renderer = Renderer::new(Document::new());
        let handle = renderer
            .render_element_as_append(Element::new("p").with_child("hi"), &root())
            .await
            .unwrap();
        assert!(!handle.id().as_str().is_empty());
        assert_eq!(handle.text_content().as_deref(), Some("hi"));
    }

    #[tokio::test]
    async fn existing_id_is_kept() {
        let renderer = Renderer::new(Document::new());
        let handle = renderer
            .render_element_as_append(Element::new("p").with_id("mine"), &root())
            .await
            .unwrap();
        assert_eq!(handle.id().as_str(), "mine");
    }

    // ========================================================================
    // Deferred elements
    // ========================================================================

    #[tokio::test]
    async fn deferred_element_is_not_attached_before_it_resolves() {
        let doc = Document::new();
        let renderer = Renderer::new(doc.clone());
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let deferred = Renderable::deferred(async move {
            rx.await?;
            Ok(Element::new("div").with_id("late"))
        });
        let task = tokio::spawn({
            let renderer = renderer.clone();
            async move { renderer.render_element_as_append(deferred, &root()).await }
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!doc.contains(&"late".into()));

        tx.send(()).unwrap();
        let handle = task.await.unwrap().unwrap();
        assert_eq!(handle.id().as_str(), "late");
        assert!(doc.contains(&"late".into()));
    }

    #[tokio::test]
    async fn deferred_failure_is_reported() {
        let renderer = Renderer::new(Document::new());
        let deferred = Renderable::deferred(async { Err(anyhow::anyhow!("no data")) });
        let err = renderer
            .render_element_as_append(deferred, &root())
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::Deferred(_)));
        assert_eq!(renderer.document().snapshot().children().len(), 0);
    }

    // ========================================================================
    // Replace
    // ========================================================================

    #[tokio::test]
    async fn replace_keeps_identity() {
        let renderer = Renderer::new(Document::new());
        let first = renderer
            .render_element_as_append(Element::new("p").with_child("old"), &root())
            .await
            .unwrap();

        let second = renderer
            .replace_element(&first, Element::new("p").with_id("ignored").with_child("new"))
            .await
            .unwrap();

        assert_eq!(second.id(), first.id());
        assert_eq!(first.text_content().as_deref(), Some("new"));
        assert!(!renderer.document().contains(&"ignored".into()));
    }

    #[tokio::test]
    async fn replace_runs_replacement_hooks() {
        let log: Log = Arc::default();
        let renderer = Renderer::new(Document::new());
        let first = renderer
            .render_element_as_append(Element::new("div"), &root())
            .await
            .unwrap();
        renderer
            .replace_element(&first, Element::new("div").with_hooks(recording_hooks(&log, "r")))
            .await
            .unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            vec!["before:r:attached=true", "after:r:attached=true"]
        );
    }

    #[tokio::test]
    async fn replace_detached_element_fails() {
        let renderer = Renderer::new(Document::new());
        let handle = renderer
            .render_element_as_append(Element::new("p").with_id("gone"), &root())
            .await
            .unwrap();
        renderer
            .document()
            .replace_with(&"gone".into(), Element::new("p").with_id("other"))
            .unwrap();

        let err = renderer
            .replace_element(&handle, Element::new("p"))
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::ElementNotFound(_)));
    }

    // ========================================================================
    // Hook failures
    // ========================================================================

    #[tokio::test]
    async fn failed_before_hook_prevents_attach_after_siblings_settle() {
        let settled = Arc::new(Mutex::new(false));
        let renderer = Renderer::new(Document::new());

        let flag = settled.clone();
        let el = Element::new("div")
            .with_id("parent")
            .with_hooks(LifecycleHooks::new().before_render(|_| async {
                Err::<(), _>(anyhow::anyhow!("boom"))
            }))
            .with_child(Element::new("div").with_hooks(LifecycleHooks::new().before_render(
                move |_| {
                    let flag = flag.clone();
                    async move {
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        *flag.lock().unwrap() = true;
                        Ok(())
                    }
                },
            )));

        let err = renderer
            .render_element_as_append(el, &root())
            .await
            .unwrap_err();
        match err {
            RenderError::Hook {
                phase,
                element,
                failed,
                total,
                ..
            } => {
                assert_eq!(phase, Phase::BeforeRender);
                assert_eq!(element.as_str(), "parent");
                assert_eq!((failed, total), (1, 2));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(*settled.lock().unwrap());
        assert!(!renderer.document().contains(&"parent".into()));
    }

    #[tokio::test]
    async fn failed_after_hook_leaves_element_attached() {
        let renderer = Renderer::new(Document::new());
        let el = Element::new("div")
            .with_id("x")
            .with_hooks(LifecycleHooks::new().after_render(|_| async {
                Err::<(), _>(anyhow::anyhow!("late failure"))
            }));
        let err = renderer
            .render_element_as_append(el, &root())
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::Hook { phase: Phase::AfterRender, .. }));
        assert!(renderer.document().contains(&"x".into()));
    }

    #[tokio::test]
    async fn attach_to_missing_container_fails() {
        let renderer = Renderer::new(Document::new());
        let err = renderer
            .render_element_as_append(Element::new("div"), &"ghost".into())
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::ElementNotFound(_)));
    }
}
