//! End-to-end render scenarios against a shared document.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use hypotenuse_dom::{
    DelayedComponent, Document, DocumentTree, Element, ElementId, ReactiveComponent, Renderable,
    Renderer, ROOT_ID,
};

fn root() -> ElementId {
    ROOT_ID.into()
}

#[tokio::test]
async fn mount_records_before_attach_after() {
    let log = Arc::new(Mutex::new(Vec::<&'static str>::new()));
    let renderer = Renderer::new(Document::new());

    let (before, after, attach) = (log.clone(), log.clone(), log.clone());
    let component = ReactiveComponent::new()
        .before_render(move |_| {
            let log = before.clone();
            async move {
                log.lock().unwrap().push("before");
                Ok(())
            }
        })
        .after_render(move |_| {
            let log = after.clone();
            async move {
                log.lock().unwrap().push("after");
                Ok(())
            }
        });

    renderer
        .render_element(component, move |tree: &mut DocumentTree, el: Element| {
            attach.lock().unwrap().push("attach");
            tree.append_child(&root(), el)
        })
        .await
        .unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["before", "attach", "after"]);
}

#[tokio::test]
async fn deferred_mount_waits_for_resolution() {
    let doc = Document::new();
    let renderer = Renderer::new(doc.clone());
    let (tx, rx) = tokio::sync::oneshot::channel::<&'static str>();

    let pending = tokio::spawn({
        let renderer = renderer.clone();
        async move {
            let deferred = Renderable::deferred(async move {
                let text = rx.await?;
                Ok(Element::new("p").with_id("greeting").with_child(text))
            });
            renderer.render_element_as_append(deferred, &root()).await
        }
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(doc.snapshot().children().len(), 0);

    tx.send("hello").unwrap();
    let handle = pending.await.unwrap().unwrap();
    assert_eq!(handle.text_content().as_deref(), Some("hello"));
}

#[tokio::test]
async fn nested_delayed_component_fills_in_after_parent() {
    let renderer = Renderer::new(Document::new());
    let page = ReactiveComponent::new()
        .id("page")
        .child(Element::new("h1").with_child("Title"))
        .child(
            DelayedComponent::new(|| async {
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok(Element::new("ul").with_child(Element::new("li").with_child("item")))
            })
            .wait_until_after_parent_is_rendered(true)
            .build(),
        );

    let handle = renderer.render_element_as_append(page, &root()).await.unwrap();

    assert_eq!(handle.id().as_str(), "page");
    let html = renderer.document().outer_html();
    assert!(html.contains("<li>item</li>"), "{html}");
    assert_eq!(handle.text_content().as_deref(), Some("Titleitem"));
}

#[tokio::test]
async fn replaced_element_is_found_by_original_id() {
    let renderer = Renderer::new(Document::new());
    let first = renderer
        .render_element_as_append(Element::new("span").with_child("v1"), &root())
        .await
        .unwrap();
    let id = first.id().clone();

    renderer
        .replace_element(
            &first,
            Renderable::deferred(async { Ok(Element::new("span").with_child("v2")) }),
        )
        .await
        .unwrap();

    let found = renderer.document().get_element_by_id(&id).unwrap();
    assert_eq!(found.text_content().as_deref(), Some("v2"));
    assert_eq!(renderer.document().snapshot().children().len(), 1);
}
