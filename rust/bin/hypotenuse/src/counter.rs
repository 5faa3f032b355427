//! Counter component bound to `local.count`.

use std::sync::{Arc, Mutex};

use anyhow::Context;
use hypotenuse_dom::{Element, ElementId, HookContext, ReactiveComponent, Renderer};
use hypotenuse_flux::{Disposer, StateStore};
use serde_json::Value;
use tracing::debug;

pub const COUNT_PATH: &str = "local.count";

/// Build a counter that shows the value at [`COUNT_PATH`].
///
/// Once rendered it subscribes to the store and re-renders its value span
/// on every change. Disposers are pushed into `subscriptions`.
pub fn counter(store: Arc<StateStore>, subscriptions: Arc<Mutex<Vec<Disposer>>>) -> Element {
    let value_id = ElementId::generate();
    let value_span = Element::new("span").with_id(value_id.clone());

    ReactiveComponent::new()
        .after_render(move |ctx: HookContext| {
            let store = store.clone();
            let subscriptions = subscriptions.clone();
            let value_id = value_id.clone();
            async move {
                let renderer = ctx.renderer.clone();
                let target = value_id.clone();
                let (current, disposer) =
                    store.get_state_and_listen_for_changes(COUNT_PATH, false, move |value| {
                        let renderer = renderer.clone();
                        let target = target.clone();
                        async move { show_count(&renderer, &target, value).await }
                    })?;
                subscriptions.lock().unwrap().push(disposer);
                show_count(&ctx.renderer, &value_id, current).await
            }
        })
        .child(Element::new("span").with_child("Count: "))
        .child(value_span)
        .build()
}

async fn show_count(renderer: &Renderer, target: &ElementId, value: Option<Value>) -> anyhow::Result<()> {
    let existing = renderer
        .document()
        .get_element_by_id(target)
        .with_context(|| format!("counter value '{target}' is not in the document"))?;
    let text = value.map(|v| v.to_string()).unwrap_or_else(|| "0".to_string());
    debug!(element = %target, "Showing count {text}");
    renderer
        .replace_element(&existing, Element::new("span").with_child(text))
        .await?;
    Ok(())
}
