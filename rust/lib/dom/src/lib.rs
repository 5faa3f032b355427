//! Dom: element tree and async render lifecycle for Hypotenuse apps.
//!
//! # Mounting
//!
//! Every render goes through the same pipeline in [`Renderer`]:
//! resolve a deferred element, assign an id, collect lifecycle hooks,
//! run `before_render` hooks, attach, run `after_render` hooks, and
//! return a live [`ElementHandle`].
//!
//! - `render_element(element, attach)`: attach with any [`AttachStrategy`]
//! - `render_element_as_append(element, container)`: append under a container
//! - `replace_element(existing, replacement)`: swap in place, keeping the id
//!
//! # Components
//!
//! - [`ReactiveComponent`]: a lifecycle-bearing wrapper `div`
//! - [`DelayedComponent`]: a placeholder swapped for asynchronously
//!   generated content once the parent is rendered
//!
//! # Example
//!
//! ```ignore
//! use hypotenuse_dom::{Document, ReactiveComponent, Renderer, ROOT_ID};
//!
//! let renderer = Renderer::new(Document::new());
//! let handle = renderer
//!     .render_element_as_append(
//!         ReactiveComponent::new()
//!             .after_render(|ctx| async move {
//!                 println!("mounted {}", ctx.element);
//!                 Ok(())
//!             })
//!             .child("hello"),
//!         &ROOT_ID.into(),
//!     )
//!     .await?;
//! ```

pub mod components;
pub mod document;
pub mod element;
pub mod error;
pub mod hooks;
pub mod renderer;

pub use components::{DelayedComponent, ReactiveComponent, REACTIVE_COMPONENT_CLASS};
pub use document::{Document, DocumentTree, ElementHandle, ROOT_ID};
pub use element::{Element, ElementId, ElementKind, Node};
pub use error::RenderError;
pub use hooks::{collect_lifecycle_hooks, BoxFuture, CollectedHooks, Hook, HookContext, LifecycleHooks, Phase};
pub use renderer::{AppendTo, AttachStrategy, Renderable, Renderer, ReplaceWith};
