//! Client side of the listing catalog: an observable [`DataStore`], the page
//! controller that keeps it in sync with the listing API, and the table
//! renderers that listen to it.

pub mod api;
pub mod controller;
pub mod events;
pub mod forms;
pub mod http;
pub mod page;
pub mod render;
pub mod store;

pub use api::{ClientError, ListingApi};
pub use controller::{ActionKind, ActionOutcome, ActionState, PageController};
pub use events::{PageEvent, UiError, UiErrorCategory, UiErrorContext};
pub use forms::{FieldPatch, FieldSource, FormAction, SubmitEvent};
pub use http::HttpListingClient;
pub use page::{MissingRecordPolicy, PageConfig, PageVariant};
pub use render::{ListingTableRenderer, MemorySurface, RenderSurface, TableFormat};
pub use store::{ChangeListener, DataStore, StoreError, StoreKey, StoreView};
