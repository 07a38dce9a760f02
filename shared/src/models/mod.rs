//! Persisted data model
//!
//! One module per entity collection. These are plain serde structs; all
//! mutation rules live in `session-core`.

pub mod archive;
pub mod cart_line;
pub mod menu_item;
pub mod request;
pub mod session;
pub mod table;

pub use archive::{ArchiveRecord, CompletedOrder};
pub use cart_line::CartLine;
pub use menu_item::{normalize_category, MenuItem, MenuItemCreate, MenuItemUpdate, UNASSIGNED_CATEGORY};
pub use request::{PaymentMethod, RequestKind, RequestStatus, TableRequest};
pub use session::{CartEntry, TableSession};
pub use table::TableRecord;
