//! Kit domain model: slots, layout, configuration, and project state.

pub mod config;
pub mod id;
pub mod layout;
pub mod project;
pub mod slot;

pub use config::{Auto, ChannelMode, RenderConfig, ResolvedConfig};
pub use id::{FileId, LayoutEntryId, TaskId};
pub use layout::{KitLayout, KitLayoutEntry};
pub use project::{KitFile, Project, ProjectSnapshot, SnapshotFile};
pub use slot::{SlotAssignment, SlotPosition, SLOT_COUNT};
