//! Domain models

pub mod avaluo;
pub mod filter;
pub mod upload;

pub use avaluo::{AppraiserId, Avaluo, AvaluoId, DocumentSet, DocumentSlot, GridColumn, UserId};
pub use filter::{compare_folio_shit, AvaluoQuery, FilterState};
pub use upload::{UploadFile, UploadPhase, UploadSession};
