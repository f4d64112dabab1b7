//! Domain primitives, ports and services.
//!
//! Purpose: define the types and use cases of the generation gateway without
//! depending on HTTP, SQL or the upstream wire format. Adapters in `inbound`
//! and `outbound` plug into the traits in [`ports`].
//!
//! Public surface:
//! - `Error` / `ErrorCode`: transport-agnostic failure payload.
//! - `UserId`, `Credits`, `GenerationCost`, `UserAccount`: account model.
//! - `HistoryRecord` and its references: generation history.
//! - `UploadStaging` / `StagedUpload`: transient upload storage.
//! - `CreditLedgerGuard`: balance precondition and deduction.
//! - `GenerationService`, `AccountService`: driving port implementations.

pub mod account_service;
pub mod credits;
pub mod error;
pub mod generation;
pub mod history;
pub mod ports;
pub mod staged_upload;
pub mod trace_id;
pub mod user;

pub use self::account_service::AccountService;
pub use self::credits::{CreditLedgerGuard, LedgerGuardError, Reservation};
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::generation::{GenerationError, GenerationService, GenerationSettings};
pub use self::history::{
    EmptyReference, HistoryRecord, HistoryRecordId, ImageReference, LOCAL_UPLOAD_SOURCE,
    SourceReference,
};
pub use self::staged_upload::{StagedUpload, StagingError, UploadStaging};
pub use self::trace_id::TraceId;
pub use self::user::{
    Credits, DEFAULT_GENERATION_COST, GenerationCost, UserAccount, UserId, UserValidationError,
    ZeroGenerationCost,
};
