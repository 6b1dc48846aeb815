//! Stages that turn an upload into text a provider can translate.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ (providers) ──▶ normalize
//! (classify,  (pdf/docx/             (fence strip,
//!  stage)      txt/json)              cleanup)
//! ```
//!
//! 1. [`input`]    : validate size and media type, stage bytes in a temp file
//! 2. [`extract`]  : pull raw text; images yield an empty string
//! 3. [`encode`]   : base64 for vision request bodies and previews
//! 4. [`normalize`]: deterministic cleanup of extracted text and model output

pub mod encode;
pub mod extract;
pub mod input;
pub mod normalize;
