//! Pipeline stages for one parser-generation attempt.
//!
//! Each submodule implements exactly one step of the correction loop.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (a different harness, a scripted generator) without
//! touching the loop itself.
//!
//! ## Data Flow
//!
//! ```text
//! sample ──▶ prompt ──▶ codegen ──▶ harness ──▶ check
//! (pdf+csv)  (build)    (LLM call)  (execute)   (verdict)
//! ```
//!
//! 1. [`sample`]  — load the bank's sample pair: PDF text excerpt plus the
//!    expected CSV table; runs extraction in `spawn_blocking` because the
//!    PDF decoder is CPU-bound
//! 2. [`prompt`]  — deterministic user-prompt assembly, embedding the prior
//!    attempt's failure text on retries
//! 3. [`codegen`] — drive the completion call and clean the returned source;
//!    the only stage with network I/O
//! 4. [`harness`] — persist the source and execute it against the sample PDF
//!    in an isolated child process, capturing a table or the raised error
//! 5. [`check`]   — compare the produced table to the target schema and
//!    produce the attempt's verdict

pub mod check;
pub mod codegen;
pub mod harness;
pub mod prompt;
pub mod sample;
