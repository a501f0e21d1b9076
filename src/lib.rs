//! Print-like debugging for WGSL compute shaders.
//!
//! A generated WGSL fragment gives shader code `dbg_u32`/`dbg_i32`/`dbg_f32`
//! calls (plus marked variants) that append typed values to a fixed-layout
//! storage buffer, one bounded slot per execution unit. The host side copies
//! that buffer back after each dispatch, decodes it into a [`record::Pass`]
//! and appends it to an ever-growing [`record::Record`], notifying an
//! [`output::Output`] after each cycle.
//!
//! Typical flow:
//!
//! ```no_run
//! # async fn run(device: wgpu::Device) -> anyhow::Result<()> {
//! let mut session = wgsl_probe::CaptureSession::new(device.clone(), 1);
//! let shader = session.instrument(MY_SHADER, 20, true);
//! session.configure(64, 20);
//! // ... build pipeline from `shader`, bind session.bind_group_for_pipeline(...),
//! // dispatch, then in the same encoder:
//! # let mut encoder = device.create_command_encoder(&Default::default());
//! session.request_copy(&mut encoder)?;
//! // submit, then:
//! session.decode().await?;
//! # Ok(()) }
//! # const MY_SHADER: &str = "";
//! ```

pub mod buffers;
pub mod decode;
pub mod hang;
pub mod layout;
pub mod output;
pub mod record;
pub mod session;
pub mod shader;

pub use decode::{DecodeStats, PassDecoder};
pub use hang::{Clock, HangGuard, Verdict};
pub use layout::BufferLayout;
pub use output::{LogOutput, Output};
pub use record::{DebugEntry, DebugValue, Pass, Record};
pub use session::CaptureSession;
pub use shader::MarkTable;
