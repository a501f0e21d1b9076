//! One capture session per instrumented pipeline: owns the buffer pair,
//! the decoded history, and the decode cycle.
//!
//! Cycle per dispatch: [`CaptureSession::request_copy`] inside the same
//! submission as the instrumented dispatch, then [`CaptureSession::decode`]
//! once the submission is in flight. Decodes must not overlap: await one
//! before requesting the next copy, or the readback contents are undefined.

use anyhow::{Context, Result, bail};

use crate::{
    buffers::ProbeBuffers,
    decode::{PassDecoder, header_words},
    layout::{BufferLayout, DEFAULT_CAPACITY},
    output::Output,
    record::Record,
    shader::{self, MarkTable},
};

pub struct CaptureSession {
    device: wgpu::Device,
    /// Bind group slot the shader fragment declares the buffer at.
    group: u32,
    layout: Option<BufferLayout>,
    buffers: Option<ProbeBuffers>,
    decoder: Option<PassDecoder>,
    marks: MarkTable,
    record: Record,
    pass_n: u64,
    output: Option<Box<dyn Output>>,
}

impl CaptureSession {
    pub fn new(device: wgpu::Device, group: u32) -> Self {
        Self {
            device,
            group,
            layout: None,
            buffers: None,
            decoder: None,
            marks: MarkTable::new(),
            record: Record::new(),
            pass_n: 0,
            output: None,
        }
    }

    /// Splice the debug functions in front of `src` and remember its mark
    /// names. `capacity` must match the later [`Self::configure`] call.
    pub fn instrument(&mut self, src: &str, capacity: u32, active: bool) -> String {
        let (combined, marks) = shader::instrument(src, self.group, capacity, active);
        self.marks = marks;
        combined
    }

    /// [`Self::instrument`] with [`DEFAULT_CAPACITY`] entries per unit;
    /// pair with [`Self::configure_default`].
    pub fn instrument_default(&mut self, src: &str, active: bool) -> String {
        self.instrument(src, DEFAULT_CAPACITY, active)
    }

    /// Size (or resize) the buffer pair for `unit_count` units of
    /// `capacity` entries. Any previous buffers are released and the whole
    /// capture history is cleared; the attached output is told to reset.
    pub fn configure(&mut self, unit_count: u32, capacity: u32) {
        let layout = BufferLayout::new(unit_count, capacity);
        log::debug!(
            "configure: unit_count={unit_count} capacity={capacity} total_bytes={}",
            layout.total_bytes()
        );
        // drop the old pair before allocating the new one
        self.buffers = None;
        self.buffers = Some(ProbeBuffers::new(&self.device, &layout));
        self.decoder = Some(PassDecoder::new(layout));
        self.layout = Some(layout);
        self.record.clear();
        self.pass_n = 0;
        if let Some(output) = &mut self.output {
            output.reset();
        }
    }

    /// [`Self::configure`] with [`DEFAULT_CAPACITY`] entries per unit.
    pub fn configure_default(&mut self, unit_count: u32) {
        self.configure(unit_count, DEFAULT_CAPACITY);
    }

    /// Bind group exposing the debug storage buffer at binding 0, for the
    /// session's group slot on `pipeline`.
    pub fn bind_group_for_pipeline(&self, pipeline: &wgpu::ComputePipeline) -> Result<wgpu::BindGroup> {
        let layout = pipeline.get_bind_group_layout(self.group);
        self.bind_group(&layout)
    }

    pub fn bind_group(&self, layout: &wgpu::BindGroupLayout) -> Result<wgpu::BindGroup> {
        let buffers = self
            .buffers
            .as_ref()
            .context("session not configured, call configure() first")?;
        Ok(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("wgsl-probe bind group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffers.storage.as_entire_binding(),
            }],
        }))
    }

    /// Enqueue the device-to-host copy of the debug buffer. Must be part of
    /// the same submission as the dispatch being observed, and must not be
    /// called again before the previous [`Self::decode`] has completed.
    pub fn request_copy(&self, encoder: &mut wgpu::CommandEncoder) -> Result<()> {
        let buffers = self
            .buffers
            .as_ref()
            .context("session not configured, call configure() first")?;
        buffers.enqueue_copy(encoder);
        Ok(())
    }

    /// Wait for the readback buffer to become readable, decode it into a
    /// pass, append the pass to the record and notify the output.
    ///
    /// The map wait is the only suspension point; the decode itself is
    /// time-boxed by the hang guard, and an aborted decode still appends
    /// its partial pass (callers see it via the record like any other).
    pub async fn decode(&mut self) -> Result<()> {
        let (Some(buffers), Some(decoder)) = (self.buffers.as_ref(), self.decoder.as_mut()) else {
            bail!("session not configured, call configure() first");
        };

        let slice = buffers.readback.slice(..);
        let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
        slice.map_async(wgpu::MapMode::Read, move |r| {
            let _ = tx.send(r);
        });
        let _ = self.device.poll(wgpu::PollType::Wait);
        rx.receive()
            .await
            .context("map_async callback dropped")?
            .context("failed to map debug readback buffer")?;

        let words = {
            let mapped = slice.get_mapped_range();
            let mut words = Vec::with_capacity(mapped.len() / 4);
            for chunk in mapped.chunks_exact(4) {
                words.push(u32::from_le_bytes(
                    chunk.try_into().expect("chunk size mismatch"),
                ));
            }
            words
        };
        buffers.readback.unmap();

        let (pass, stats) = decoder.decode(&words);
        if stats.first_overflow {
            log::warn!(
                "debug calls exceeded per-unit capacity {} ({} dropped this pass); \
                 consider a larger capacity",
                decoder.layout().capacity,
                stats.dropped_calls
            );
        }
        if stats.aborted {
            log::warn!("decode of pass {} interrupted, pass is partial", self.pass_n);
        }
        log::debug!("pass {} header: {:?}", self.pass_n, header_words(&words));

        self.record.append(pass);
        self.pass_n += 1;
        if let Some(output) = &mut self.output {
            output.update(&self.record);
        }
        Ok(())
    }

    pub fn set_output(&mut self, output: Box<dyn Output>) {
        self.output = Some(output);
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn marks(&self) -> &MarkTable {
        &self.marks
    }

    pub fn layout(&self) -> Option<&BufferLayout> {
        self.layout.as_ref()
    }

    /// Index of the next pass to be captured; equals `record().len()`.
    pub fn pass_n(&self) -> u64 {
        self.pass_n
    }

    /// Reset every entry's `processed` flag across the stored history.
    pub fn clear_processed(&mut self) {
        self.record.clear_processed();
    }
}
