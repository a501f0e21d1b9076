//! End-to-end demo: instrument a tiny compute shader, run it once, decode
//! the captured pass and print it.

use anyhow::{Context, Result};
use wgsl_probe::{CaptureSession, DebugValue, Output, Record};

const UNITS: u32 = 4;
const CAPACITY: u32 = 8;

const DEMO_SHADER: &str = r#"
@compute @workgroup_size(1)
fn main(@builtin(global_invocation_id) gid: vec3<u32>) {
    dbg_init(gid.x);
    dbg_u32(gid.x);
    dbg_u32m(1, gid.x * 2u); // doubled id
    dbg_i32m(2, -7); // negative constant
    dbg_f32m(3, 0.5); // half
}
"#;

/// Prints each pass as it lands, resolving mark names.
struct ConsoleOutput {
    mark_names: Vec<(u32, String)>,
}

impl Output for ConsoleOutput {
    fn reset(&mut self) {
        println!("--- record cleared ---");
    }

    fn update(&mut self, record: &Record) {
        let Some(pass) = record.last() else { return };
        println!("pass {}:", record.len() - 1);
        for (uid, entries) in pass.units().enumerate() {
            print!("  unit {uid} [{}]:", entries.len());
            for e in entries {
                let name = e.mark.and_then(|m| {
                    self.mark_names
                        .iter()
                        .find(|(id, _)| *id == m)
                        .map(|(_, n)| n.as_str())
                });
                match (e.value, name) {
                    (v, Some(n)) => print!("  {n}={v}"),
                    (v, None) => print!("  {v}"),
                }
            }
            println!();
        }
    }
}

async fn request_device() -> Result<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .context("no suitable GPU adapter")?;
    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("probe_demo"),
            ..Default::default()
        })
        .await
        .context("failed to create wgpu device")?;
    Ok((device, queue))
}

async fn run() -> Result<()> {
    let (device, queue) = request_device().await?;

    // debug buffer lives alone in group 0 for this demo
    let mut session = CaptureSession::new(device.clone(), 0);
    let shader = session.instrument(DEMO_SHADER, CAPACITY, true);
    session.configure(UNITS, CAPACITY);
    session.set_output(Box::new(ConsoleOutput {
        mark_names: session.marks().iter().map(|(k, v)| (*k, v.clone())).collect(),
    }));

    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("demo-shader"),
        source: wgpu::ShaderSource::Wgsl(shader.into()),
    });
    let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some("demo-pipeline"),
        layout: None,
        module: &module,
        entry_point: Some("main"),
        compilation_options: wgpu::PipelineCompilationOptions::default(),
        cache: None,
    });
    let bind_group = session.bind_group_for_pipeline(&pipeline)?;

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("demo-enc"),
    });
    {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("demo"),
            ..Default::default()
        });
        pass.set_pipeline(&pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.dispatch_workgroups(UNITS, 1, 1);
    }
    session.request_copy(&mut encoder)?;
    queue.submit(Some(encoder.finish()));

    session.decode().await?;

    // the record keeps the pass around for later inspection too
    let pass = session.record().get(0).context("no pass decoded")?;
    let first = pass.unit(0).first().context("unit 0 captured nothing")?;
    anyhow::ensure!(first.value == DebugValue::U32(0), "unexpected first entry");
    Ok(())
}

fn main() {
    if let Err(e) = pollster::block_on(run()) {
        eprintln!("probe_demo error: {e:?}");
        std::process::exit(1);
    }
}
