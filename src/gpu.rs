use crate::config::RenderConfig;
use crate::framebuffer::Framebuffer;
use crate::math::Vec3;
use crate::scene::Scene;

/// Sphere slots in the uniform scene block. Scenes beyond this are rejected
/// before any device work is submitted.
pub const GPU_MAX_SPHERES: usize = 64;
/// Edge length of one square dispatch tile, in pixels. Invocations that land
/// outside the frame return immediately, so the frame does not need to be a
/// multiple of the tile size.
pub const GPU_TILE_SIZE: u32 = 16;

const BYTES_PER_PIXEL: usize = 16;

#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct GpuParams {
    width: u32,
    height: u32,
    sphere_count: u32,
    _padding: u32,
    camera_origin: [f32; 4],
    light_position: [f32; 4],
    sphere_center_radius: [[f32; 4]; GPU_MAX_SPHERES],
    sphere_color: [[f32; 4]; GPU_MAX_SPHERES],
}

struct GpuFrameResources {
    width: u32,
    height: u32,
    padded_bytes_per_row: u32,
    output_texture: wgpu::Texture,
    _output_view: wgpu::TextureView,
    output_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

pub struct GpuRenderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    params_buffer: wgpu::Buffer,
    frame_resources: Option<GpuFrameResources>,
}

impl GpuRenderer {
    pub async fn new() -> Result<Self, String> {
        let instance = wgpu::Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| "no compatible GPU adapter available".to_string())?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("stackray-device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await
            .map_err(|error| format!("request_device failed: {error}"))?;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("stackray-trace-shader"),
            source: wgpu::ShaderSource::Wgsl(build_shader_wgsl().into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("stackray-bind-group-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: wgpu::TextureFormat::Rgba32Float,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("stackray-pipeline-layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("stackray-trace-pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: "main",
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            cache: None,
        });

        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("stackray-params-buffer"),
            size: std::mem::size_of::<GpuParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok(Self {
            device,
            queue,
            pipeline,
            bind_group_layout,
            params_buffer,
            frame_resources: None,
        })
    }

    /// Runs one dispatch per tile over the full frame, waits for the queue,
    /// and reads the framebuffer back as pre-clamp colors. The scene upload
    /// and the readback map are the only two synchronization points.
    pub fn render(&mut self, scene: &Scene, config: &RenderConfig) -> Result<Framebuffer, String> {
        let params = compile_scene(scene, config)?;

        self.ensure_frame_resources(config.width, config.height);
        let frame = self
            .frame_resources
            .as_ref()
            .ok_or_else(|| "GPU frame resources are not initialized".to_string())?;

        self.queue
            .write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&params));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("stackray-command-encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("stackray-trace-pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &frame.bind_group, &[]);
            let groups_x = (config.width + GPU_TILE_SIZE - 1) / GPU_TILE_SIZE;
            let groups_y = (config.height + GPU_TILE_SIZE - 1) / GPU_TILE_SIZE;
            log::debug!("dispatching {groups_x}x{groups_y} tiles of {GPU_TILE_SIZE}^2 pixels");
            pass.dispatch_workgroups(groups_x, groups_y, 1);
        }

        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &frame.output_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &frame.output_buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(frame.padded_bytes_per_row),
                    rows_per_image: Some(config.height),
                },
            },
            wgpu::Extent3d {
                width: config.width,
                height: config.height,
                depth_or_array_layers: 1,
            },
        );

        self.queue.submit(Some(encoder.finish()));

        let slice = frame.output_buffer.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        let _ = self.device.poll(wgpu::Maintain::Wait);
        receiver
            .recv()
            .map_err(|_| "failed to receive GPU readback status".to_string())?
            .map_err(|error| format!("GPU readback map failed: {error}"))?;

        let data = slice.get_mapped_range();
        let mut pixels = Vec::with_capacity((config.width as usize) * (config.height as usize));
        for y in 0..config.height as usize {
            let row_start = y * frame.padded_bytes_per_row as usize;
            for x in 0..config.width as usize {
                let pixel_start = row_start + (x * BYTES_PER_PIXEL);
                let texel: [f32; 4] =
                    bytemuck::pod_read_unaligned(&data[pixel_start..pixel_start + BYTES_PER_PIXEL]);
                pixels.push(Vec3::new(texel[0], texel[1], texel[2]));
            }
        }
        drop(data);
        frame.output_buffer.unmap();

        Ok(Framebuffer::from_pixels(config.width, config.height, pixels))
    }

    fn ensure_frame_resources(&mut self, width: u32, height: u32) {
        let needs_rebuild = match &self.frame_resources {
            Some(resources) => resources.width != width || resources.height != height,
            None => true,
        };
        if !needs_rebuild {
            return;
        }

        let output_texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("stackray-output-texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba32Float,
            usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let output_view = output_texture.create_view(&wgpu::TextureViewDescriptor::default());

        let unpadded_bytes_per_row = width * BYTES_PER_PIXEL as u32;
        let padded_bytes_per_row = ((unpadded_bytes_per_row + 255) / 256) * 256;
        let output_buffer_size = (padded_bytes_per_row * height) as u64;
        let output_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("stackray-readback-buffer"),
            size: output_buffer_size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("stackray-bind-group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&output_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: self.params_buffer.as_entire_binding(),
                },
            ],
        });

        self.frame_resources = Some(GpuFrameResources {
            width,
            height,
            padded_bytes_per_row,
            output_texture,
            _output_view: output_view,
            output_buffer,
            bind_group,
        });
    }
}

/// Packs the scene into the fixed-capacity uniform layout, validating it
/// against the slot capacity and physical sanity first.
fn compile_scene(scene: &Scene, config: &RenderConfig) -> Result<GpuParams, String> {
    if scene.spheres.is_empty() {
        return Err("scene must contain at least one sphere".into());
    }
    if scene.spheres.len() > GPU_MAX_SPHERES {
        return Err(format!(
            "scene has {} spheres but the GPU backend supports at most {}",
            scene.spheres.len(),
            GPU_MAX_SPHERES
        ));
    }

    let mut sphere_center_radius = [[0.0; 4]; GPU_MAX_SPHERES];
    let mut sphere_color = [[0.0; 4]; GPU_MAX_SPHERES];
    for (index, sphere) in scene.spheres.iter().enumerate() {
        validate_finite_vec3(index, "center", sphere.center)?;
        if !sphere.radius.is_finite() || sphere.radius <= 0.0 {
            return Err(format!(
                "sphere {index} has non-positive or non-finite radius ({})",
                sphere.radius
            ));
        }
        validate_finite_vec3(index, "diffuse color", sphere.color)?;
        if !(0.0..=1.0).contains(&sphere.color.x)
            || !(0.0..=1.0).contains(&sphere.color.y)
            || !(0.0..=1.0).contains(&sphere.color.z)
        {
            return Err(format!(
                "sphere {index} has diffuse color outside [0, 1] ({}, {}, {})",
                sphere.color.x, sphere.color.y, sphere.color.z
            ));
        }

        sphere_center_radius[index] = [
            sphere.center.x,
            sphere.center.y,
            sphere.center.z,
            sphere.radius,
        ];
        sphere_color[index] = [sphere.color.x, sphere.color.y, sphere.color.z, 0.0];
    }

    Ok(GpuParams {
        width: config.width,
        height: config.height,
        sphere_count: scene.spheres.len() as u32,
        _padding: 0,
        camera_origin: [
            crate::trace::CAMERA_ORIGIN.x,
            crate::trace::CAMERA_ORIGIN.y,
            crate::trace::CAMERA_ORIGIN.z,
            0.0,
        ],
        light_position: [
            scene.light_position.x,
            scene.light_position.y,
            scene.light_position.z,
            0.0,
        ],
        sphere_center_radius,
        sphere_color,
    })
}

fn validate_finite_vec3(index: usize, field: &str, value: Vec3) -> Result<(), String> {
    if !value.x.is_finite() || !value.y.is_finite() || !value.z.is_finite() {
        return Err(format!(
            "sphere {index} has non-finite {field} ({}, {}, {})",
            value.x, value.y, value.z
        ));
    }
    Ok(())
}

fn build_shader_wgsl() -> String {
    SHADER_WGSL_TEMPLATE
        .replace("__MAX_SPHERES__", &format!("{GPU_MAX_SPHERES}u"))
        .replace("__TILE_SIZE__", &GPU_TILE_SIZE.to_string())
}

const SHADER_WGSL_TEMPLATE: &str = include_str!("shaders/trace.wgsl");
