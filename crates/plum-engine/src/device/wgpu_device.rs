use std::collections::HashMap;
use std::ops::Range;

use bytemuck::{Pod, Zeroable};

use crate::canvas::Canvas;
use crate::paint::{Blend, Color};

use super::{DeviceError, GraphicsDevice, Quad, TextureId};

/// Hardware backend on wgpu.
///
/// Each texture is an `Rgba8Unorm` texture sampled with nearest filtering. Quads are
/// batched per frame and flushed in issue order at `end_frame`, or earlier when an
/// upload or destroy touches a texture with pending draws.
///
/// Lifecycle:
/// - `begin_frame(view, ..)` starts recording into `view`
/// - `draw_quad` calls accumulate
/// - `end_frame()` submits
pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    target_format: wgpu::TextureFormat,

    textures: HashMap<TextureId, GpuTexture>,
    next_id: u64,

    texture_layout: wgpu::BindGroupLayout,
    viewport_layout: wgpu::BindGroupLayout,
    viewport_ubo: wgpu::Buffer,
    viewport_bind_group: wgpu::BindGroup,
    sampler: wgpu::Sampler,
    pipelines: HashMap<Blend, wgpu::RenderPipeline>,

    bound: Option<TextureId>,
    blend: Blend,
    color: Color,

    frame: Option<Frame>,
    vertices: Vec<BlitVertex>,
    batches: Vec<Batch>,
    vbo: Option<wgpu::Buffer>,
    vbo_capacity: usize,
}

struct GpuTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    len: usize,
}

struct Frame {
    view: wgpu::TextureView,
    width: u32,
    height: u32,
    clear: Option<Color>,
}

struct Batch {
    texture: TextureId,
    blend: Blend,
    vertices: Range<u32>,
}

impl WgpuDevice {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, target_format: wgpu::TextureFormat) -> Self {
        let viewport_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("plum blit viewport bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<ViewportUniform>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("plum blit texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let viewport_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("plum blit viewport ubo"),
            size: std::mem::size_of::<ViewportUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let viewport_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("plum blit viewport bind group"),
            layout: &viewport_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: viewport_ubo.as_entire_binding(),
            }],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("plum blit sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        Self {
            device,
            queue,
            target_format,
            textures: HashMap::new(),
            next_id: 1,
            texture_layout,
            viewport_layout,
            viewport_ubo,
            viewport_bind_group,
            sampler,
            pipelines: HashMap::new(),
            bound: None,
            blend: Blend::default(),
            color: Color::white(),
            frame: None,
            vertices: Vec::new(),
            batches: Vec::new(),
            vbo: None,
            vbo_capacity: 0,
        }
    }

    /// Target format accepted by [`read_back`](Self::read_back).
    pub const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    #[inline]
    pub fn target_format(&self) -> wgpu::TextureFormat {
        self.target_format
    }

    #[inline]
    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    /// Creates an offscreen texture usable as a frame target and for [`read_back`](Self::read_back).
    pub fn create_render_target(&self, width: u32, height: u32) -> wgpu::Texture {
        self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("plum render target"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.target_format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        })
    }

    /// Starts recording draws into `view` (`width x height` pixels).
    ///
    /// A frame still in progress is ended first.
    pub fn begin_frame(
        &mut self,
        view: wgpu::TextureView,
        width: u32,
        height: u32,
        clear: Option<Color>,
    ) -> Result<(), DeviceError> {
        if self.frame.is_some() {
            self.end_frame()?;
        }
        self.frame = Some(Frame {
            view,
            width,
            height,
            clear,
        });
        Ok(())
    }

    /// Submits every pending draw of the current frame.
    pub fn end_frame(&mut self) -> Result<(), DeviceError> {
        self.flush()?;
        self.frame = None;
        Ok(())
    }

    /// Copies an RGBA8 texture back into a [`Canvas`].
    pub fn read_back(&self, texture: &wgpu::Texture) -> Result<Canvas, DeviceError> {
        if !matches!(
            texture.format(),
            wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb
        ) {
            return Err(DeviceError::Backend(format!(
                "read back of {:?} is not supported",
                texture.format()
            )));
        }

        let (width, height) = (texture.width(), texture.height());
        let row_bytes = width * 4;
        let padded_row_bytes = row_bytes.next_multiple_of(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);

        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("plum readback"),
            size: u64::from(padded_row_bytes) * u64::from(height),
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("plum readback encoder"),
            });
        encoder.copy_texture_to_buffer(
            texture.as_image_copy(),
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row_bytes),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(Some(encoder.finish()));

        let slice = buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |res| {
            let _ = tx.send(res);
        });
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| DeviceError::Backend(format!("poll failed: {e:?}")))?;
        rx.recv()
            .map_err(|_| DeviceError::Backend("readback channel closed".into()))?
            .map_err(|e| DeviceError::Backend(format!("readback map failed: {e:?}")))?;

        let mapped = slice.get_mapped_range();
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for row in 0..height as usize {
            let start = row * padded_row_bytes as usize;
            pixels.extend_from_slice(bytemuck::cast_slice::<u8, Color>(
                &mapped[start..start + row_bytes as usize],
            ));
        }
        drop(mapped);
        buffer.unmap();

        Canvas::from_pixels(width, height, &pixels)
            .map_err(|e| DeviceError::Backend(e.to_string()))
    }

    fn write_pixels(&self, texture: &wgpu::Texture, pixels: &[Color]) {
        let size = texture.size();
        let fallback = [Color::transparent()];
        let data: &[Color] = if pixels.is_empty() { &fallback } else { pixels };
        self.queue.write_texture(
            texture.as_image_copy(),
            bytemuck::cast_slice(data),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(size.width * 4),
                rows_per_image: Some(size.height),
            },
            size,
        );
    }

    fn has_pending_draws(&self, id: TextureId) -> bool {
        self.batches.iter().any(|b| b.texture == id)
    }

    fn flush(&mut self) -> Result<(), DeviceError> {
        let Some(frame) = self.frame.as_ref() else {
            return Ok(());
        };
        if self.batches.is_empty() && frame.clear.is_none() {
            return Ok(());
        }
        let viewport = ViewportUniform {
            viewport: [frame.width.max(1) as f32, frame.height.max(1) as f32],
            _pad: [0.0; 2],
        };

        let blends: Vec<Blend> = self.batches.iter().map(|b| b.blend).collect();
        for blend in blends {
            self.ensure_pipeline(blend);
        }
        self.ensure_vertex_capacity(self.vertices.len());

        self.queue
            .write_buffer(&self.viewport_ubo, 0, bytemuck::bytes_of(&viewport));
        if let Some(vbo) = self.vbo.as_ref() {
            self.queue
                .write_buffer(vbo, 0, bytemuck::cast_slice(&self.vertices));
        }

        let Some(frame) = self.frame.as_mut() else {
            return Ok(());
        };
        let load = match frame.clear.take() {
            Some(c) => wgpu::LoadOp::Clear(wgpu::Color {
                r: f64::from(c.r) / 255.0,
                g: f64::from(c.g) / 255.0,
                b: f64::from(c.b) / 255.0,
                a: f64::from(c.a) / 255.0,
            }),
            None => wgpu::LoadOp::Load,
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("plum blit encoder"),
            });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("plum blit pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            if let Some(vbo) = self.vbo.as_ref() {
                rpass.set_bind_group(0, &self.viewport_bind_group, &[]);
                rpass.set_vertex_buffer(0, vbo.slice(..));

                for batch in &self.batches {
                    let Some(pipeline) = self.pipelines.get(&batch.blend) else { continue };
                    let Some(texture) = self.textures.get(&batch.texture) else { continue };
                    rpass.set_pipeline(pipeline);
                    rpass.set_bind_group(1, &texture.bind_group, &[]);
                    rpass.draw(batch.vertices.clone(), 0..1);
                }
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));

        log::trace!(
            "flushed {} batches ({} vertices)",
            self.batches.len(),
            self.vertices.len()
        );
        self.batches.clear();
        self.vertices.clear();
        Ok(())
    }

    // ── lazy-init helpers ──────────────────────────────────────────────────

    fn ensure_pipeline(&mut self, blend: Blend) {
        if self.pipelines.contains_key(&blend) {
            return;
        }

        let shader = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("plum blit shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/blit.wgsl").into()),
        });

        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("plum blit pipeline layout"),
                bind_group_layouts: &[&self.viewport_layout, &self.texture_layout],
                immediate_size: 0,
            });

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("plum blit pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[BlitVertex::layout()],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.target_format,
                        blend: blend_state(blend),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });

        log::debug!("blit pipeline created for {blend:?}");
        self.pipelines.insert(blend, pipeline);
    }

    fn ensure_vertex_capacity(&mut self, required: usize) {
        if required <= self.vbo_capacity && self.vbo.is_some() {
            return;
        }

        let new_cap = required.next_power_of_two().max(384);
        self.vbo = Some(self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("plum blit vbo"),
            size: (new_cap * std::mem::size_of::<BlitVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.vbo_capacity = new_cap;
    }
}

impl GraphicsDevice for WgpuDevice {
    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        pixels: &[Color],
    ) -> Result<TextureId, DeviceError> {
        let len = width as usize * height as usize;
        if pixels.len() != len {
            return Err(DeviceError::SizeMismatch {
                expected: len,
                actual: pixels.len(),
            });
        }

        // wgpu rejects zero-sized textures; an empty image gets one transparent texel.
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("plum image texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.write_pixels(&texture, pixels);

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("plum image bind group"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        let id = TextureId(self.next_id);
        self.next_id += 1;
        self.textures.insert(
            id,
            GpuTexture {
                texture,
                bind_group,
                len,
            },
        );
        log::debug!("gpu texture {id} created ({width}x{height})");
        Ok(id)
    }

    fn upload_texture(&mut self, id: TextureId, pixels: &[Color]) -> Result<(), DeviceError> {
        let len = self
            .textures
            .get(&id)
            .ok_or(DeviceError::UnknownTexture(id))?
            .len;
        if pixels.len() != len {
            return Err(DeviceError::SizeMismatch {
                expected: len,
                actual: pixels.len(),
            });
        }

        if self.has_pending_draws(id) {
            self.flush()?;
        }
        if let Some(tex) = self.textures.get(&id) {
            self.write_pixels(&tex.texture, pixels);
        }
        Ok(())
    }

    fn destroy_texture(&mut self, id: TextureId) {
        if self.has_pending_draws(id) {
            if let Err(e) = self.flush() {
                log::warn!("flush before destroying texture {id} failed: {e}");
            }
        }
        let Some(tex) = self.textures.remove(&id) else {
            log::warn!("destroy of unknown texture {id}");
            return;
        };
        tex.texture.destroy();
        if self.bound == Some(id) {
            self.bound = None;
        }
        log::debug!("gpu texture {id} destroyed");
    }

    fn bind_texture(&mut self, id: TextureId) -> Result<(), DeviceError> {
        if !self.textures.contains_key(&id) {
            return Err(DeviceError::UnknownTexture(id));
        }
        self.bound = Some(id);
        Ok(())
    }

    fn set_draw_state(&mut self, blend: Blend, color: Color) {
        self.blend = blend;
        self.color = color;
    }

    fn draw_quad(&mut self, quad: &Quad) -> Result<(), DeviceError> {
        let texture = self.bound.ok_or(DeviceError::NoBoundTexture)?;
        if self.frame.is_none() {
            return Err(DeviceError::Backend("draw outside of a frame".into()));
        }

        let start = self.vertices.len() as u32;
        let (r, g, b, a) = self.color.channels();
        self.vertices.extend(quad_vertices(quad, [r, g, b, a]));
        let end = self.vertices.len() as u32;

        match self.batches.last_mut() {
            Some(last) if last.texture == texture && last.blend == self.blend => {
                last.vertices.end = end;
            }
            _ => self.batches.push(Batch {
                texture,
                blend: self.blend,
                vertices: start..end,
            }),
        }
        Ok(())
    }
}

impl Drop for WgpuDevice {
    fn drop(&mut self) {
        if !self.textures.is_empty() {
            log::warn!("dropping device with {} live textures", self.textures.len());
        }
    }
}

/// Blend state reproducing [`compose`](crate::paint::compose) in fixed function.
///
/// Opacity is already folded into the vertex alpha.
fn blend_state(blend: Blend) -> Option<wgpu::BlendState> {
    let keep_dst_alpha = wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::Zero,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    };

    match blend {
        Blend::Opaque => None,
        Blend::Merge | Blend::Preserve => Some(wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            },
        }),
        Blend::Add => Some(wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: keep_dst_alpha,
        }),
        Blend::Subtract => Some(wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::ReverseSubtract,
            },
            alpha: keep_dst_alpha,
        }),
    }
}

/// Two triangles (0, 1, 2) and (0, 2, 3) over the quad corners.
fn quad_vertices(quad: &Quad, color: [u8; 4]) -> [BlitVertex; 6] {
    let v = |i: usize| BlitVertex {
        pos: [quad.corners[i].x as f32, quad.corners[i].y as f32],
        uv: [quad.uvs[i].x as f32, quad.uvs[i].y as f32],
        color,
    };
    [v(0), v(1), v(2), v(0), v(2), v(3)]
}

// ── gpu types ─────────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct ViewportUniform {
    viewport: [f32; 2],
    _pad: [f32; 2], // 16-byte alignment
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
struct BlitVertex {
    pos: [f32; 2],
    uv: [f32; 2],
    color: [u8; 4],
}

impl BlitVertex {
    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x2, // pos
        1 => Float32x2, // uv
        2 => Unorm8x4   // color
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<BlitVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::coords::Point;

    use super::*;

    #[test]
    fn opaque_disables_blending() {
        assert!(blend_state(Blend::Opaque).is_none());
    }

    #[test]
    fn merge_and_preserve_share_a_blend_state() {
        assert_eq!(blend_state(Blend::Merge), blend_state(Blend::Preserve));
    }

    #[test]
    fn add_and_subtract_keep_destination_alpha() {
        for blend in [Blend::Add, Blend::Subtract] {
            let state = blend_state(blend).unwrap();
            assert_eq!(state.alpha.src_factor, wgpu::BlendFactor::Zero);
            assert_eq!(state.alpha.dst_factor, wgpu::BlendFactor::One);
        }
        assert_eq!(
            blend_state(Blend::Subtract).unwrap().color.operation,
            wgpu::BlendOperation::ReverseSubtract
        );
    }

    #[test]
    fn quad_splits_into_two_triangles() {
        let quad = Quad {
            corners: [
                Point::new(0.0, 0.0),
                Point::new(0.0, 2.0),
                Point::new(3.0, 2.0),
                Point::new(3.0, 0.0),
            ],
            uvs: [
                Point::new(0.0, 0.0),
                Point::new(0.0, 0.5),
                Point::new(0.75, 0.5),
                Point::new(0.75, 0.0),
            ],
        };
        let v = quad_vertices(&quad, [255, 255, 255, 128]);
        assert_eq!(v[0], v[3]);
        assert_eq!(v[2], v[4]);
        assert_eq!(v[5].pos, [3.0, 0.0]);
        assert_eq!(v[5].uv, [0.75, 0.0]);
        assert!(v.iter().all(|x| x.color == [255, 255, 255, 128]));
    }

    #[test]
    fn vertex_layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<BlitVertex>(), 20);
    }
}
