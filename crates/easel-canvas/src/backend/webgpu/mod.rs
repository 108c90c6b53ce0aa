//! [`Backend`] implementation on top of wgpu, presenting to a winit window.

mod gpu;
mod pipeline;

pub use gpu::WgpuInit;

use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::batch::TextureBinding;
use crate::coords::Viewport;
use crate::error::BackendError;
use crate::image::ImageDesc;

use super::{Backend, FrameSubmission, FrameTarget};
use gpu::Gpu;
use pipeline::SpritePipeline;

/// Format of every canvas-owned texture, so atlas copies never convert.
const IMAGE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

pub struct WgpuBuffer {
    buffer: wgpu::Buffer,
}

/// Texture plus the bind group batches sample it through.
pub struct WgpuImage {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    bind_group: wgpu::BindGroup,
}

/// Submission recorded when the slot was last signaled.
pub struct WgpuSyncPoint {
    value: u64,
    submission: Option<wgpu::SubmissionIndex>,
}

/// wgpu device, window surface and sprite pipeline.
pub struct WgpuBackend<'w> {
    // Released before the surface it was acquired from.
    pending_surface: Option<wgpu::SurfaceTexture>,
    pipeline: SpritePipeline,
    last_submission: Option<wgpu::SubmissionIndex>,
    gpu: Gpu<'w>,
}

impl<'w> WgpuBackend<'w> {
    /// Creates a backend presenting to `window`.
    pub async fn new(window: &'w Window, init: WgpuInit) -> anyhow::Result<Self> {
        let gpu = Gpu::new(window, &init).await?;
        let pipeline = SpritePipeline::new(&gpu.device);
        Ok(Self {
            pending_surface: None,
            pipeline,
            last_submission: None,
            gpu,
        })
    }

    /// Reconfigures the surface for a new window size.
    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        self.gpu.resize(size);
    }

    fn new_texture(
        &self,
        label: &'static str,
        width: u32,
        height: u32,
        usage: wgpu::TextureUsages,
    ) -> Result<WgpuImage, BackendError> {
        let max = self.gpu.device.limits().max_texture_dimension_2d;
        if width > max || height > max {
            return Err(BackendError::ResourceCreation {
                what: label,
                reason: format!("{width}x{height} exceeds the device limit of {max}"),
            });
        }

        let texture = self.gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: IMAGE_FORMAT,
            usage: usage | wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self.pipeline.texture_bind_group(&self.gpu.device, &view);
        Ok(WgpuImage {
            texture,
            view,
            bind_group,
        })
    }
}

impl Backend for WgpuBackend<'_> {
    type Buffer = WgpuBuffer;
    type Image = WgpuImage;
    type SyncPoint = WgpuSyncPoint;

    fn view_size(&self) -> Viewport {
        let size = self.gpu.size();
        Viewport::from_pixels(size.width, size.height)
    }

    fn create_vertex_buffer(&mut self, byte_size: u64) -> Result<WgpuBuffer, BackendError> {
        let max = self.gpu.device.limits().max_buffer_size;
        if byte_size > max {
            return Err(BackendError::ResourceCreation {
                what: "vertex buffer",
                reason: format!("{byte_size} bytes exceeds the device limit of {max}"),
            });
        }
        let buffer = self.gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("easel vertex buffer"),
            size: byte_size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Ok(WgpuBuffer { buffer })
    }

    fn create_index_buffer(&mut self, indices: &[u32]) -> Result<WgpuBuffer, BackendError> {
        let buffer = self
            .gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("easel quad index buffer"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        Ok(WgpuBuffer { buffer })
    }

    fn destroy_buffer(&mut self, buffer: WgpuBuffer) {
        buffer.buffer.destroy();
    }

    fn create_image(&mut self, desc: &ImageDesc, pixels: &[u8]) -> Result<WgpuImage, BackendError> {
        let image = self.new_texture("easel image", desc.width, desc.height, wgpu::TextureUsages::COPY_SRC)?;
        self.gpu.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &image.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(desc.width * desc.format.bytes_per_pixel() as u32),
                rows_per_image: Some(desc.height),
            },
            wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: 1,
            },
        );
        Ok(image)
    }

    fn create_render_target_image(&mut self, width: u32, height: u32) -> Result<WgpuImage, BackendError> {
        self.new_texture(
            "easel render target",
            width,
            height,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        )
    }

    fn create_atlas_image(&mut self, width: u32, height: u32) -> Result<WgpuImage, BackendError> {
        self.new_texture("easel atlas", width, height, wgpu::TextureUsages::empty())
    }

    fn destroy_image(&mut self, image: WgpuImage) {
        image.texture.destroy();
    }

    fn init_frame_sync_point(&mut self) -> Result<WgpuSyncPoint, BackendError> {
        Ok(WgpuSyncPoint {
            value: 0,
            submission: None,
        })
    }

    fn signal_frame_sync_point(&mut self, sync: &mut WgpuSyncPoint, value: u64) {
        sync.value = value;
        sync.submission = self.last_submission.clone();
    }

    fn wait_frame_sync_point(&mut self, sync: &mut WgpuSyncPoint, value: u64) -> Result<(), BackendError> {
        if value == 0 {
            return Ok(());
        }
        if sync.value < value {
            return Err(BackendError::FenceTimeout { value });
        }
        // Nothing was submitted before the signal.
        let Some(index) = sync.submission.clone() else {
            return Ok(());
        };
        self.gpu
            .device
            .poll(wgpu::PollType::Wait {
                submission_index: Some(index),
                timeout: None,
            })
            .map(|_| ())
            .map_err(|err| {
                log::error!("waiting for frame {value}: {err}");
                BackendError::FenceTimeout { value }
            })
    }

    fn destroy_frame_sync_point(&mut self, _sync: WgpuSyncPoint) {}

    fn submit_frame(&mut self, frame: &FrameSubmission<'_, Self>) -> Result<(), BackendError> {
        // An acquired but never presented texture must be released first.
        self.pending_surface = None;

        let surface_view;
        let (view, format, target_id) = match frame.target {
            FrameTarget::Surface => {
                let surface_texture = self.gpu.acquire()?;
                surface_view = surface_texture
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                self.pending_surface = Some(surface_texture);
                (&surface_view, self.gpu.surface_format(), None)
            }
            FrameTarget::Image { id, image } => (&image.view, IMAGE_FORMAT, Some(id)),
        };

        for vb in frame.vertex_buffers {
            self.gpu
                .queue
                .write_buffer(&vb.handle().buffer, 0, bytemuck::cast_slice(vb.vertices()));
        }
        self.pipeline.write_viewport(&self.gpu.queue, frame.viewport);
        self.pipeline.prepare(&self.gpu.device, format);

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("easel frame encoder"),
            });

        if let Some(atlas) = &frame.atlas {
            for (id, rect) in atlas.placements {
                let Some(source) = frame.image(*id) else {
                    log::warn!("atlas placement for unknown image {id:?} left empty");
                    continue;
                };
                encoder.copy_texture_to_texture(
                    wgpu::TexelCopyTextureInfo {
                        texture: &source.texture,
                        mip_level: 0,
                        origin: wgpu::Origin3d::ZERO,
                        aspect: wgpu::TextureAspect::All,
                    },
                    wgpu::TexelCopyTextureInfo {
                        texture: &atlas.image.texture,
                        mip_level: 0,
                        origin: wgpu::Origin3d {
                            x: rect.x,
                            y: rect.y,
                            z: 0,
                        },
                        aspect: wgpu::TextureAspect::All,
                    },
                    wgpu::Extent3d {
                        width: rect.width,
                        height: rect.height,
                        depth_or_array_layers: 1,
                    },
                );
            }
        }

        {
            let Some(pipeline) = self.pipeline.get(format) else {
                unreachable!("pipeline prepared above");
            };
            let c = frame.clear_color;
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("easel canvas pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: c.r as f64,
                            g: c.g as f64,
                            b: c.b as f64,
                            a: c.a as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, self.pipeline.frame_bind_group(), &[]);
            pass.set_index_buffer(frame.index_buffer.buffer.slice(..), wgpu::IndexFormat::Uint32);

            for batch in frame.batches {
                if let (Some(target), TextureBinding::Image(id)) = (target_id, batch.binding) {
                    if target == id {
                        log::warn!("skipping batch that samples its own render target");
                        continue;
                    }
                }
                let Some(image) = frame.batch_image(batch) else {
                    log::warn!("skipping batch with unresolvable binding {:?}", batch.binding);
                    continue;
                };
                let Some(vb) = frame.vertex_buffers.get(batch.buffer) else {
                    continue;
                };
                pass.set_vertex_buffer(0, vb.handle().buffer.slice(..));
                pass.set_bind_group(1, &image.bind_group, &[]);
                pass.draw_indexed(0..batch.index_count, batch.offset as i32, 0..1);
            }
        }

        let index = self.gpu.queue.submit(std::iter::once(encoder.finish()));
        self.last_submission = Some(index);
        Ok(())
    }

    fn present(&mut self) -> Result<(), BackendError> {
        if let Some(surface_texture) = self.pending_surface.take() {
            surface_texture.present();
        }
        Ok(())
    }
}
