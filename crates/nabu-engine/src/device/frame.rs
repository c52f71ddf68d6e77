/// A drawable acquired by `begin_frame`.
///
/// Holding the surface texture prevents acquisition of the next one; the frame
/// is consumed by `Gpu::present` or dropped unpresented.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
}
