use crate::gpu::GpuContext;

/// The WGSL source of the lit entity shader.
pub const LIT_SHADER: &str = include_str!("shaders/lit.wgsl");

#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    #[error("shader '{label}' failed to compile: {message}")]
    Compilation { label: String, message: String },
}

/// Compiles WGSL source into a shader module.
///
/// Validation errors are captured with an error scope and returned instead of
/// reaching the device's uncaptured-error handler.
pub fn compile_shader(
    gpu: &GpuContext,
    label: &str,
    source: &str,
) -> Result<wgpu::ShaderModule, ShaderError> {
    gpu.device.push_error_scope(wgpu::ErrorFilter::Validation);

    let module = gpu
        .device
        .create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

    match pollster::block_on(gpu.device.pop_error_scope()) {
        None => Ok(module),
        Some(err) => Err(ShaderError::Compilation {
            label: label.to_string(),
            message: err.to_string(),
        }),
    }
}
