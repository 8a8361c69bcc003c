// ============================================================================
// GPU SHADERS — all WGSL code kept inline for containment
// ============================================================================

/// Textured quad with a uniform transform.
///
/// The vertex shader expands `vertex_index` into the four corners of the
/// image rect (image-pixel coordinates, y-up), runs them through the
/// placement matrix (rotate → scale → translate → orthographic NDC) and
/// hands the fragment shader plain texture coordinates.  The image texture
/// is stored top-down, so `v` flips.
pub const PRESENT_SHADER: &str = r#"
struct Transform {
    matrix: mat4x4<f32>,
    image_size: vec2<f32>,
    _pad: vec2<f32>,
};

@group(0) @binding(0) var<uniform> transform: Transform;
@group(0) @binding(1) var source_tex: texture_2d<f32>;
@group(0) @binding(2) var source_samp: sampler;

struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_present(@builtin(vertex_index) idx: u32) -> VsOut {
    // triangle strip: (0,0) (w,0) (0,h) (w,h) in image space, y-up
    let corner = vec2<f32>(f32(idx & 1u), f32(idx >> 1u));
    let image_pos = corner * transform.image_size;

    var out: VsOut;
    out.pos = transform.matrix * vec4<f32>(image_pos, 0.0, 1.0);
    out.uv = vec2<f32>(corner.x, 1.0 - corner.y);
    return out;
}

@fragment
fn fs_present(in: VsOut) -> @location(0) vec4<f32> {
    return textureSample(source_tex, source_samp, in.uv);
}
"#;
