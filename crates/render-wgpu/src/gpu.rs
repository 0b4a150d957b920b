use crate::frame::SceneFrame;
use crate::shaders;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use mazewalk_common::MeshNode;
use mazewalk_kernel::World;
use mazewalk_render::{RenderLayers, ViewportRect, ViewportState, ViewportTarget, render_inset};
use wgpu::util::DeviceExt;

const WALL_COLOR: [f32; 4] = [0.55, 0.57, 0.62, 1.0];
const SCENERY_COLOR: [f32; 4] = [0.32, 0.36, 0.3, 1.0];
const CHARACTER_COLOR: [f32; 4] = [0.2, 0.6, 1.0, 1.0];
const INDICATOR_COLOR: [f32; 4] = [1.0, 0.25, 0.2, 1.0];
const GRID_COLOR: [f32; 4] = [0.35, 0.35, 0.35, 1.0];
const GRID_SPACING: f32 = 100.0;

const MAIN_AMBIENT: f32 = 0.3;
const MINIMAP_AMBIENT: f32 = 1.0;

// Fixed slots in the instance buffer.
const WALLS: u32 = 0;
const SCENERY: u32 = 1;
const CHARACTER: u32 = 2;
const INDICATOR: u32 = 3;
const INSTANCE_SLOTS: u32 = 5;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    shading: [f32; 4],
}

impl Uniforms {
    fn new(view_proj: Mat4, ambient: f32) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            shading: [ambient, 0.0, 0.0, 0.0],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Vertex {
    position: [f32; 3],
    normal: [f32; 3],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct InstanceData {
    model_0: [f32; 4],
    model_1: [f32; 4],
    model_2: [f32; 4],
    model_3: [f32; 4],
    color: [f32; 4],
}

impl InstanceData {
    fn new(model: Mat4, color: [f32; 4]) -> Self {
        let cols = model.to_cols_array_2d();
        Self {
            model_0: cols[0],
            model_1: cols[1],
            model_2: cols[2],
            model_3: cols[3],
            color,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct GridVertex {
    position: [f32; 3],
    color: [f32; 4],
}

/// World-space triangles with flat normals.
fn surface_vertices<'a>(nodes: impl Iterator<Item = &'a MeshNode>) -> Vec<Vertex> {
    let mut vertices = Vec::new();
    for node in nodes {
        for [a, b, c] in node.mesh.world_triangles() {
            let normal = (b - a).cross(c - a).normalize_or_zero().to_array();
            for p in [a, b, c] {
                vertices.push(Vertex {
                    position: p.to_array(),
                    normal,
                });
            }
        }
    }
    vertices
}

/// Unit cube centred on the origin.
fn cube_mesh() -> (Vec<Vertex>, Vec<u16>) {
    let faces: [(Vec3, Vec3, Vec3); 6] = [
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
    ];
    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, u, v) in faces {
        let base = vertices.len() as u16;
        for (su, sv) in [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)] {
            vertices.push(Vertex {
                position: (normal * 0.5 + u * su + v * sv).to_array(),
                normal: normal.to_array(),
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }
    (vertices, indices)
}

/// Grid lines on the ground plane covering the maze footprint.
fn grid_mesh(world: &World, spacing: f32) -> Vec<GridVertex> {
    let bounds = world.bounds();
    let (center, reach) = if bounds.is_empty() {
        (Vec3::ZERO, 10.0 * spacing)
    } else {
        let size = bounds.size();
        (bounds.center(), size.x.max(size.z) * 0.5 + spacing)
    };
    let lines = (reach / spacing).ceil() as i32;
    let extent = lines as f32 * spacing;
    let (cx, cz) = (
        (center.x / spacing).round() * spacing,
        (center.z / spacing).round() * spacing,
    );

    let mut verts = Vec::with_capacity((lines as usize * 2 + 1) * 4);
    for i in -lines..=lines {
        let offset = i as f32 * spacing;
        for position in [
            [cx - extent, 0.0, cz + offset],
            [cx + extent, 0.0, cz + offset],
            [cx + offset, 0.0, cz - extent],
            [cx + offset, 0.0, cz + extent],
        ] {
            verts.push(GridVertex {
                position,
                color: GRID_COLOR,
            });
        }
    }
    verts
}

struct Uniform {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// The encoder-side view of one frame, tracking viewport state between passes.
///
/// wgpu clears depth through a pass's load op, so [`ViewportTarget::clear_depth`]
/// marks the next pass to clear.
struct FrameTarget<'a> {
    encoder: &'a mut wgpu::CommandEncoder,
    color: &'a wgpu::TextureView,
    depth: &'a wgpu::TextureView,
    state: ViewportState,
    clear_depth: bool,
}

impl FrameTarget<'_> {
    fn begin_pass(&mut self, label: &str, clear_color: Option<wgpu::Color>) -> wgpu::RenderPass<'_> {
        let ViewportState {
            viewport,
            scissor,
            scissor_test,
        } = self.state;
        let depth_load = if std::mem::take(&mut self.clear_depth) {
            wgpu::LoadOp::Clear(1.0)
        } else {
            wgpu::LoadOp::Load
        };
        let mut pass = self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: self.color,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: clear_color.map_or(wgpu::LoadOp::Load, wgpu::LoadOp::Clear),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: self.depth,
                depth_ops: Some(wgpu::Operations {
                    load: depth_load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        });
        pass.set_viewport(
            viewport.x as f32,
            viewport.y as f32,
            viewport.width as f32,
            viewport.height as f32,
            0.0,
            1.0,
        );
        if scissor_test {
            pass.set_scissor_rect(scissor.x, scissor.y, scissor.width, scissor.height);
        }
        pass
    }
}

impl ViewportTarget for FrameTarget<'_> {
    fn viewport_state(&self) -> ViewportState {
        self.state
    }

    fn set_viewport_state(&mut self, state: ViewportState) {
        self.state = state;
    }

    fn clear_depth(&mut self) {
        self.clear_depth = true;
    }
}

/// wgpu renderer for the maze, the character proxy and the minimap.
pub struct WgpuRenderer {
    scene_pipeline: wgpu::RenderPipeline,
    grid_pipeline: wgpu::RenderPipeline,
    main_uniform: Uniform,
    minimap_uniform: Uniform,
    wall_vertex_buffer: wgpu::Buffer,
    wall_vertex_count: u32,
    scenery_vertex_buffer: wgpu::Buffer,
    scenery_vertex_count: u32,
    cube_vertex_buffer: wgpu::Buffer,
    cube_index_buffer: wgpu::Buffer,
    cube_index_count: u32,
    grid_vertex_buffer: wgpu::Buffer,
    grid_vertex_count: u32,
    instance_buffer: wgpu::Buffer,
    depth_texture: wgpu::TextureView,
    size: (u32, u32),
    surface_format: wgpu::TextureFormat,
}

impl WgpuRenderer {
    /// Upload the static maze and build both pipelines.
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        world: &World,
    ) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let main_uniform = Self::create_uniform(device, &bind_group_layout, "main");
        let minimap_uniform = Self::create_uniform(device, &bind_group_layout, "minimap");

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let depth_stencil = Some(wgpu::DepthStencilState {
            format: wgpu::TextureFormat::Depth32Float,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        });
        let color_targets = [Some(wgpu::ColorTargetState {
            format: surface_format,
            blend: Some(wgpu::BlendState::REPLACE),
            write_mask: wgpu::ColorWrites::ALL,
        })];

        let scene_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SCENE_SHADER.into()),
        });
        let scene_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("scene_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &scene_shader,
                entry_point: Some("vs_scene"),
                compilation_options: Default::default(),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![
                            0 => Float32x3,
                            1 => Float32x3,
                        ],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<InstanceData>() as u64,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &wgpu::vertex_attr_array![
                            2 => Float32x4,
                            3 => Float32x4,
                            4 => Float32x4,
                            5 => Float32x4,
                            6 => Float32x4,
                        ],
                    },
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &scene_shader,
                entry_point: Some("fs_scene"),
                compilation_options: Default::default(),
                targets: &color_targets,
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                // Imported maze winding is not reliable.
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: depth_stencil.clone(),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let grid_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("grid_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::GRID_SHADER.into()),
        });
        let grid_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("grid_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &grid_shader,
                entry_point: Some("vs_grid"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<GridVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32x4,
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &grid_shader,
                entry_point: Some("fs_grid"),
                compilation_options: Default::default(),
                targets: &color_targets,
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..Default::default()
            },
            depth_stencil,
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let wall_vertices = surface_vertices(world.walls().iter());
        let scenery_vertices = surface_vertices(world.scenery().iter());
        let wall_vertex_buffer = Self::vertex_buffer(device, "wall_vertex_buffer", &wall_vertices);
        let scenery_vertex_buffer =
            Self::vertex_buffer(device, "scenery_vertex_buffer", &scenery_vertices);

        let (cube_verts, cube_indices) = cube_mesh();
        let cube_vertex_buffer = Self::vertex_buffer(device, "cube_vertex_buffer", &cube_verts);
        let cube_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("cube_index_buffer"),
            contents: bytemuck::cast_slice(&cube_indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let grid_verts = grid_mesh(world, GRID_SPACING);
        let grid_vertex_buffer = Self::vertex_buffer(device, "grid_vertex_buffer", &grid_verts);

        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("instance_buffer"),
            size: INSTANCE_SLOTS as u64 * std::mem::size_of::<InstanceData>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        tracing::info!(
            wall_triangles = wall_vertices.len() / 3,
            scenery_triangles = scenery_vertices.len() / 3,
            "maze uploaded to GPU"
        );

        Self {
            scene_pipeline,
            grid_pipeline,
            main_uniform,
            minimap_uniform,
            wall_vertex_buffer,
            wall_vertex_count: wall_vertices.len() as u32,
            scenery_vertex_buffer,
            scenery_vertex_count: scenery_vertices.len() as u32,
            cube_vertex_buffer,
            cube_index_buffer,
            cube_index_count: cube_indices.len() as u32,
            grid_vertex_buffer,
            grid_vertex_count: grid_verts.len() as u32,
            instance_buffer,
            depth_texture: Self::create_depth_texture(device, width, height),
            size: (width, height),
            surface_format,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
        self.size = (width, height);
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    /// Record the main view, then the minimap inset over it.
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        frame: &SceneFrame,
    ) {
        queue.write_buffer(
            &self.main_uniform.buffer,
            0,
            bytemuck::bytes_of(&Uniforms::new(frame.main_view_proj, MAIN_AMBIENT)),
        );

        let mut instances = [InstanceData::new(Mat4::IDENTITY, [0.0; 4]); INSTANCE_SLOTS as usize];
        instances[WALLS as usize] = InstanceData::new(Mat4::IDENTITY, WALL_COLOR);
        instances[SCENERY as usize] = InstanceData::new(Mat4::IDENTITY, SCENERY_COLOR);
        instances[CHARACTER as usize] = InstanceData::new(frame.character_model, CHARACTER_COLOR);
        if let Some(minimap) = &frame.minimap {
            queue.write_buffer(
                &self.minimap_uniform.buffer,
                0,
                bytemuck::bytes_of(&Uniforms::new(minimap.view_proj, MINIMAP_AMBIENT)),
            );
            // A flat disc of the indicator radius plus a nose block showing the heading.
            let marker = minimap.indicator.model_matrix();
            instances[INDICATOR as usize] = InstanceData::new(
                marker * Mat4::from_scale(Vec3::new(2.0, 0.1, 2.0)),
                INDICATOR_COLOR,
            );
            instances[INDICATOR as usize + 1] = InstanceData::new(
                marker
                    * Mat4::from_translation(Vec3::new(0.0, 0.0, 1.2))
                    * Mat4::from_scale(Vec3::new(0.6, 0.1, 0.8)),
                INDICATOR_COLOR,
            );
        }
        queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });
        let (width, height) = self.size;
        let full = ViewportRect::full(width, height);
        let mut target = FrameTarget {
            encoder: &mut encoder,
            color: view,
            depth: &self.depth_texture,
            state: ViewportState {
                viewport: full,
                scissor: full,
                scissor_test: false,
            },
            clear_depth: true,
        };

        {
            let mut pass = target.begin_pass(
                "main_pass",
                Some(wgpu::Color {
                    r: 0.53,
                    g: 0.72,
                    b: 0.9,
                    a: 1.0,
                }),
            );
            self.draw_scene(&mut pass, &self.main_uniform, RenderLayers::main_camera());
        }

        if let Some(minimap) = &frame.minimap {
            render_inset(&mut target, minimap.rect, |target| {
                let mut pass = target.begin_pass("minimap_pass", None);
                self.draw_scene(&mut pass, &self.minimap_uniform, RenderLayers::minimap_camera());
            });
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn draw_scene(&self, pass: &mut wgpu::RenderPass<'_>, uniform: &Uniform, layers: RenderLayers) {
        pass.set_bind_group(0, &uniform.bind_group, &[]);

        if layers.intersects(RenderLayers::SCENE) {
            pass.set_pipeline(&self.grid_pipeline);
            pass.set_vertex_buffer(0, self.grid_vertex_buffer.slice(..));
            pass.draw(0..self.grid_vertex_count, 0..1);

            pass.set_pipeline(&self.scene_pipeline);
            pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            if self.scenery_vertex_count > 0 {
                pass.set_vertex_buffer(0, self.scenery_vertex_buffer.slice(..));
                pass.draw(0..self.scenery_vertex_count, SCENERY..SCENERY + 1);
            }
            if self.wall_vertex_count > 0 {
                pass.set_vertex_buffer(0, self.wall_vertex_buffer.slice(..));
                pass.draw(0..self.wall_vertex_count, WALLS..WALLS + 1);
            }
        }

        pass.set_pipeline(&self.scene_pipeline);
        pass.set_vertex_buffer(0, self.cube_vertex_buffer.slice(..));
        pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
        pass.set_index_buffer(self.cube_index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        if layers.intersects(RenderLayers::SCENE) {
            pass.draw_indexed(0..self.cube_index_count, 0, CHARACTER..CHARACTER + 1);
        }
        if layers.intersects(RenderLayers::MINIMAP_ONLY) {
            pass.draw_indexed(0..self.cube_index_count, 0, INDICATOR..INSTANCE_SLOTS);
        }
    }

    fn create_uniform(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, name: &str) -> Uniform {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{name}_uniform_buffer")),
            contents: bytemuck::bytes_of(&Uniforms::new(Mat4::IDENTITY, MAIN_AMBIENT)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{name}_bind_group")),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Uniform { buffer, bind_group }
    }

    fn vertex_buffer<T: Pod>(device: &wgpu::Device, label: &str, data: &[T]) -> wgpu::Buffer {
        // Zero-sized vertex buffers are rejected; keep one element of padding.
        let contents: &[u8] = if data.is_empty() {
            &[0; 64]
        } else {
            bytemuck::cast_slice(data)
        };
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents,
            usage: wgpu::BufferUsages::VERTEX,
        })
    }

    fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mazewalk_common::TriangleMesh;

    #[test]
    fn cube_faces_point_outward() {
        let (vertices, indices) = cube_mesh();
        assert_eq!(vertices.len(), 24);
        assert_eq!(indices.len(), 36);
        for tri in indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from(vertices[i as usize].position));
            let n = Vec3::from(vertices[tri[0] as usize].normal);
            assert!((b - a).cross(c - a).dot(n) > 0.0);
            assert!((a.dot(n) - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn surface_vertices_are_flat_shaded() {
        let node = MeshNode::new("wall", TriangleMesh::cuboid(Vec3::ZERO, Vec3::ONE));
        let vertices = surface_vertices(std::iter::once(&node));
        assert_eq!(vertices.len(), 36);
        for v in &vertices {
            assert!((Vec3::from(v.normal).length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn grid_covers_maze_footprint() {
        let world = World::from_parts(
            vec![MeshNode::new(
                "wall",
                TriangleMesh::cuboid(Vec3::new(1000.0, 0.0, 0.0), Vec3::new(450.0, 10.0, 100.0)),
            )],
            Vec::new(),
        );
        let verts = grid_mesh(&world, 100.0);
        let max_x = verts.iter().map(|v| v.position[0]).fold(f32::MIN, f32::max);
        let min_x = verts.iter().map(|v| v.position[0]).fold(f32::MAX, f32::min);
        assert!(max_x >= 1450.0);
        assert!(min_x <= 550.0);
        assert!(verts.iter().all(|v| v.position[1] == 0.0));
    }

    #[test]
    fn uniforms_are_tightly_packed() {
        assert_eq!(std::mem::size_of::<Uniforms>(), 80);
        assert_eq!(std::mem::size_of::<InstanceData>(), 80);
    }
}
