use crate::AssetError;
use glam::{Affine3A, Mat4, Vec3};
use gltf::buffer::Data;
use mazewalk_animation::Clip;
use mazewalk_common::{MeshNode, TriangleMesh};
use std::path::Path;

/// Import a glTF/GLB scene as world-space mesh nodes.
///
/// The node hierarchy is flattened: every node carrying triangles becomes one
/// [`MeshNode`] whose transform is the product of its ancestors'.
pub fn load_scene(path: &Path) -> Result<Vec<MeshNode>, AssetError> {
    let (document, buffers, _images) = gltf::import(path).map_err(|source| AssetError::Gltf {
        path: path.to_path_buf(),
        source,
    })?;

    let mut nodes = Vec::new();
    match document.default_scene().or_else(|| document.scenes().next()) {
        Some(scene) => {
            for node in scene.nodes() {
                collect_node(&node, Mat4::IDENTITY, &buffers, &mut nodes);
            }
        }
        None => tracing::warn!("{} has no scene", path.display()),
    }
    tracing::debug!(nodes = nodes.len(), "imported {}", path.display());
    Ok(nodes)
}

/// Import the first animation of a file as a clip called `name`.
///
/// The clip lasts until its latest keyframe across all channels.
pub fn load_clip(name: &str, path: &Path) -> Result<Clip, AssetError> {
    let (document, buffers, _images) = gltf::import(path).map_err(|source| AssetError::Gltf {
        path: path.to_path_buf(),
        source,
    })?;
    let animation = document
        .animations()
        .next()
        .ok_or_else(|| AssetError::NoAnimation {
            path: path.to_path_buf(),
        })?;

    let duration = animation
        .channels()
        .filter_map(|channel| {
            let reader = channel.reader(|buffer| buffer_slice(&buffers, buffer.index()));
            reader
                .read_inputs()
                .map(|inputs| inputs.fold(0.0_f32, f32::max))
        })
        .fold(0.0_f32, f32::max);
    Ok(Clip::new(name, duration))
}

fn buffer_slice(buffers: &[Data], index: usize) -> Option<&[u8]> {
    buffers.get(index).map(|data| data.0.as_slice())
}

fn collect_node(node: &gltf::Node<'_>, parent: Mat4, buffers: &[Data], out: &mut Vec<MeshNode>) {
    let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());
    if let Some(mesh) = node.mesh() {
        let triangles = mesh_triangles(&mesh, buffers);
        if !triangles.is_empty() {
            let name = node
                .name()
                .or_else(|| mesh.name())
                .map(str::to_string)
                .unwrap_or_else(|| format!("node_{}", node.index()));
            out.push(MeshNode::new(
                name,
                TriangleMesh::new(triangles, Affine3A::from_mat4(world)),
            ));
        }
    }
    for child in node.children() {
        collect_node(&child, world, buffers, out);
    }
}

fn mesh_triangles(mesh: &gltf::Mesh<'_>, buffers: &[Data]) -> Vec<[Vec3; 3]> {
    let mut triangles = Vec::new();
    for primitive in mesh.primitives() {
        if !matches!(primitive.mode(), gltf::mesh::Mode::Triangles) {
            continue;
        }
        let reader = primitive.reader(|buffer| buffer_slice(buffers, buffer.index()));
        let Some(positions) = reader.read_positions() else {
            continue;
        };
        let positions: Vec<Vec3> = positions.map(Vec3::from_array).collect();
        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..positions.len() as u32).collect(),
        };
        for corners in indices.chunks_exact(3) {
            let vertex = |i: u32| positions.get(i as usize).copied();
            if let (Some(a), Some(b), Some(c)) =
                (vertex(corners[0]), vertex(corners[1]), vertex(corners[2]))
            {
                triangles.push([a, b, c]);
            }
        }
    }
    triangles
}
