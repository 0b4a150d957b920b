/// Bitmask of the layers an object is on, or a camera can see.
///
/// An object is drawn by a camera when the two masks share a bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RenderLayers(u32);

impl RenderLayers {
    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(u32::MAX);
    /// Maze, floor and character.
    pub const SCENE: Self = Self::layer(0);
    /// Minimap-only markers.
    pub const MINIMAP_ONLY: Self = Self::layer(1);

    /// Mask with only layer `n` set. Layers past 31 map to an empty mask.
    pub const fn layer(n: u32) -> Self {
        if n < 32 { Self(1 << n) } else { Self(0) }
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// What the third-person camera draws.
    pub const fn main_camera() -> Self {
        Self::SCENE
    }

    /// What the top-down camera draws.
    pub const fn minimap_camera() -> Self {
        Self::SCENE.with(Self::MINIMAP_ONLY)
    }
}
