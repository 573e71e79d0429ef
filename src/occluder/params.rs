use crate::mesh::SourceMesh;

/// Which parts of each occluder box the generator emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoxTypeFlags(u32);

impl BoxTypeFlags {
    pub const NONE: Self = Self(0);
    pub const DIAGONALS: Self = Self(1 << 0);
    pub const TOP: Self = Self(1 << 1);
    pub const BOTTOM: Self = Self(1 << 2);
    pub const SIDES: Self = Self(1 << 3);
    pub const REGULAR: Self = Self(1 << 4);

    /// Builds the flag set from the five panel checkboxes. `regular` replaces
    /// whatever else was selected instead of adding to it.
    pub fn from_selection(
        diagonals: bool,
        top: bool,
        bottom: bool,
        sides: bool,
        regular: bool,
    ) -> Self {
        if regular {
            return Self::REGULAR;
        }

        let mut flags = Self::NONE;
        if diagonals {
            flags = flags | Self::DIAGONALS;
        }
        if top {
            flags = flags | Self::TOP;
        }
        if bottom {
            flags = flags | Self::BOTTOM;
        }
        if sides {
            flags = flags | Self::SIDES;
        }
        flags
    }

    pub fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for BoxTypeFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

/// Extra visualisation layers in the debug mesh. Display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DebugFlags(u32);

impl DebugFlags {
    pub const NONE: Self = Self(0);
    pub const SHOW_RESULT: Self = Self(1 << 0);
    pub const SHOW_INNER: Self = Self(1 << 1);
    pub const SHOW_SURFACE: Self = Self(1 << 2);

    pub fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    pub fn set(&mut self, other: Self, enabled: bool) {
        if enabled {
            self.0 |= other.0;
        } else {
            self.0 &= !other.0;
        }
    }
}

impl std::ops::BitOr for DebugFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugSettings {
    pub flags: DebugFlags,
    /// Size of a debug voxel cube relative to the voxel size.
    pub voxel_scale: f32,
}

impl Default for DebugSettings {
    fn default() -> Self {
        Self {
            flags: DebugFlags::SHOW_RESULT,
            voxel_scale: 0.8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationConfig {
    pub voxel_size: f32,
    pub fill_percentage: f32,
    pub box_types: BoxTypeFlags,
    pub debug: DebugSettings,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            voxel_size: 0.25,
            fill_percentage: 1.0,
            box_types: BoxTypeFlags::REGULAR,
            debug: DebugSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterLimits {
    pub voxel_size_min: f32,
    pub voxel_size_max: f32,
}

impl Default for ParameterLimits {
    fn default() -> Self {
        Self {
            voxel_size_min: 0.05,
            voxel_size_max: 1.0,
        }
    }
}

/// A single edit coming from the parameter panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Parameter {
    VoxelSize(f32),
    FillPercentage(f32),
    BoxTypes(BoxTypeFlags),
    DebugFlags(DebugFlags),
}

impl GenerationConfig {
    /// Applies one edit. Out-of-range values are clamped and NaN is ignored.
    pub fn apply(&mut self, parameter: Parameter, limits: &ParameterLimits) {
        match parameter {
            Parameter::VoxelSize(v) if !v.is_nan() => {
                self.voxel_size = v.clamp(limits.voxel_size_min, limits.voxel_size_max);
            }
            Parameter::FillPercentage(v) if !v.is_nan() => {
                self.fill_percentage = v.clamp(0.0, 1.0);
            }
            Parameter::BoxTypes(flags) => self.box_types = flags,
            Parameter::DebugFlags(flags) => self.debug.flags = flags,
            _ => {}
        }
    }
}

/// Everything one generator call reads.
#[derive(Debug, Clone, Default)]
pub struct GenerationParams {
    pub mesh: SourceMesh,
    pub config: GenerationConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regular_overrides_other_box_types() {
        let flags = BoxTypeFlags::from_selection(true, true, true, true, true);
        assert_eq!(flags, BoxTypeFlags::REGULAR);
        assert!(!flags.contains(BoxTypeFlags::TOP));
    }

    #[test]
    fn selection_unions_without_regular() {
        let flags = BoxTypeFlags::from_selection(false, true, true, false, false);
        assert!(flags.contains(BoxTypeFlags::TOP));
        assert!(flags.contains(BoxTypeFlags::BOTTOM));
        assert!(!flags.contains(BoxTypeFlags::SIDES));
        assert!(BoxTypeFlags::from_selection(false, false, false, false, false).is_empty());
    }

    #[test]
    fn voxel_size_is_clamped_to_limits() {
        let limits = ParameterLimits::default();
        let mut config = GenerationConfig::default();

        config.apply(Parameter::VoxelSize(10.0), &limits);
        assert_eq!(config.voxel_size, limits.voxel_size_max);

        config.apply(Parameter::VoxelSize(-1.0), &limits);
        assert_eq!(config.voxel_size, limits.voxel_size_min);

        config.apply(Parameter::VoxelSize(f32::NAN), &limits);
        assert_eq!(config.voxel_size, limits.voxel_size_min);
    }

    #[test]
    fn fill_percentage_is_clamped_to_unit_range() {
        let limits = ParameterLimits::default();
        let mut config = GenerationConfig::default();

        config.apply(Parameter::FillPercentage(1.5), &limits);
        assert_eq!(config.fill_percentage, 1.0);
        config.apply(Parameter::FillPercentage(-0.5), &limits);
        assert_eq!(config.fill_percentage, 0.0);
    }

    #[test]
    fn debug_flags_toggle_independently() {
        let mut flags = DebugFlags::SHOW_RESULT;
        flags.set(DebugFlags::SHOW_INNER, true);
        assert!(flags.contains(DebugFlags::SHOW_RESULT | DebugFlags::SHOW_INNER));
        flags.set(DebugFlags::SHOW_RESULT, false);
        assert!(!flags.contains(DebugFlags::SHOW_RESULT));
        assert!(flags.contains(DebugFlags::SHOW_INNER));
    }
}
