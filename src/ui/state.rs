use crate::occluder::{BoxTypeFlags, DebugFlags, GenerationConfig};

/// Widget values. The controller stays the source of truth; these are
/// re-synced after every model switch.
pub struct UiState {
    pub selected_model: usize,

    pub voxel_size: f32,
    pub fill_percentage: f32,

    pub diagonals: bool,
    pub top: bool,
    pub bottom: bool,
    pub sides: bool,
    pub regular: bool,

    pub show_result: bool,
    pub show_inner: bool,
    pub show_surface: bool,

    pub depth_test: bool,
    pub show_stats: bool,

    pub last_error: Option<String>,
}

impl UiState {
    pub fn new(selected_model: usize, config: &GenerationConfig, depth_test: bool) -> Self {
        let mut state = Self {
            selected_model,
            voxel_size: 0.0,
            fill_percentage: 0.0,
            diagonals: false,
            top: false,
            bottom: false,
            sides: false,
            regular: false,
            show_result: false,
            show_inner: false,
            show_surface: false,
            depth_test,
            show_stats: true,
            last_error: None,
        };
        state.sync(config);
        state
    }

    pub fn sync(&mut self, config: &GenerationConfig) {
        self.voxel_size = config.voxel_size;
        self.fill_percentage = config.fill_percentage;

        let types = config.box_types;
        self.diagonals = types.contains(BoxTypeFlags::DIAGONALS);
        self.top = types.contains(BoxTypeFlags::TOP);
        self.bottom = types.contains(BoxTypeFlags::BOTTOM);
        self.sides = types.contains(BoxTypeFlags::SIDES);
        self.regular = types.contains(BoxTypeFlags::REGULAR);

        let flags = config.debug.flags;
        self.show_result = flags.contains(DebugFlags::SHOW_RESULT);
        self.show_inner = flags.contains(DebugFlags::SHOW_INNER);
        self.show_surface = flags.contains(DebugFlags::SHOW_SURFACE);
    }

    pub fn box_types(&self) -> BoxTypeFlags {
        BoxTypeFlags::from_selection(
            self.diagonals,
            self.top,
            self.bottom,
            self.sides,
            self.regular,
        )
    }

    pub fn debug_flags(&self) -> DebugFlags {
        let mut flags = DebugFlags::NONE;
        flags.set(DebugFlags::SHOW_RESULT, self.show_result);
        flags.set(DebugFlags::SHOW_INNER, self.show_inner);
        flags.set(DebugFlags::SHOW_SURFACE, self.show_surface);
        flags
    }
}
