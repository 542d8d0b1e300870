/// Default limit of nested resolutions within one call tree
pub const DEFAULT_MAX_BUILD_DEPTH: usize = 128;

/// Container settings
///
/// Settings are given in code, either through [crate::builder::ContainerBuilder::config]
/// or [crate::container::Container::with_config]. Layers use the settings of their parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerConfig {
    /// How deep resolutions may nest before failing with `DepthExceeded`
    ///
    /// Guards against redirect loops and unbounded recursive graphs.
    pub max_build_depth: usize,
}
impl Default for ContainerConfig {
    fn default() -> Self {
        ContainerConfig {
            max_build_depth: DEFAULT_MAX_BUILD_DEPTH,
        }
    }
}
impl ContainerConfig {
    pub fn with_max_build_depth(mut self, max_build_depth: usize) -> Self {
        self.max_build_depth = max_build_depth;
        self
    }
}
