/// Configuration consumed by `VulkanDevice::new`

/// Validation message verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DebugSeverity {
    /// Only errors
    ErrorsOnly,
    /// Errors and warnings
    #[default]
    ErrorsAndWarnings,
    /// Everything the layers report, including info and verbose
    All,
}

/// Vulkan device configuration
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Enable VK_LAYER_KHRONOS_validation and the debug messenger
    pub enable_validation: bool,
    /// Application name reported to the driver
    pub app_name: String,
    /// Application version (major, minor, patch)
    pub app_version: (u32, u32, u32),
    /// Which validation messages reach the engine logger
    pub debug_severity: DebugSeverity,
    /// Sets per descriptor pool; a new pool of the same size is added when one runs out
    pub descriptor_pool_size: u32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            enable_validation: cfg!(debug_assertions),
            app_name: "X2 Application".to_string(),
            app_version: (1, 0, 0),
            debug_severity: DebugSeverity::default(),
            descriptor_pool_size: 1024,
        }
    }
}

impl RendererConfig {
    /// Whether validation layers are requested, either by this config or
    /// by the `vulkan-validation` cargo feature
    pub fn validation_enabled(&self) -> bool {
        self.enable_validation || cfg!(feature = "vulkan-validation")
    }
}

/// Validation message counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidationStats {
    pub errors: u32,
    pub warnings: u32,
    pub info: u32,
    pub verbose: u32,
}

impl ValidationStats {
    pub fn total(&self) -> u32 {
        self.errors + self.warnings + self.info + self.verbose
    }
}
