pub const DEFAULT_WIDTH: u32 = 1024;
pub const DEFAULT_HEIGHT: u32 = 1024;
pub const DEFAULT_SPHERE_COUNT: usize = 10;

/// Backend the frame is rendered on. The program surface has no flags or
/// environment variables, so the strategy is picked here, when the binary
/// is composed. All strategies produce the same image bytes.
pub const RENDER_MODE: RenderMode = RenderMode::Sequential;

#[derive(Clone, Copy, Debug)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub sphere_count: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            sphere_count: DEFAULT_SPHERE_COUNT,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderMode {
    Sequential,
    Threads,
    Gpu,
}

impl RenderMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Threads => "threads",
            Self::Gpu => "gpu",
        }
    }
}

/// Screen-coordinate mapping divides by `width - 1` and `height - 1`, and
/// sphere placement divides by `sphere_count - 1`, so anything below 2 would
/// render NaN pixels. Rejected up front instead.
pub fn validate_config(config: &RenderConfig) -> Result<(), String> {
    if config.width < 2 || config.height < 2 {
        return Err(format!(
            "width and height must be at least 2 to map pixels onto [-1, 1], got {}x{}",
            config.width, config.height
        ));
    }
    if config.sphere_count < 2 {
        return Err(format!(
            "sphere count must be at least 2 to space the stack, got {}",
            config.sphere_count
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_the_default_configuration() {
        assert!(validate_config(&RenderConfig::default()).is_ok());
    }

    #[test]
    fn accepts_the_smallest_legal_configuration() {
        let config = RenderConfig {
            width: 2,
            height: 2,
            sphere_count: 2,
        };
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn rejects_degenerate_resolution() {
        let config = RenderConfig {
            width: 1,
            height: 1024,
            sphere_count: 10,
        };
        let error = validate_config(&config).expect_err("1-pixel-wide frame must fail");
        assert!(error.contains("at least 2"));

        let config = RenderConfig {
            width: 1024,
            height: 0,
            sphere_count: 10,
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_single_sphere_scene() {
        let config = RenderConfig {
            width: 64,
            height: 64,
            sphere_count: 1,
        };
        let error = validate_config(&config).expect_err("single-sphere stack must fail");
        assert!(error.contains("sphere count"));
    }

    #[test]
    fn mode_names_match_log_output() {
        assert_eq!(RenderMode::Sequential.as_str(), "sequential");
        assert_eq!(RenderMode::Threads.as_str(), "threads");
        assert_eq!(RenderMode::Gpu.as_str(), "gpu");
    }
}
