use thiserror::Error;

/// Failures that stop the program before the simulation loop starts
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("No drawable surface: canvas is {width}x{height} cells")]
    SurfaceUnavailable { width: u16, height: u16 },
    #[error("Terminal error: {0}")]
    Terminal(#[from] std::io::Error),
    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}
