use thiserror::Error;

#[derive(Error, Debug)]
pub enum CyclingError {
    #[error("Waveform pattern must hold exactly 4 finite values, got {len}")]
    InvalidPattern { len: usize },

    #[error("Negative or non-finite flux {value} at t={time}")]
    InvalidWaveform { time: f64, value: f64 },

    #[error("Temperature {temperature} K is outside the kinetics domain")]
    InvalidTemperature { temperature: f64 },

    #[error("Step size {value} fell below the minimum {dt_min}")]
    StepSizeUnderflow { value: f64, dt_min: f64 },

    #[error("Solver rejected {attempts} consecutive attempts at t={time}")]
    SolverStalled { time: f64, attempts: usize },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type CyclingResult<T> = Result<T, CyclingError>;
